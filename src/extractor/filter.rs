use tracing::debug;

use crate::extractor::dom::{Document, ElementData, ElementKind, NodeId};

/// Class substrings that mark boilerplate. Matched case-insensitively
/// against the whole class attribute, so `ad` also catches `advert`.
const CLASS_DENYLIST: &[&str] = &[
    "related",
    "sidebar",
    "ad",
    "menu",
    "social",
    "tag",
    "author",
    "share",
    "nav",
    "comment",
    // site-specific noise
    "newsletter",
    "subscribe",
    "outbrain",
    "taboola",
    "popup",
];

/// Promotional, breadcrumb and ad-container class names removed on sight.
const PROMO_CLASSES: &[&str] = &[
    "breadcrumb",
    "breadcrumbs",
    "promo",
    "promo-box",
    "sponsored",
    "advertisement",
    "ad-container",
    "ad-slot",
    "dfp-ad",
];

fn is_boilerplate(element: &ElementData) -> bool {
    matches!(element.kind(), ElementKind::Script | ElementKind::Style)
        || PROMO_CLASSES.iter().any(|class| element.has_class(class))
        || CLASS_DENYLIST
            .iter()
            .any(|token| element.class_contains(token))
}

/// Removes boilerplate below `container`, leaving the container itself.
/// Running it again on the same container changes nothing.
pub fn prune(document: &mut Document, container: NodeId) -> usize {
    let doomed: Vec<NodeId> = document
        .select_all(container, is_boilerplate)
        .into_iter()
        .filter(|&node| node != container)
        .collect();

    for &node in &doomed {
        document.remove(node);
    }

    debug!(removed = doomed.len(), "pruned boilerplate");
    doomed.len()
}

/// Drops every image element below `container`.
pub fn strip_images(document: &mut Document, container: NodeId) -> usize {
    let images = document.select_all(container, |element| element.kind() == ElementKind::Image);
    for &image in &images {
        document.remove(image);
    }
    images.len()
}

/// Removes `href` from every anchor below `container`; anchor text stays.
pub fn strip_link_targets(document: &mut Document, container: NodeId) -> usize {
    let anchors = document.select_all(container, |element| element.kind() == ElementKind::Link);
    anchors
        .into_iter()
        .filter(|&anchor| document.remove_attribute(anchor, "href").is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with_article(html: &str) -> (Document, NodeId) {
        let document = Document::load(html);
        let article = document.select_all(Document::ROOT, |e| e.tag() == "article")[0];
        (document, article)
    }

    #[test]
    fn test_prune_removes_denylisted_classes() {
        let (mut document, article) = load_with_article(
            r#"<article>
                <p>Body text.</p>
                <div class="Related-Posts"><p>related</p></div>
                <ul class="site-nav"><li>home</li></ul>
                <div class="comments"><p>first!</p></div>
                <div class="share-buttons">share</div>
                <div class="post-author">by someone</div>
            </article>"#,
        );

        prune(&mut document, article);
        assert_eq!(document.text_of(article), "Body text.");
    }

    #[test]
    fn test_prune_removes_script_style_and_promos() {
        let (mut document, article) = load_with_article(
            r#"<article>
                <script>var x = 1;</script>
                <style>p { color: red }</style>
                <p class="breadcrumb">Home / News</p>
                <p class="promo">Buy now</p>
                <p>Story.</p>
            </article>"#,
        );

        let removed = prune(&mut document, article);
        assert_eq!(removed, 4);
        assert_eq!(document.text_of(article), "Story.");
    }

    #[test]
    fn test_prune_keeps_container_even_when_it_matches() {
        let (mut document, article) =
            load_with_article(r#"<article class="sidebar-free"><p>kept</p></article>"#);
        prune(&mut document, article);
        assert_eq!(document.text_of(article), "kept");
    }

    #[test]
    fn test_prune_is_idempotent() {
        let (mut document, article) = load_with_article(
            r#"<article><p>a</p><div class="sidebar"><p>b</p></div><p>c</p></article>"#,
        );

        prune(&mut document, article);
        let once = document.descendants(article);
        assert_eq!(prune(&mut document, article), 0);
        assert_eq!(document.descendants(article), once);
    }

    #[test]
    fn test_strip_images() {
        let (mut document, article) =
            load_with_article(r#"<article><p>x<img src="a.png"><img src="b.png"></p></article>"#);
        assert_eq!(strip_images(&mut document, article), 2);
        assert!(document.select_all(article, |e| e.tag() == "img").is_empty());
    }

    #[test]
    fn test_strip_link_targets_keeps_text() {
        let (mut document, article) =
            load_with_article(r#"<article><p><a href="http://x">click</a><a>bare</a></p></article>"#);
        assert_eq!(strip_link_targets(&mut document, article), 1);

        let anchors = document.select_all(article, |e| e.tag() == "a");
        assert_eq!(anchors.len(), 2);
        assert_eq!(document.get_attribute(anchors[0], "href"), None);
        assert_eq!(document.text_of(article), "clickbare");
    }
}
