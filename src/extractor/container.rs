use tracing::debug;

use crate::extractor::dom::{Document, ElementData, ElementKind, NodeId};

/// Class names that mark a `div` as an article body.
const BODY_CLASSES: &[&str] = &[
    "entry-content",
    "post-content",
    "article__content",
    "article-body",
    "article-content",
];

/// Ids that mark a `div` as an article body.
const BODY_IDS: &[&str] = &["entry-content", "post-content", "article-body", "article-content"];

/// Class combinations used by specific sites for their article wrapper.
const SITE_CLASS_SETS: &[&[&str]] = &[&["chakra-stack", "css-ar-svx65p"]];

type Predicate = fn(&ElementData) -> bool;

/// Structural candidate tests, in priority order.
const CANDIDATE_PREDICATES: &[Predicate] = &[is_article, is_body_div, is_site_body_div, is_main_role_div];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeId,
    pub text_len: usize,
    pub main_hint: bool,
}

fn is_article(element: &ElementData) -> bool {
    element.tag() == "article"
}

fn is_body_div(element: &ElementData) -> bool {
    element.tag() == "div"
        && (BODY_CLASSES.iter().any(|class| element.has_class(class))
            || element.attr("id").is_some_and(|id| BODY_IDS.contains(&id)))
}

fn is_site_body_div(element: &ElementData) -> bool {
    element.tag() == "div"
        && SITE_CLASS_SETS
            .iter()
            .any(|set| set.iter().all(|class| element.has_class(class)))
}

fn is_main_role_div(element: &ElementData) -> bool {
    element.tag() == "div" && has_main_role(element)
}

fn has_main_role(element: &ElementData) -> bool {
    element.attr("role") == Some("main")
}

/// Picks the subtree most likely to hold the article body.
///
/// A candidate carrying a "main" hint always wins over one without, no
/// matter how much text either holds. Among unhinted candidates the longest
/// text wins and ties go to the earlier one.
pub fn select_main(document: &Document) -> Option<NodeId> {
    let candidates = collect_candidates(document);
    if candidates.is_empty() {
        debug!("no container candidates found");
        return None;
    }

    let mut best: Option<Candidate> = None;
    for candidate in candidates
        .into_iter()
        .map(|node| score_candidate(document, node))
    {
        if candidate.main_hint {
            debug!(node = ?candidate.node, "main hint selects candidate");
            return Some(candidate.node);
        }
        if best.is_none_or(|current| candidate.text_len > current.text_len) {
            best = Some(candidate);
        }
    }

    debug!(node = ?best.map(|c| c.node), "longest candidate selected");
    best.map(|candidate| candidate.node)
}

/// Candidates in document order. Falls back to the most paragraph-heavy `div`
/// when no structural predicate matches anything.
pub fn collect_candidates(document: &Document) -> Vec<NodeId> {
    let structural = document.select_all(Document::ROOT, |element| {
        CANDIDATE_PREDICATES
            .iter()
            .any(|predicate| predicate(element))
    });
    if !structural.is_empty() {
        return structural;
    }

    paragraph_richest_div(document).into_iter().collect()
}

fn paragraph_richest_div(document: &Document) -> Option<NodeId> {
    let mut best: Option<(NodeId, usize)> = None;
    for div in document.select_all(Document::ROOT, |element| element.tag() == "div") {
        let paragraphs = document
            .select_all(div, |element| element.kind() == ElementKind::Paragraph)
            .len();
        if paragraphs > 0 && best.is_none_or(|(_, count)| paragraphs > count) {
            best = Some((div, paragraphs));
        }
    }
    best.map(|(div, _)| div)
}

pub fn score_candidate(document: &Document, node: NodeId) -> Candidate {
    Candidate {
        node,
        text_len: document.text_of(node).chars().count(),
        main_hint: has_main_hint(document, node),
    }
}

fn has_main_hint(document: &Document, node: NodeId) -> bool {
    let Some(element) = document.element(node) else {
        return false;
    };
    let mentions_main =
        |name: &str| element.attr(name).is_some_and(|value| value.to_lowercase().contains("main"));

    mentions_main("id")
        || mentions_main("class")
        || has_main_role(element)
        || document.has_ancestor_matching(node, has_main_role)
}
