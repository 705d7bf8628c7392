use std::fs;
use url::Url;

use crate::extractor::{Extraction, MarkdownOptions, extract, process, process_bytes};
use crate::fetcher::types::PageResponse;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_article() {
    let response = create_test_response(fixture("article.html"), "https://example.com/article");
    let result = extract(&response, &MarkdownOptions::default());

    let expected = "# Sample Article\n\n\
        This is the **first paragraph** of the article, with a related link.\n\n\
        This is the *second paragraph*.\n\n\
        ## Details\n\n\
        > A quoted remark.\n\n\
        A quoted remark.\n\n\
        | Metric | Value |\n| Speed | 42 |\n\n\
        1. First step\n2. Second step\n\n\
        1. First step\n\n\
        2. Second step\n\n";
    assert_eq!(result, Extraction::Rendered(expected.to_string()));
}

#[test]
fn test_article_boilerplate_is_gone() {
    let result = process(&fixture("article.html"), &MarkdownOptions::keep_all());
    let markdown = result.markdown().expect("article should render");

    assert!(markdown.contains("[related link](/related)"));
    assert!(!markdown.contains("Share on social media"));
    assert!(!markdown.contains("Great post"));
    assert!(!markdown.contains("Popular stories"));
    assert!(!markdown.contains("Science"));
    assert!(!markdown.contains("trackView"));
    assert!(!markdown.contains("Copyright"));
}

#[test]
fn test_main_hint_beats_longer_entry_content() {
    let result = process(&fixture("blog.html"), &MarkdownOptions::default());
    assert_eq!(
        result,
        Extraction::Rendered("## Key Principles\n\nKeep functions small.\n\n".to_string())
    );
}

#[test]
fn test_page_without_candidates() {
    let result = process(&fixture("empty.html"), &MarkdownOptions::default());
    assert_eq!(result, Extraction::NoMainContent);
}

#[test]
fn test_container_with_only_boilerplate() {
    let result = process(&fixture("boilerplate_only.html"), &MarkdownOptions::default());
    assert_eq!(result, Extraction::NoRenderableContent);
}

#[test]
fn test_minimal_article() {
    let result = process(
        "<article><h1>Title</h1><p>Hello <strong>world</strong></p></article>",
        &MarkdownOptions::default(),
    );
    let markdown = result.markdown().unwrap();
    assert_eq!(markdown.trim(), "# Title\n\nHello **world**");
}

#[test]
fn test_image_only_paragraph_policies() {
    let html = r#"<article><p><img src="x.png" alt="pic"></p></article>"#;

    let stripped = process(html, &MarkdownOptions::default());
    assert_eq!(stripped, Extraction::NoRenderableContent);

    let kept = process(html, &MarkdownOptions::keep_all());
    assert_eq!(kept, Extraction::Rendered("![pic](x.png)\n\n".to_string()));
}

#[test]
fn test_paragraph_div_fallback() {
    let html = r#"
        <div class="header"><span>Site</span></div>
        <div class="body"><p>One.</p><p>Two.</p></div>
    "#;
    let result = process(html, &MarkdownOptions::default());
    assert_eq!(result, Extraction::Rendered("One.\n\nTwo.\n\n".to_string()));
}

#[test]
fn test_malformed_html() {
    let html = "<html><head><title>Broken</title><body><article><p>Unclosed tags<div>More content";
    let result = process(html, &MarkdownOptions::default());
    assert_eq!(result, Extraction::Rendered("Unclosed tags\n\n".to_string()));
}

#[test]
fn test_process_bytes_rejects_malformed_sequences() {
    let result = process_bytes(&[0x3c, 0x70, 0x3e, 0xc3, 0x28], &MarkdownOptions::default());
    assert!(result.is_err());

    let result = process_bytes(b"<article><p>ok</p></article>", &MarkdownOptions::default());
    assert_eq!(result.unwrap(), Extraction::Rendered("ok\n\n".to_string()));
}

#[test]
fn test_deeply_nested_page_renders() {
    let depth = 50_000;
    let html = format!(
        "<article><p>{}x{}</p></article>",
        "<span>".repeat(depth),
        "</span>".repeat(depth)
    );
    let result = process(&html, &MarkdownOptions::default());
    assert_eq!(result, Extraction::Rendered("x\n\n".to_string()));
}

#[test]
fn test_large_page_renders_every_paragraph() {
    let paragraphs = 20_000;
    let body: String = (0..paragraphs).map(|i| format!("<p>line {i}</p>")).collect();
    let html = format!("<article>{body}</article>");

    let result = process(&html, &MarkdownOptions::default());
    let markdown = result.markdown().expect("large page should render");
    assert_eq!(markdown.matches("\n\n").count(), paragraphs);
    assert!(markdown.ends_with("line 19999\n\n"));
}

#[test]
fn test_empty_paragraph_between_blocks() {
    let result = process(
        "<article><h1>a</h1><p></p><p>b</p></article>",
        &MarkdownOptions::default(),
    );
    assert_eq!(result, Extraction::Rendered("# a\n\n\n\nb\n\n".to_string()));
}

fn create_test_response(html: String, url: &str) -> PageResponse {
    PageResponse {
        url_final: Url::parse(url).unwrap(),
        body_utf8: html,
    }
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use crate::extractor::container::select_main;
    use crate::extractor::dom::Document;
    use crate::extractor::filter::prune;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_process_never_panics(html in ".*") {
            let _ = process(&html, &MarkdownOptions::default());
        }

        #[test]
        fn test_rendered_output_is_never_blank(
            body in "(<(p|h1|li|div|article)>[a-z ]{0,12}){0,12}",
        ) {
            let html = format!("<article>{body}</article>");
            if let Extraction::Rendered(markdown) = process(&html, &MarkdownOptions::default()) {
                prop_assert!(!markdown.trim().is_empty());
            }
        }

        #[test]
        fn test_prune_is_idempotent(
            body in "(<(p|div|span) class=\"(nav|story|ad|text)\">[a-z ]{0,8}){0,10}",
        ) {
            let mut document = Document::load(&format!("<article>{body}</article>"));
            if let Some(container) = select_main(&document) {
                prune(&mut document, container);
                let once = document.descendants(container);
                prune(&mut document, container);
                prop_assert_eq!(document.descendants(container), once);
            }
        }
    }
}
