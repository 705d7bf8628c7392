use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Terminal outcome of running one page through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Rendered(String),
    NoMainContent,
    NoRenderableContent,
}

impl Extraction {
    pub fn markdown(&self) -> Option<&str> {
        match self {
            Self::Rendered(markdown) => Some(markdown),
            Self::NoMainContent | Self::NoRenderableContent => None,
        }
    }
}

/// Lossy-rendering policy shared by the boilerplate filter and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownOptions {
    /// Remove `img` elements instead of emitting `![alt](src)`.
    pub strip_images: bool,
    /// Drop anchor targets and keep only the anchor text.
    pub strip_links: bool,
    /// Render tables as pipe rows. When off, only the paragraphs inside
    /// tables are rendered.
    pub tables: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            strip_images: true,
            strip_links: true,
            tables: true,
        }
    }
}

impl MarkdownOptions {
    /// Keeps images and links, for callers that want the full rendering.
    pub fn keep_all() -> Self {
        Self {
            strip_images: false,
            strip_links: false,
            tables: true,
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    let text = text.trim();

    // Replace multiple spaces/tabs with single space
    let spaced = SPACE_REGEX.replace_all(text, " ");

    // Convert multiple consecutive newlines to double newlines
    NEWLINE_REGEX.replace_all(&spaced, "\n\n").to_string()
}
