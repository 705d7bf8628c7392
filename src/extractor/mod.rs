pub mod container;
pub mod dom;
pub mod errors;
pub mod filter;
pub mod markdown;
pub mod model;

#[cfg(test)]
mod tests;

pub use dom::Document;
pub use errors::ExtractError;
pub use model::{Extraction, MarkdownOptions};

use tracing::{debug, instrument};

use crate::fetcher::types::PageResponse;

/// Runs a fetched page through the pipeline.
#[instrument(skip_all, fields(url = %resp.url_final))]
pub fn extract(resp: &PageResponse, options: &MarkdownOptions) -> Extraction {
    process(&resp.body_utf8, options)
}

/// Raw bytes in, outcome out. Fails only when the bytes are not valid UTF-8.
pub fn process_bytes(html: &[u8], options: &MarkdownOptions) -> Result<Extraction, ExtractError> {
    let document = Document::from_bytes(html)?;
    Ok(run(document, options))
}

pub fn process(html: &str, options: &MarkdownOptions) -> Extraction {
    run(Document::load(html), options)
}

fn run(mut document: Document, options: &MarkdownOptions) -> Extraction {
    // 1. Pick the article container
    let Some(container) = container::select_main(&document) else {
        return Extraction::NoMainContent;
    };

    // 2. Drop boilerplate, then apply the lossy policies
    filter::prune(&mut document, container);
    if options.strip_images {
        filter::strip_images(&mut document, container);
    }
    if options.strip_links {
        filter::strip_link_targets(&mut document, container);
    }

    // 3. Render the surviving blocks
    let markdown = markdown::render(&document, container, options);
    if markdown.trim().is_empty() {
        debug!("container produced no renderable blocks");
        return Extraction::NoRenderableContent;
    }

    debug!(bytes = markdown.len(), "rendered markdown");
    Extraction::Rendered(markdown)
}
