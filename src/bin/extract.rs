//! Converts one page to Markdown on stdout.
//!
//! `extract <url>` fetches the page; `extract < page.html` reads raw HTML
//! from stdin. Exits 2 when no main container is found, 3 when the container
//! has nothing renderable and 1 on any other failure.

use anyhow::{Context, Result};
use readmark::{
    config::Config,
    extractor::{self, Extraction, MarkdownOptions},
    fetcher::{HttpPageSource, fetch_with_retry},
};
use std::io::{Read, Write};
use std::process::ExitCode;
use tracing::error;

const EXIT_FAILURE: u8 = 1;
const EXIT_NO_MAIN_CONTENT: u8 = 2;
const EXIT_NO_RENDERABLE_CONTENT: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    readmark::init_tracing();

    match run().await {
        Ok(outcome) => report(outcome),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run() -> Result<Extraction> {
    let config = Config::from_env()?;
    match std::env::args().nth(1) {
        Some(url) => {
            let page = fetch_with_retry(&HttpPageSource, &url, config.retry()).await?;
            Ok(extractor::extract(&page, config.markdown()))
        }
        None => {
            let mut html = Vec::new();
            std::io::stdin()
                .read_to_end(&mut html)
                .context("reading HTML from stdin")?;
            convert_bytes(&html, config.markdown())
        }
    }
}

fn convert_bytes(html: &[u8], options: &MarkdownOptions) -> Result<Extraction> {
    extractor::process_bytes(html, options).context("stdin is not valid UTF-8 HTML")
}

fn report(outcome: Extraction) -> ExitCode {
    let code = exit_code(&outcome);
    match outcome {
        Extraction::Rendered(markdown) => {
            if let Err(err) = std::io::stdout().write_all(markdown.as_bytes()) {
                error!(%err, "writing markdown to stdout");
                return ExitCode::from(EXIT_FAILURE);
            }
        }
        Extraction::NoMainContent => eprintln!("No main content found."),
        Extraction::NoRenderableContent => eprintln!("Main content had nothing to render."),
    }
    ExitCode::from(code)
}

fn exit_code(outcome: &Extraction) -> u8 {
    match outcome {
        Extraction::Rendered(_) => 0,
        Extraction::NoMainContent => EXIT_NO_MAIN_CONTENT,
        Extraction::NoRenderableContent => EXIT_NO_RENDERABLE_CONTENT,
    }
}
