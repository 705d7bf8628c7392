use std::sync::Arc;

use crate::config::Config;
use crate::extractor::MarkdownOptions;
use crate::fetcher::{HttpPageSource, PageSource, RetryPolicy};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn PageSource>,
    pub retry: RetryPolicy,
    pub markdown: MarkdownOptions,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_source(Arc::new(HttpPageSource), *config.retry(), *config.markdown())
    }

    pub fn with_source(
        source: Arc<dyn PageSource>,
        retry: RetryPolicy,
        markdown: MarkdownOptions,
    ) -> Self {
        Self {
            source,
            retry,
            markdown,
        }
    }
}
