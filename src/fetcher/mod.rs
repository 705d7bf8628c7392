pub mod client;
pub mod errors;
pub mod pipeline;
pub mod retry;
pub mod types;

pub use client::{HttpPageSource, PageSource, fetch};
pub use errors::FetchError;
pub use retry::{RetryError, RetryPolicy, fetch_with_retry};
pub use types::{Charset, PageResponse};
