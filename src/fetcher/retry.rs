use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::fetcher::{client::PageSource, errors::FetchError, types::PageResponse};

/// Cap on the backoff exponent so the multiplication cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Error, Debug)]
#[error("fetch failed after {attempts} attempt(s): {source}")]
pub struct RetryError {
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

/// Calculate exponential backoff delay with jitter
pub fn calculate_backoff_delay(attempt: u32, base_delay: Duration) -> Duration {
    let capped_attempt = attempt.min(MAX_BACKOFF_EXPONENT);
    let base_delay = base_delay.saturating_mul(2_u32.saturating_pow(capped_attempt));

    // Add jitter: ±30% randomness
    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    base_delay.mul_f64(jitter_factor)
}

/// Fetches `url`, retrying transient failures with exponential backoff.
/// Permanent failures (bad URL, 4xx, wrong content type) return at once.
pub async fn fetch_with_retry<S>(
    source: &S,
    url: &str,
    policy: &RetryPolicy,
) -> Result<PageResponse, RetryError>
where
    S: PageSource + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match source.fetch(url).await {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };

        warn!(attempt, max_attempts, %error, "fetch attempt failed");
        if !error.should_retry() || attempt >= max_attempts {
            return Err(RetryError {
                attempts: attempt,
                source: error,
            });
        }

        tokio::time::sleep(calculate_backoff_delay(attempt, policy.base_delay)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::client::MockPageSource;
    use reqwest::StatusCode;
    use url::Url;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn page(body: &str) -> PageResponse {
        PageResponse {
            url_final: Url::parse("https://example.com/").unwrap(),
            body_utf8: body.to_string(),
        }
    }

    #[test]
    fn test_backoff_progression() {
        let base = Duration::from_millis(1000);

        let delay1 = calculate_backoff_delay(1, base);
        let delay2 = calculate_backoff_delay(2, base);

        assert!(delay1 >= Duration::from_millis(1400) && delay1 <= Duration::from_millis(2600));
        assert!(delay2 >= Duration::from_millis(2800) && delay2 <= Duration::from_millis(5200));
    }

    #[test]
    fn test_backoff_cap() {
        let base = Duration::from_secs(1);
        let delay_high = calculate_backoff_delay(40, base);
        assert!(delay_high <= Duration::from_secs(1024).mul_f64(1.3));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let mut source = MockPageSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(FetchError::RequestTimeout));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(page("<p>ok</p>")));

        let response = fetch_with_retry(&source, "https://example.com/", &instant_policy(3))
            .await
            .unwrap();
        assert_eq!(response.body_utf8, "<p>ok</p>");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .times(3)
            .returning(|_| Err(FetchError::http(StatusCode::BAD_GATEWAY)));

        let error = fetch_with_retry(&source, "https://example.com/", &instant_policy(3))
            .await
            .unwrap_err();
        assert_eq!(error.attempts, 3);
        assert_eq!(error.source.status(), Some(StatusCode::BAD_GATEWAY));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchError::http(StatusCode::NOT_FOUND)));

        let error = fetch_with_retry(&source, "https://example.com/", &instant_policy(3))
            .await
            .unwrap_err();
        assert_eq!(error.attempts, 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchError::ConnectTimeout));

        let error = fetch_with_retry(&source, "https://example.com/", &instant_policy(0))
            .await
            .unwrap_err();
        assert_eq!(error.attempts, 1);
    }
}
