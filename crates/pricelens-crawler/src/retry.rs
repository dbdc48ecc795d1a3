//! Bounded retry with a linear back-off schedule for crawler network calls.
//!
//! [`retry_with_backoff`] wraps a fallible async operation and retries on
//! transient errors only. Parse failures, bad product URLs, and 4xx
//! responses are returned immediately — retrying cannot fix them.

use std::future::Future;
use std::time::Duration;

use crate::error::CrawlerError;

/// Returns `true` for errors that are worth retrying after a delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 5xx and 429 responses.
///
/// **Not retriable (hard stop):**
/// - Other non-2xx statuses (4xx — the request itself is wrong).
/// - [`CrawlerError::Deserialize`] — malformed response; retrying won't fix it.
/// - [`CrawlerError::InvalidProductUrl`] / [`CrawlerError::UnsupportedPlatform`]
///   / [`CrawlerError::NoKnownPlatforms`] — caller-input problems.
pub(crate) fn is_retriable(err: &CrawlerError) -> bool {
    match err {
        CrawlerError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        CrawlerError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
        CrawlerError::Deserialize { .. }
        | CrawlerError::InvalidProductUrl { .. }
        | CrawlerError::UnsupportedPlatform { .. }
        | CrawlerError::NoKnownPlatforms { .. } => false,
    }
}

/// Runs `operation` up to `max_attempts` times, sleeping `base_delay_ms × n`
/// before the n-th retry (linear schedule: 2 s, 4 s, … with the 2 s default).
///
/// The last error is surfaced when every attempt fails. Non-retriable errors
/// are returned immediately. `max_attempts` is clamped to at least 1.
///
/// # Errors
///
/// Returns the operation's final error once attempts are exhausted, or its
/// first non-retriable error.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay_ms: u64,
    mut operation: F,
) -> Result<T, CrawlerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CrawlerError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let delay_ms = base_delay_ms.saturating_mul(u64::from(attempt));
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "transient crawler error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> CrawlerError {
        let source = serde_json::from_str::<()>("not json").unwrap_err();
        CrawlerError::Deserialize {
            context: "test".to_owned(),
            source,
        }
    }

    #[test]
    fn server_errors_are_retriable() {
        assert!(is_retriable(&CrawlerError::UnexpectedStatus {
            status: 503,
            url: "https://shopee.tw".to_owned()
        }));
        assert!(is_retriable(&CrawlerError::UnexpectedStatus {
            status: 429,
            url: "https://shopee.tw".to_owned()
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&CrawlerError::UnexpectedStatus {
            status: 404,
            url: "https://shopee.tw".to_owned()
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn invalid_product_url_is_not_retriable() {
        assert!(!is_retriable(&CrawlerError::InvalidProductUrl {
            url: "https://shopee.tw/garbage".to_owned(),
            reason: "no item ids".to_owned(),
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CrawlerError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(CrawlerError::UnexpectedStatus {
                        status: 500,
                        url: "https://shopee.tw".to_owned(),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_last_error_after_attempts_exhausted() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<u32, _> = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(CrawlerError::UnexpectedStatus {
                    status: 502,
                    url: "https://shopee.tw".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "3 attempts total");
        assert!(matches!(
            result,
            Err(CrawlerError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_errors() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<u32, _> = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(deserialize_err())
            }
        })
        .await;
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "deserialize errors must not be retried"
        );
        assert!(matches!(result, Err(CrawlerError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn zero_max_attempts_still_runs_once() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(0, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, CrawlerError>(1)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
