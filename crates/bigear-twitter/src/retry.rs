//! Retry with exponential back-off and jitter for the Twitter client.
//!
//! Only network failures and 5xx responses are retried. A 429 is returned
//! immediately: the v1.1 rate-limit window is fifteen minutes, far longer
//! than any back-off schedule here, so the caller decides when to come back.

use std::future::Future;

use bigear_core::retry::BackoffPolicy;

use crate::error::TwitterError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &TwitterError) -> bool {
    match err {
        TwitterError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        TwitterError::UnexpectedStatus { status, .. } => *status >= 500,
        TwitterError::RateLimited { .. }
        | TwitterError::Unauthorized { .. }
        | TwitterError::Deserialize { .. }
        | TwitterError::InvalidRequest(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off doubles from `backoff_base_ms` with ±25 % jitter, capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    operation: F,
) -> Result<T, TwitterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TwitterError>>,
{
    let policy = BackoffPolicy {
        max_retries,
        base_ms: backoff_base_ms,
        max_delay_ms: MAX_DELAY_MS,
    };
    bigear_core::retry::retry_with_backoff(policy, "twitter", is_retriable, operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> TwitterError {
        TwitterError::UnexpectedStatus {
            status: 503,
            url: "https://api.twitter.com/1.1/search/tweets.json".to_owned(),
        }
    }

    #[test]
    fn rate_limited_is_not_retriable() {
        assert!(!is_retriable(&TwitterError::RateLimited {
            retry_after_secs: 900
        }));
    }

    #[test]
    fn unauthorized_is_not_retriable() {
        assert!(!is_retriable(&TwitterError::Unauthorized { status: 401 }));
    }

    #[test]
    fn server_errors_are_retriable_client_errors_are_not() {
        assert!(is_retriable(&server_error()));
        assert!(!is_retriable(&TwitterError::UnexpectedStatus {
            status: 404,
            url: "x".to_owned()
        }));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(server_error())
                } else {
                    Ok::<u32, TwitterError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(server_error())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(TwitterError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_rate_limit() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(TwitterError::RateLimited {
                    retry_after_secs: 900,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(TwitterError::RateLimited { .. })));
    }
}
