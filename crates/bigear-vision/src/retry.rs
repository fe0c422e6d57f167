use std::future::Future;

use bigear_core::retry::BackoffPolicy;

use crate::error::VisionError;

const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &VisionError) -> bool {
    match err {
        VisionError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        VisionError::ImageStatus { status } | VisionError::UnexpectedStatus { status } => {
            *status >= 500
        }
        VisionError::Service { kind, .. } => kind.is_transient(),
        VisionError::ImageOversize { .. }
        | VisionError::EmptyImage
        | VisionError::Deserialize { .. }
        | VisionError::InvalidEndpoint(_) => false,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
///
/// Back-off doubles from `backoff_base_ms` with ±25 % jitter, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    operation: F,
) -> Result<T, VisionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, VisionError>>,
{
    let policy = BackoffPolicy {
        max_retries,
        base_ms: backoff_base_ms,
        max_delay_ms: MAX_DELAY_MS,
    };
    bigear_core::retry::retry_with_backoff(policy, "vision", is_retriable, operation).await
}
