//! Exponential back-off with jitter for the outbound HTTP clients.
//!
//! Each client decides which of its errors are transient; this module only
//! owns the schedule.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry schedule: up to `max_retries` extra attempts, waiting
/// `base_ms × 2^(n-1)` ± 25 % jitter before retry `n`, capped at `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub base_ms: u64,
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    /// Un-jittered delay before retry `attempt` (1-based).
    #[must_use]
    pub fn ceiling_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(10);
        self.base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms)
    }

    fn jittered(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling_ms(attempt);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (ceiling as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(delay_ms)
    }
}

/// Runs `operation`, retrying errors for which `is_retriable` holds.
///
/// # Errors
///
/// Returns the first non-retriable error, or the last error once
/// `policy.max_retries` retries are spent.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: BackoffPolicy,
    service: &'static str,
    is_retriable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.jittered(attempt);
                tracing::warn!(
                    service,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
