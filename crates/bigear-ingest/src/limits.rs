//! Per-service concurrency and request-rate limits.
//!
//! Search, timeline, image host and label service have independent quotas,
//! so each gets its own [`ServiceLimiter`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use tokio::sync::Semaphore;

use crate::error::IngestError;

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Caps in-flight calls to one service and paces how often they start.
pub struct ServiceLimiter {
    name: &'static str,
    permits: Semaphore,
    spacing: Duration,
    rate: Option<DirectRateLimiter>,
}

impl ServiceLimiter {
    /// `spacing` is the minimum gap between call starts; zero disables pacing.
    #[must_use]
    pub fn new(name: &'static str, max_concurrent: usize, spacing: Duration) -> Self {
        Self {
            name,
            permits: Semaphore::new(max_concurrent.max(1)),
            spacing,
            rate: Quota::with_period(spacing).map(RateLimiter::direct),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs `operation` once a permit is free and the rate limiter allows it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::LimiterClosed`] if the semaphore was closed.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, IngestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| IngestError::LimiterClosed { service: self.name })?;

        if let Some(rate) = &self.rate {
            rate.until_ready().await;
        }

        Ok(operation().await)
    }
}

impl fmt::Debug for ServiceLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceLimiter")
            .field("name", &self.name)
            .field("available_permits", &self.permits.available_permits())
            .field("spacing", &self.spacing)
            .finish_non_exhaustive()
    }
}

/// One limiter per external service.
#[derive(Debug)]
pub struct Limiters {
    pub search: ServiceLimiter,
    pub timeline: ServiceLimiter,
    pub image: ServiceLimiter,
    pub label: ServiceLimiter,
}

impl Limiters {
    #[must_use]
    pub fn from_app_config(config: &bigear_core::AppConfig) -> Self {
        let spacing = Duration::from_millis(config.request_spacing_ms);
        Self {
            search: ServiceLimiter::new("search", 1, spacing),
            timeline: ServiceLimiter::new("timeline", config.timeline_concurrency, spacing),
            image: ServiceLimiter::new("image", config.image_concurrency, Duration::ZERO),
            label: ServiceLimiter::new("label", config.label_concurrency, spacing),
        }
    }

    /// No spacing, generous concurrency. For tests and local runs.
    #[must_use]
    pub fn unthrottled(max_concurrent: usize) -> Self {
        Self {
            search: ServiceLimiter::new("search", max_concurrent, Duration::ZERO),
            timeline: ServiceLimiter::new("timeline", max_concurrent, Duration::ZERO),
            image: ServiceLimiter::new("image", max_concurrent, Duration::ZERO),
            label: ServiceLimiter::new("label", max_concurrent, Duration::ZERO),
        }
    }
}
