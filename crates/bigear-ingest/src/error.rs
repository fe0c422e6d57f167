use bigear_twitter::TwitterError;
use thiserror::Error;

/// Errors that abort a whole pass. Per-candidate failures are reported in
/// the pass summary instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("search request failed: {0}")]
    Search(#[from] TwitterError),

    #[error("pass cancelled before the search completed")]
    Cancelled,

    #[error("{service} limiter is closed")]
    LimiterClosed { service: &'static str },
}
