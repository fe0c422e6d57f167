use thiserror::Error;

/// Errors returned by the Twitter API client.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429. The rate-limit window has to elapse before retrying.
    #[error("rate limited by Twitter API (window resets in {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// HTTP 401/403: the bearer token is missing, invalid or lacks access.
    #[error("Twitter API rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request was rejected locally before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
