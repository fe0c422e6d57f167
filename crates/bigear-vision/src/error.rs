use std::fmt;

use thiserror::Error;

/// Error codes reported by the label service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorKind {
    InvalidImageFormat,
    ImageTooLarge,
    InvalidParameter,
    AccessDenied,
    Throttling,
    /// Account quota exhausted.
    ProvisionedThroughputExceeded,
    InternalServerError,
    Other(String),
}

impl ServiceErrorKind {
    /// Maps a service error code to a kind.
    ///
    /// Accepts the bare code (`ThrottlingException`), the namespaced
    /// `__type` form (`com.amazonaws.rekognition#ThrottlingException`) and
    /// codes with or without the `Exception` suffix.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let bare = code.rsplit('#').next().unwrap_or(code).trim();
        let bare = bare.strip_suffix("Exception").unwrap_or(bare);
        match bare {
            "InvalidImageFormat" => Self::InvalidImageFormat,
            "ImageTooLarge" => Self::ImageTooLarge,
            "InvalidParameter" => Self::InvalidParameter,
            "AccessDenied" => Self::AccessDenied,
            "Throttling" => Self::Throttling,
            "ProvisionedThroughputExceeded" => Self::ProvisionedThroughputExceeded,
            "InternalServerError" | "InternalServer" => Self::InternalServerError,
            _ => Self::Other(code.to_owned()),
        }
    }

    /// Throttling and internal errors clear up on their own.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttling | Self::InternalServerError)
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidImageFormat => f.write_str("invalid image format"),
            Self::ImageTooLarge => f.write_str("image too large"),
            Self::InvalidParameter => f.write_str("invalid parameter"),
            Self::AccessDenied => f.write_str("access denied"),
            Self::Throttling => f.write_str("throttled"),
            Self::ProvisionedThroughputExceeded => f.write_str("provisioned throughput exceeded"),
            Self::InternalServerError => f.write_str("internal server error"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Errors returned while downloading or labelling an image.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The image host answered with a non-2xx status.
    #[error("image download failed with status {status}")]
    ImageStatus { status: u16 },

    #[error("image is {size} bytes, above the {limit} byte limit")]
    ImageOversize { size: usize, limit: usize },

    #[error("image download returned an empty body")]
    EmptyImage,

    /// A typed error from the label service.
    #[error("label service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    /// Non-2xx from the label service without a recognisable error body.
    #[error("unexpected HTTP status {status} from label service")]
    UnexpectedStatus { status: u16 },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid label endpoint: {0}")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_code_accepts_every_wire_form() {
        assert_eq!(
            ServiceErrorKind::from_code("ThrottlingException"),
            ServiceErrorKind::Throttling
        );
        assert_eq!(
            ServiceErrorKind::from_code("com.amazonaws.rekognition#ImageTooLargeException"),
            ServiceErrorKind::ImageTooLarge
        );
        assert_eq!(
            ServiceErrorKind::from_code("ProvisionedThroughputExceeded"),
            ServiceErrorKind::ProvisionedThroughputExceeded
        );
        assert_eq!(
            ServiceErrorKind::from_code("InternalServerError"),
            ServiceErrorKind::InternalServerError
        );
    }

    #[test]
    fn unknown_codes_are_kept_verbatim() {
        assert_eq!(
            ServiceErrorKind::from_code("SomethingNewException"),
            ServiceErrorKind::Other("SomethingNewException".to_owned())
        );
    }

    #[test]
    fn only_throttling_and_internal_are_transient() {
        assert!(ServiceErrorKind::Throttling.is_transient());
        assert!(ServiceErrorKind::InternalServerError.is_transient());
        assert!(!ServiceErrorKind::ProvisionedThroughputExceeded.is_transient());
        assert!(!ServiceErrorKind::AccessDenied.is_transient());
        assert!(!ServiceErrorKind::InvalidImageFormat.is_transient());
    }
}
