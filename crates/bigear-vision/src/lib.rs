//! Image download and label detection for post attachments.
//!
//! The label service speaks the DetectLabels JSON shape: the image goes up as
//! base64 bytes and labels come back with a confidence score.

pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use client::LabelClient;
pub use error::{ServiceErrorKind, VisionError};
pub use types::{Label, LabelOutcome};
