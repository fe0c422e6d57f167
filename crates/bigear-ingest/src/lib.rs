//! Ingestion pipeline: search → dedup → normalize → score → enrich → persist.
//!
//! External services sit behind the [`ExpressionStore`], [`PostSource`] and
//! [`ImageLabeler`] traits so a pass can run against in-memory fakes.

pub mod attachment;
pub mod engagement;
pub mod error;
pub mod limits;
pub mod normalize;
pub mod pipeline;
pub mod services;
pub mod store;

pub use engagement::TrailingEngagement;
pub use error::IngestError;
pub use limits::{Limiters, ServiceLimiter};
pub use normalize::{normalize, Normalizer, NormalizerConfig, Pass};
pub use pipeline::{
    assemble, triage, CandidateOutcome, CandidateReport, FilterReason, PassSummary, Pipeline,
    PipelineConfig, Triage,
};
pub use services::{ImageLabeler, PostSource};
pub use store::{ExpressionStore, StoreOutcome};
