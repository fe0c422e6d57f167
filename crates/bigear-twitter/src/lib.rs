//! Search and author-timeline client for the Twitter v1.1 REST API.
//!
//! Candidates come back as [`bigear_core::CandidatePost`]; retweets and
//! replies are dropped even when the upstream query filter lets them through.

pub mod client;
pub mod error;
pub mod types;

mod retry;

pub use client::{SearchRequest, TwitterClient, MAX_PAGE_SIZE};
pub use error::TwitterError;
pub use types::ResultOrdering;
