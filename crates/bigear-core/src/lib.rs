//! Shared domain types and configuration for the bigear ingestion workspace.

mod app_config;
mod config;
mod expression;
mod post;
pub mod retry;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use expression::NewExpression;
pub use post::{Attachment, CandidatePost, PostEntities, TimelinePost};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
