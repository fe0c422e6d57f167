//! Storage seam used by the pipeline.

use async_trait::async_trait;
use bigear_core::NewExpression;
use bigear_db::{CreateOutcome, DbError};
use sqlx::PgPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// A live record with the same post id already exists.
    AlreadyIngested,
}

#[async_trait]
pub trait ExpressionStore: Send + Sync {
    /// Whether a live record exists for `post_id`.
    async fn exists(&self, post_id: i64) -> Result<bool, DbError>;

    /// Inserts a fully assembled record. Uniqueness conflicts are reported as
    /// [`StoreOutcome::AlreadyIngested`], not as errors.
    async fn create(&self, expression: &NewExpression) -> Result<StoreOutcome, DbError>;
}

#[async_trait]
impl ExpressionStore for PgPool {
    async fn exists(&self, post_id: i64) -> Result<bool, DbError> {
        bigear_db::expression_exists(self, post_id).await
    }

    async fn create(&self, expression: &NewExpression) -> Result<StoreOutcome, DbError> {
        match bigear_db::create_expression(self, expression).await? {
            CreateOutcome::Created(_) => Ok(StoreOutcome::Inserted),
            CreateOutcome::AlreadyIngested => Ok(StoreOutcome::AlreadyIngested),
        }
    }
}
