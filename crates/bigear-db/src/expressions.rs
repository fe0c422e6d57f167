//! Database operations for the `expressions` table.
//!
//! The pipeline only ever calls [`expression_exists`] and
//! [`create_expression`]. Listing, clean-text updates and soft deletes back the
//! maintenance commands.

use bigear_core::NewExpression;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const EXPRESSION_COLUMNS: &str = "id, public_id, post_id, owner, full_text, clean_text, \
     is_verified, has_attachment, attachment_labels, media_url, followers, following, \
     post_count, last_ten_interaction, total_interaction, created_at, updated_at, deleted_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `expressions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExpressionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub post_id: i64,
    pub owner: String,
    pub full_text: String,
    pub clean_text: String,
    pub is_verified: bool,
    pub has_attachment: bool,
    pub attachment_labels: Option<String>,
    pub media_url: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub post_count: i64,
    pub last_ten_interaction: Option<i64>,
    pub total_interaction: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Result of a create call.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Box<ExpressionRow>),
    /// A live row with the same `post_id` already exists. Concurrent passes
    /// racing on one post land here; it is not an error.
    AlreadyIngested,
}

/// Pagination and filtering for [`list_expressions`].
#[derive(Debug, Clone)]
pub struct ExpressionListParams {
    /// Zero-based page index.
    pub page: i64,
    pub limit: i64,
    /// Column name, optionally prefixed with `-` for descending order.
    pub sort_by: String,
    /// Case-insensitive substring match on `owner`.
    pub owner: Option<String>,
}

impl Default for ExpressionListParams {
    fn default() -> Self {
        Self {
            page: 0,
            limit: 50,
            sort_by: "created_at".to_string(),
            owner: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns `true` when a live (not soft-deleted) row exists for `post_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn expression_exists(pool: &PgPool, post_id: i64) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM expressions WHERE post_id = $1 AND deleted_at IS NULL)",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Inserts a fully assembled expression.
///
/// Conflicts on the live `post_id` index insert nothing and return
/// [`CreateOutcome::AlreadyIngested`]. A unique violation raised by the
/// database is mapped the same way.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] for any other database failure.
pub async fn create_expression(
    pool: &PgPool,
    expression: &NewExpression,
) -> Result<CreateOutcome, DbError> {
    let public_id = Uuid::new_v4();
    let sql = format!(
        "INSERT INTO expressions \
             (public_id, post_id, owner, full_text, clean_text, is_verified, has_attachment, \
              attachment_labels, media_url, followers, following, post_count, \
              last_ten_interaction, total_interaction) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         ON CONFLICT (post_id) WHERE deleted_at IS NULL DO NOTHING \
         RETURNING {EXPRESSION_COLUMNS}"
    );

    let result = sqlx::query_as::<_, ExpressionRow>(&sql)
        .bind(public_id)
        .bind(expression.post_id)
        .bind(&expression.owner)
        .bind(&expression.full_text)
        .bind(&expression.clean_text)
        .bind(expression.is_verified)
        .bind(expression.has_attachment)
        .bind(expression.attachment_labels.as_deref())
        .bind(expression.media_url.as_deref())
        .bind(expression.followers)
        .bind(expression.following)
        .bind(expression.post_count)
        .bind(expression.last_ten_interaction)
        .bind(expression.total_interaction)
        .fetch_optional(pool)
        .await;

    match result {
        Ok(Some(row)) => Ok(CreateOutcome::Created(Box::new(row))),
        Ok(None) => Ok(CreateOutcome::AlreadyIngested),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Ok(CreateOutcome::AlreadyIngested)
        }
        Err(e) => Err(e.into()),
    }
}

/// Lists live expressions, paginated and optionally filtered by owner.
///
/// # Errors
///
/// Returns [`DbError::InvalidSortKey`] for a sort column outside the allowed
/// set, or [`DbError::Sqlx`] if the query fails.
pub async fn list_expressions(
    pool: &PgPool,
    params: &ExpressionListParams,
) -> Result<Vec<ExpressionRow>, DbError> {
    let order_by = order_clause(&params.sort_by)?;
    let limit = params.limit.max(1);
    let offset = params.page.max(0).saturating_mul(limit);

    let rows = match params.owner.as_deref() {
        Some(owner) => {
            let sql = format!(
                "SELECT {EXPRESSION_COLUMNS} FROM expressions \
                 WHERE deleted_at IS NULL AND strpos(lower(owner), lower($1)) > 0 \
                 ORDER BY {order_by}, id \
                 LIMIT $2 OFFSET $3"
            );
            sqlx::query_as::<_, ExpressionRow>(&sql)
                .bind(owner)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {EXPRESSION_COLUMNS} FROM expressions \
                 WHERE deleted_at IS NULL \
                 ORDER BY {order_by}, id \
                 LIMIT $1 OFFSET $2"
            );
            sqlx::query_as::<_, ExpressionRow>(&sql)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

/// Replaces the clean text of a live expression and bumps `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no live row has `public_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_clean_text(
    pool: &PgPool,
    public_id: Uuid,
    clean_text: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE expressions \
         SET clean_text = $1, updated_at = NOW() \
         WHERE public_id = $2 AND deleted_at IS NULL",
    )
    .bind(clean_text)
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Soft-deletes a live expression. Its `post_id` becomes free for re-ingestion.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no live row has `public_id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn soft_delete_expression(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE expressions \
         SET deleted_at = NOW(), updated_at = NOW() \
         WHERE public_id = $1 AND deleted_at IS NULL",
    )
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Maps a user-supplied sort key to a safe `ORDER BY` fragment.
fn order_clause(sort_by: &str) -> Result<&'static str, DbError> {
    let (column, descending) = match sort_by.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (sort_by, false),
    };

    let clause = match (column, descending) {
        ("created_at", false) => "created_at ASC",
        ("created_at", true) => "created_at DESC",
        ("updated_at", false) => "updated_at ASC",
        ("updated_at", true) => "updated_at DESC",
        ("total_interaction", false) => "total_interaction ASC",
        ("total_interaction", true) => "total_interaction DESC",
        ("last_ten_interaction", false) => "last_ten_interaction ASC NULLS LAST",
        ("last_ten_interaction", true) => "last_ten_interaction DESC NULLS LAST",
        ("followers", false) => "followers ASC",
        ("followers", true) => "followers DESC",
        ("owner", false) => "owner ASC",
        ("owner", true) => "owner DESC",
        _ => return Err(DbError::InvalidSortKey(sort_by.to_string())),
    };

    Ok(clause)
}
