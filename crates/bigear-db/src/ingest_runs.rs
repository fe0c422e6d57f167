//! Database operations for `ingest_runs`.
//!
//! Each pipeline pass moves one row through `queued → running →
//! succeeded | failed`. Transitions are guarded on the expected prior status.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const INGEST_RUN_COLUMNS: &str = "id, public_id, search_term, trigger_source, status, \
     started_at, completed_at, fetched, persisted, duplicates, filtered, failed, \
     abandoned, error_message, created_at";

/// A row from the `ingest_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub search_term: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub fetched: i32,
    pub persisted: i32,
    pub duplicates: i32,
    pub filtered: i32,
    pub failed: i32,
    pub abandoned: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-outcome counters written when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestRunCounts {
    pub fetched: i32,
    pub persisted: i32,
    pub duplicates: i32,
    pub filtered: i32,
    pub failed: i32,
    pub abandoned: i32,
}

/// Creates a new ingest run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingest_run(
    pool: &PgPool,
    search_term: &str,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let sql = format!(
        "INSERT INTO ingest_runs (public_id, search_term, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {INGEST_RUN_COLUMNS}"
    );

    let row = sqlx::query_as::<_, IngestRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(search_term)
        .bind(trigger_source)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_ingest_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` and records its counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_ingest_run(
    pool: &PgPool,
    id: i64,
    counts: IngestRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             fetched = $1, persisted = $2, duplicates = $3, filtered = $4, failed = $5, \
             abandoned = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(counts.fetched)
    .bind(counts.persisted)
    .bind(counts.duplicates)
    .bind(counts.filtered)
    .bind(counts.failed)
    .bind(counts.abandoned)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_ingest_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_ingest_run(pool: &PgPool, id: i64) -> Result<IngestRunRow, DbError> {
    let sql = format!("SELECT {INGEST_RUN_COLUMNS} FROM ingest_runs WHERE id = $1");
    sqlx::query_as::<_, IngestRunRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingest_runs(pool: &PgPool, limit: i64) -> Result<Vec<IngestRunRow>, DbError> {
    let sql = format!(
        "SELECT {INGEST_RUN_COLUMNS} FROM ingest_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    );
    let rows = sqlx::query_as::<_, IngestRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
