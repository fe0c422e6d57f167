//! Maintenance and read-only query handlers over stored expressions.

use bigear_db::{ExpressionListParams, ExpressionRow};
use bigear_ingest::{Normalizer, NormalizerConfig};
use sqlx::PgPool;
use uuid::Uuid;

/// Strict cleanup of already-normalized text. `None` when nothing changes.
pub(crate) fn reclean_text(normalizer: &Normalizer, clean_text: &str) -> Option<String> {
    let recleaned = normalizer.normalize(clean_text, None);
    (recleaned != clean_text).then_some(recleaned)
}

/// Re-applies strict punctuation cleanup to every live expression.
///
/// Rows are paged oldest first; `updated_at` is only bumped on rows whose
/// text actually changes.
///
/// # Errors
///
/// Returns an error if a page cannot be fetched or an update fails.
pub(crate) async fn run_reclean(pool: &PgPool, batch_size: i64, dry_run: bool) -> anyhow::Result<()> {
    let normalizer = Normalizer::new(NormalizerConfig {
        strict_punctuation: true,
        ..NormalizerConfig::default()
    });

    let mut scanned = 0_usize;
    let mut changed = 0_usize;
    let mut page = 0_i64;

    loop {
        let params = ExpressionListParams {
            page,
            limit: batch_size.max(1),
            sort_by: "created_at".to_string(),
            owner: None,
        };
        let rows = bigear_db::list_expressions(pool, &params).await?;
        if rows.is_empty() {
            break;
        }

        for row in &rows {
            scanned += 1;
            let Some(recleaned) = reclean_text(&normalizer, &row.clean_text) else {
                continue;
            };
            changed += 1;
            if dry_run {
                println!("{} {:?} -> {:?}", row.public_id, row.clean_text, recleaned);
            } else {
                bigear_db::update_clean_text(pool, row.public_id, &recleaned).await?;
            }
        }

        page += 1;
    }

    let verb = if dry_run { "would update" } else { "updated" };
    tracing::info!(scanned, changed, dry_run, "reclean complete");
    println!("scanned {scanned} expression(s); {verb} {changed}");
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn print_expression(row: &ExpressionRow) {
    let last_ten = row
        .last_ten_interaction
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    println!(
        "{:<38}{:<20}{:<18}{:<10}{:<10}{}",
        row.public_id,
        truncate(&row.owner, 18),
        row.created_at.format("%Y-%m-%d %H:%M"),
        row.total_interaction,
        last_ten,
        truncate(&row.clean_text, 60),
    );
    if let Some(labels) = &row.attachment_labels {
        println!("{:<38}labels: {labels}", "");
    }
}

/// Prints one page of live expressions.
///
/// # Errors
///
/// Returns an error if the sort key is unknown or the query fails.
pub(crate) async fn run_list(pool: &PgPool, params: &ExpressionListParams) -> anyhow::Result<()> {
    let rows = bigear_db::list_expressions(pool, params).await?;

    if rows.is_empty() {
        println!("no expressions found; run `ingest` first");
        return Ok(());
    }

    println!(
        "{:<38}{:<20}{:<18}{:<10}{:<10}TEXT",
        "ID", "OWNER", "CREATED", "TOTAL", "LAST10"
    );
    for row in &rows {
        print_expression(row);
    }

    Ok(())
}

/// Soft-deletes one expression.
///
/// # Errors
///
/// Returns an error if no live expression has `public_id` or the update fails.
pub(crate) async fn run_delete(pool: &PgPool, public_id: Uuid) -> anyhow::Result<()> {
    match bigear_db::soft_delete_expression(pool, public_id).await {
        Ok(()) => {
            tracing::info!(%public_id, "expression soft-deleted");
            println!("deleted {public_id}");
            Ok(())
        }
        Err(bigear_db::DbError::NotFound) => {
            anyhow::bail!("no live expression with id {public_id}")
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints the most recent ingest runs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub(crate) async fn run_runs(pool: &PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = bigear_db::list_ingest_runs(pool, limit).await?;

    if runs.is_empty() {
        println!("no ingest runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<8}{:<24}{:<11}{:<11}{:<18}{:<8}{:<8}{:<6}{:<6}{:<6}ABANDONED",
        "RUN", "TERM", "TRIGGER", "STATUS", "CREATED", "FETCHED", "STORED", "DUPS", "FILT", "FAIL"
    );
    for run in &runs {
        println!(
            "{:<8}{:<24}{:<11}{:<11}{:<18}{:<8}{:<8}{:<6}{:<6}{:<6}{}",
            run.id,
            truncate(&run.search_term, 22),
            run.trigger_source,
            run.status,
            run.created_at.format("%Y-%m-%d %H:%M"),
            run.fetched,
            run.persisted,
            run.duplicates,
            run.filtered,
            run.failed,
            run.abandoned,
        );
        if let Some(message) = &run.error_message {
            println!("{:<8}error: {message}", "");
        }
    }

    Ok(())
}
