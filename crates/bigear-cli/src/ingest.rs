use bigear_core::AppConfig;
use bigear_db::IngestRunCounts;
use bigear_ingest::{Limiters, PassSummary, Pipeline, PipelineConfig};
use bigear_twitter::{ResultOrdering, TwitterClient};
use bigear_vision::LabelClient;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::{fail_run_best_effort, SearchArgs};

fn ordering(search: &SearchArgs) -> ResultOrdering {
    if search.popular {
        ResultOrdering::Popular
    } else {
        ResultOrdering::Mixed
    }
}

pub(crate) fn print_dry_run(config: &AppConfig, search: &SearchArgs) {
    let enrichment = if config.vision_endpoint.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    println!(
        "dry-run: would search {:?} (count {}, {}, lang {}, min age {} day(s)); image labels {enrichment}",
        search.term,
        search.count,
        ordering(search).as_str(),
        config.search_lang,
        config.min_age_days,
    );
}

/// Builds the pipeline against Postgres and the live services.
fn build_pipeline(
    pool: &PgPool,
    config: &AppConfig,
    search: &SearchArgs,
) -> anyhow::Result<Pipeline<PgPool, TwitterClient, LabelClient>> {
    let token = config
        .twitter_bearer_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("TWITTER_BEARER_TOKEN is not set; cannot ingest"))?;

    let twitter = TwitterClient::with_base_url(
        token,
        config.request_timeout_secs,
        &config.user_agent,
        &config.twitter_api_base_url,
    )
    .map_err(|e| anyhow::anyhow!("failed to build Twitter client: {e}"))?
    .with_lang(&config.search_lang)
    .with_retry_policy(config.max_retries, config.retry_backoff_base_ms);

    let labeler = match config.vision_endpoint.as_deref() {
        Some(endpoint) => Some(
            LabelClient::new(
                endpoint,
                config.vision_api_key.as_deref(),
                config.request_timeout_secs,
                &config.user_agent,
            )
            .map_err(|e| anyhow::anyhow!("failed to build label client: {e}"))?
            .with_retry_policy(config.max_retries, config.retry_backoff_base_ms),
        ),
        None => {
            tracing::info!("VISION_ENDPOINT not set; photos will be stored without labels");
            None
        }
    };

    let pipeline_config =
        PipelineConfig::from_app_config(config, search.term.clone(), search.count, ordering(search));

    Ok(Pipeline::new(
        pool.clone(),
        twitter,
        labeler,
        Limiters::from_app_config(config),
        pipeline_config,
    ))
}

/// Per-run counters as stored in `ingest_runs`.
pub(crate) fn counts_from_summary(summary: &PassSummary) -> IngestRunCounts {
    let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    IngestRunCounts {
        fetched: clamp(summary.fetched),
        persisted: clamp(summary.persisted),
        duplicates: clamp(summary.duplicates),
        filtered: clamp(summary.filtered),
        failed: clamp(summary.failed),
        abandoned: clamp(summary.abandoned),
    }
}

/// Runs one tracked ingestion pass.
///
/// An `ingest_runs` row follows the pass from `queued` to `succeeded` or
/// `failed`. Per-candidate failures do not fail the run; a search failure or
/// cancellation before the search completes does.
///
/// # Errors
///
/// Returns an error if the bearer token is missing, a client cannot be built,
/// the run row cannot be written, or the pass itself fails.
pub(crate) async fn run_ingest(
    pool: &PgPool,
    config: &AppConfig,
    search: &SearchArgs,
    trigger: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<PassSummary> {
    let pipeline = build_pipeline(pool, config, search)?;

    let run = bigear_db::create_ingest_run(pool, &search.term, trigger).await?;
    if let Err(e) = bigear_db::start_ingest_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    match pipeline.run_pass(cancel).await {
        Ok(summary) => {
            if let Err(err) =
                bigear_db::complete_ingest_run(pool, run.id, counts_from_summary(&summary)).await
            {
                fail_run_best_effort(pool, run.id, format!("{err:#}")).await;
                return Err(err.into());
            }
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(run_id = run.id, term = %search.term, error = %err, "ingest pass failed");
            fail_run_best_effort(pool, run.id, format!("{err:#}")).await;
            Err(err.into())
        }
    }
}
