//! Cron-driven ingestion passes.

use std::sync::Arc;

use bigear_core::AppConfig;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::{ingest, shutdown_signal, SearchArgs};

/// Runs an ingestion pass on every tick of `cron` until ctrl-c or SIGTERM.
///
/// A tick that fires while the previous pass is still running is skipped.
/// On shutdown the in-flight pass is cancelled and recorded with whatever it
/// had finished.
///
/// # Errors
///
/// Returns an error if the cron expression is invalid or the scheduler fails
/// to start or stop.
pub(crate) async fn run_schedule(
    pool: PgPool,
    config: AppConfig,
    search: SearchArgs,
    cron: &str,
) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    let cancel = CancellationToken::new();

    let pool = Arc::new(pool);
    let config = Arc::new(config);
    let search = Arc::new(search);
    let in_flight = Arc::new(Mutex::new(()));
    let job_cancel = cancel.clone();
    let drain = Arc::clone(&in_flight);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);
        let search = Arc::clone(&search);
        let in_flight = Arc::clone(&in_flight);
        let cancel = job_cancel.clone();

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!(term = %search.term, "scheduler: previous pass still running; skipping tick");
                return;
            };
            if cancel.is_cancelled() {
                return;
            }

            tracing::info!(term = %search.term, "scheduler: starting ingest pass");
            match ingest::run_ingest(&pool, &config, &search, "scheduler", &cancel).await {
                Ok(summary) => tracing::info!(
                    term = %search.term,
                    fetched = summary.fetched,
                    persisted = summary.persisted,
                    duplicates = summary.duplicates,
                    filtered = summary.filtered,
                    failed = summary.failed,
                    abandoned = summary.abandoned,
                    "scheduler: ingest pass complete"
                ),
                Err(e) => tracing::error!(term = %search.term, error = %e, "scheduler: ingest pass failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(cron = %cron, "scheduler: registered ingest job");

    shutdown_signal().await;
    cancel.cancel();
    scheduler.shutdown().await?;
    // Wait for a cancelled pass to record its run before exiting.
    let _idle = drain.lock().await;
    tracing::info!("scheduler: stopped");
    Ok(())
}
