mod ingest;
mod maintain;
mod schedule;

use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "bigear")]
#[command(about = "Social post ingestion and enrichment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Search parameters shared by `ingest` and `schedule`.
#[derive(Debug, Clone, Args, PartialEq, Eq)]
pub(crate) struct SearchArgs {
    /// Search term
    #[arg(long, alias = "key")]
    term: String,
    /// Number of posts to request (1-100)
    #[arg(long, default_value = "50")]
    count: u32,
    /// Ask for popular results instead of mixed
    #[arg(long)]
    popular: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one ingestion pass
    Ingest {
        #[command(flatten)]
        search: SearchArgs,
        /// Print what would be searched without calling any service
        #[arg(long)]
        dry_run: bool,
    },
    /// Run ingestion passes on a cron schedule until interrupted
    Schedule {
        #[command(flatten)]
        search: SearchArgs,
        /// Six-field cron expression (sec min hour day month weekday), UTC
        #[arg(long, default_value = "0 0 * * * *")]
        cron: String,
    },
    /// Re-apply strict punctuation cleanup to stored clean text
    Reclean {
        /// Show changes without writing them
        #[arg(long)]
        dry_run: bool,
        /// Rows fetched per page
        #[arg(long, default_value = "200")]
        batch_size: i64,
    },
    /// List stored expressions
    List {
        /// Zero-based page
        #[arg(long, default_value = "0")]
        page: i64,
        #[arg(long, default_value = "20")]
        limit: i64,
        /// Sort column, prefix with '-' for descending
        #[arg(long, default_value = "-created_at", allow_hyphen_values = true)]
        sort: String,
        /// Case-insensitive owner substring
        #[arg(long)]
        owner: Option<String>,
    },
    /// Soft-delete an expression by public id
    Delete { public_id: Uuid },
    /// Show recent ingest runs
    Runs {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = bigear_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    if let Commands::Ingest {
        search,
        dry_run: true,
    } = &cli.command
    {
        ingest::print_dry_run(&config, search);
        return Ok(());
    }

    let pool_config = bigear_db::PoolConfig::from_app_config(&config);
    let pool = bigear_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Migrate => {
            let applied = bigear_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Ingest { search, .. } => {
            let cancel = CancellationToken::new();
            let watcher = cancel.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                watcher.cancel();
            });

            let summary = ingest::run_ingest(&pool, &config, &search, "cli", &cancel).await?;
            println!(
                "fetched {} | persisted {} ({} labelled) | duplicates {} | filtered {} | failed {} | abandoned {}",
                summary.fetched,
                summary.persisted,
                summary.labelled,
                summary.duplicates,
                summary.filtered,
                summary.failed,
                summary.abandoned
            );
        }
        Commands::Schedule { search, cron } => {
            schedule::run_schedule(pool, config, search, &cron).await?;
        }
        Commands::Reclean {
            dry_run,
            batch_size,
        } => maintain::run_reclean(&pool, batch_size, dry_run).await?,
        Commands::List {
            page,
            limit,
            sort,
            owner,
        } => {
            let params = bigear_db::ExpressionListParams {
                page,
                limit,
                sort_by: sort,
                owner,
            };
            maintain::run_list(&pool, &params).await?;
        }
        Commands::Delete { public_id } => maintain::run_delete(&pool, public_id).await?,
        Commands::Runs { limit } => maintain::run_runs(&pool, limit).await?,
    }

    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, cancelling in-flight work");
}

/// Marks an ingest run failed, logging rather than propagating any error.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = bigear_db::fail_ingest_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark ingest run as failed"
        );
    }
}

#[cfg(test)]
mod tests;
