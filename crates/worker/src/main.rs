//! Export worker process.
//!
//! Owns the broker connection for its lifetime, serves the `export` queue
//! and finishes the job in flight before exiting on Ctrl-C. Audit, plan and
//! asset jobs are consumed by the AI workers, not here.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use tasknator_infra::{
    AppConfig, ExportJobRunner, PostgresExportSource, RedisQueue, storage_from_config,
};
use tasknator_jobs::{JobKind, JobSource, JobWorker, JobWorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tasknator_observability::init();

    let config = AppConfig::from_env()?;

    let queue = Arc::new(RedisQueue::connect(&config.redis_url).await?);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.require_database_url()?)
        .await?;
    let storage = storage_from_config(&config.storage)?;

    let runner = ExportJobRunner::new(Arc::new(PostgresExportSource::new(pool)), storage);

    let counts = queue.counts(JobKind::Export).await?;
    info!(
        waiting = counts.waiting,
        delayed = counts.delayed,
        failed = counts.failed,
        lease_secs = queue.lease().as_secs(),
        "export worker starting"
    );

    let handle = JobWorker::new(queue, JobKind::Export, Arc::new(runner))
        .with_config(
            JobWorkerConfig::default()
                .with_name("export-worker")
                .with_poll_interval(config.worker_poll_interval),
        )
        .spawn();

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, finishing in-flight job");

    let stats = handle.shutdown().await;
    info!(
        processed = stats.jobs_processed,
        succeeded = stats.jobs_succeeded,
        failed = stats.jobs_failed,
        dead = stats.jobs_dead_lettered,
        uptime_secs = stats.uptime_secs,
        "export worker stopped"
    );

    Ok(())
}
