//! `blobup start` / `blobup resume` – run the scheduler until interrupted.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use blobup_core::config::{self, BlobupConfig};
use blobup_core::manager::BatchManager;
use blobup_core::queue::JobQueue;
use blobup_core::store::JobStore;
use blobup_core::strategy::StrategyKind;
use blobup_core::upload::{SimulatedUploader, UploadExecutor};

pub(crate) fn load_config(path: Option<&Path>) -> Result<BlobupConfig> {
    let cfg = match path {
        Some(p) => config::load_from(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

pub(crate) async fn build_manager(
    cfg: &BlobupConfig,
    strategy: StrategyKind,
) -> Result<BatchManager> {
    let accounts = cfg.build_accounts()?;
    tracing::info!(accounts = accounts.len(), %strategy, "building batch manager");

    let store = JobStore::open_default().await?;
    let queue = JobQueue::new(store);
    // Stand-in executor until the real SDK transfer is wired in.
    let uploader: Arc<dyn UploadExecutor> = Arc::new(SimulatedUploader::default());

    Ok(BatchManager::new(
        queue,
        strategy.build(),
        uploader,
        accounts,
        cfg.global_limits.max_parallel_uploads,
    )
    .with_poll_interval(Duration::from_millis(cfg.global_limits.poll_interval_ms))
    .with_retry_backoff(Duration::from_millis(cfg.retry.backoff_ms))
    .with_max_retries(cfg.retry.max_attempts))
}

pub async fn run_start(config: Option<&Path>, strategy: StrategyKind, resume: bool) -> Result<()> {
    let cfg = load_config(config)?;
    let manager = build_manager(&cfg, strategy).await?;

    if resume {
        manager.resume().await?;
    } else {
        manager.start();
    }
    println!("Scheduler running (strategy: {strategy}). Press Ctrl-C to stop.");

    tokio::signal::ctrl_c().await?;
    println!("\nShutting down; in-flight uploads will finish.");
    manager.stop();

    let status = manager.status().await?;
    println!(
        "Processed {} job(s) this run ({} completed, {} failed).",
        status.pool.total_processed, status.pool.completed_jobs, status.pool.failed_jobs
    );
    Ok(())
}
