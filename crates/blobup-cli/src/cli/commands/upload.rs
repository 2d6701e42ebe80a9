//! `blobup upload <files...>` – queue files and drain the backlog.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use blobup_core::strategy::StrategyKind;

use super::{build_manager, load_config};

pub async fn run_upload(
    files: &[String],
    config: Option<&Path>,
    strategy: StrategyKind,
    no_start: bool,
) -> Result<()> {
    let cfg = load_config(config)?;
    let manager = build_manager(&cfg, strategy).await?;

    let jobs = manager.add_upload_tasks(files).await?;
    println!("Queued {} file(s).", jobs.len());

    if no_start {
        println!("Run `blobup start` or `blobup resume` to process them.");
        return Ok(());
    }

    manager.start();
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let status = manager.status().await?;
        print!(
            "\rpending: {}  processing: {}  completed: {}  failed: {}   ",
            status.queue.pending, status.queue.processing, status.queue.completed, status.queue.failed
        );
        std::io::stdout().flush().ok();

        if status.queue.pending == 0 && status.queue.processing == 0 {
            println!("\nDone.");
            manager.stop();
            break;
        }
    }
    Ok(())
}
