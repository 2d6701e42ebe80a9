//! `blobup status` – show job queue status.

use anyhow::Result;
use blobup_core::store::JobStore;

pub async fn run_status() -> Result<()> {
    let store = JobStore::open_default().await?;
    let stats = store.stats().await?;

    println!("Jobs: {} total", stats.total);
    println!("  pending     {}", stats.pending);
    println!("  processing  {}", stats.processing);
    println!("  completed   {}", stats.completed);
    println!("  failed      {}", stats.failed);

    let jobs = store.all_jobs().await?;
    if !jobs.is_empty() {
        println!();
        println!(
            "{:<38} {:<10} {:<12} {:<12} {}",
            "ID", "KIND", "STATUS", "ACCOUNT", "FILE"
        );
        for job in jobs.iter().take(20) {
            println!(
                "{:<38} {:<10} {:<12} {:<12} {}",
                job.id,
                job.kind.as_str(),
                job.status.as_str(),
                job.payload.account_name.as_deref().unwrap_or("-"),
                job.payload.file_path,
            );
        }
        if jobs.len() > 20 {
            println!("... and {} more", jobs.len() - 20);
        }
    }
    Ok(())
}
