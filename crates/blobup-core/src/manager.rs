//! Batch manager: the scheduler loop tying queue, pool, and strategy together.
//!
//! A single spawned loop claims jobs and fires each one off as its own task;
//! the loop never waits for an individual upload. Completion handling
//! (persisting the terminal status, applying the retry policy, releasing the
//! strategy's load) runs in that per-job task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::account::Account;
use crate::job::{Job, JobKind, JobPayload, JobStatus, QueueStats};
use crate::pool::{PoolError, PoolStats, WorkerPool};
use crate::queue::{JobQueue, DEFAULT_MAX_RETRIES};
use crate::store::StoreError;
use crate::strategy::SelectionStrategy;
use crate::upload::UploadExecutor;

/// Default pause between scheduler polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Composite snapshot for the status surface.
#[derive(Debug, Clone, Copy)]
pub struct ManagerStatus {
    pub queue: QueueStats,
    pub pool: PoolStats,
    pub is_running: bool,
}

/// Orchestrates account selection, the durable queue, and the bounded pool
/// into a continuous dispatch loop with start/stop/resume semantics.
pub struct BatchManager {
    queue: Arc<JobQueue>,
    pool: Arc<WorkerPool>,
    strategy: Arc<dyn SelectionStrategy>,
    uploader: Arc<dyn UploadExecutor>,
    accounts: Arc<Vec<Account>>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    retry_backoff: Duration,
    max_retries: u32,
}

impl BatchManager {
    pub fn new(
        queue: JobQueue,
        strategy: Arc<dyn SelectionStrategy>,
        uploader: Arc<dyn UploadExecutor>,
        accounts: Vec<Account>,
        max_parallel_uploads: usize,
    ) -> Self {
        Self {
            queue: Arc::new(queue),
            pool: Arc::new(WorkerPool::new(max_parallel_uploads)),
            strategy,
            uploader,
            accounts: Arc::new(accounts),
            running: Arc::new(AtomicBool::new(false)),
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_backoff: Duration::ZERO,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the poll debounce (mainly for tests and tuning).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Base delay before a failed job is re-enqueued (scaled by attempt).
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Retry budget attached to jobs enqueued through this manager.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enqueue one UPLOAD job per file path, in order.
    pub async fn add_upload_tasks(&self, file_paths: &[String]) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let job = self
                .queue
                .add_job(
                    JobKind::Upload,
                    JobPayload::for_file(path.clone()),
                    self.max_retries,
                )
                .await?;
            jobs.push(job);
        }
        Ok(jobs)
    }

    /// Start the dispatch loop. No-op if already running; never blocks
    /// beyond spawning the loop task.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(
            accounts = self.accounts.len(),
            "batch manager starting dispatch loop"
        );
        self.spawn_dispatch_loop();
    }

    /// Reset jobs stranded in PROCESSING by a previous process, then start.
    /// Must only be called when no other scheduler instance shares the
    /// database.
    pub async fn resume(&self) -> Result<(), StoreError> {
        let reset = self.queue.reset_stuck_jobs().await?;
        if reset > 0 {
            tracing::info!(reset, "requeued stuck jobs before resuming");
        }
        self.start();
        Ok(())
    }

    /// Stop dispatching. In-flight uploads run to completion and still
    /// persist their terminal status; the loop exits at its next check.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("batch manager stopping");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn status(&self) -> Result<ManagerStatus, StoreError> {
        Ok(ManagerStatus {
            queue: self.queue.stats().await?,
            pool: self.pool.stats(),
            is_running: self.is_running(),
        })
    }

    fn spawn_dispatch_loop(&self) {
        let queue = Arc::clone(&self.queue);
        let pool = Arc::clone(&self.pool);
        let strategy = Arc::clone(&self.strategy);
        let uploader = Arc::clone(&self.uploader);
        let accounts = Arc::clone(&self.accounts);
        let running = Arc::clone(&self.running);
        let poll_interval = self.poll_interval;
        let retry_backoff = self.retry_backoff;

        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                if pool.can_accept() {
                    match queue.claim_next_pending().await {
                        Ok(Some(job)) => {
                            dispatch_one(
                                job,
                                &queue,
                                &pool,
                                &strategy,
                                &uploader,
                                &accounts,
                                retry_backoff,
                            )
                            .await;
                        }
                        Ok(None) => {}
                        Err(err) => {
                            // Store unavailable: scheduling cannot continue.
                            tracing::error!("job store unavailable, stopping scheduler: {err:#}");
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                }
                tokio::time::sleep(poll_interval).await;
            }
            tracing::debug!("dispatch loop exited");
        });
    }
}

/// Pick an account for a claimed job and fire the execution off as its own
/// task. The claim is rolled back to PENDING if no account is available.
async fn dispatch_one(
    mut job: Job,
    queue: &Arc<JobQueue>,
    pool: &Arc<WorkerPool>,
    strategy: &Arc<dyn SelectionStrategy>,
    uploader: &Arc<dyn UploadExecutor>,
    accounts: &Arc<Vec<Account>>,
    retry_backoff: Duration,
) {
    let Some(account) = strategy.select_account(accounts) else {
        tracing::warn!(job = %job.id, "no account available, releasing claim");
        if let Err(err) = queue
            .update_status(&job.id, JobStatus::Pending, None, None)
            .await
        {
            tracing::error!(job = %job.id, "failed to release claim: {err:#}");
        }
        return;
    };

    job.payload.account_name = Some(account.name.clone());
    if let Err(err) = queue.assign_account(&job.id, &account.name).await {
        tracing::error!(job = %job.id, "failed to record account assignment: {err:#}");
    }

    tracing::info!(
        job = %job.id,
        kind = job.kind.as_str(),
        file = %job.payload.file_path,
        account = %account.name,
        "dispatching job"
    );

    let queue = Arc::clone(queue);
    let pool = Arc::clone(pool);
    let strategy = Arc::clone(strategy);
    let uploader = Arc::clone(uploader);
    tokio::spawn(async move {
        let outcome = pool.execute(&mut job, |j| uploader.upload(j)).await;
        if let Err(err) = settle(&queue, &job, outcome, retry_backoff).await {
            tracing::error!(job = %job.id, "failed to persist job outcome: {err:#}");
        }
        strategy.on_job_finished(&account.id);
    });
}

/// Persist the terminal state of a settled execution, re-enqueueing failed
/// jobs that still have retry budget.
async fn settle(
    queue: &JobQueue,
    job: &Job,
    outcome: Result<serde_json::Value, PoolError>,
    retry_backoff: Duration,
) -> Result<(), StoreError> {
    match outcome {
        Ok(result) => {
            tracing::info!(job = %job.id, "job completed");
            queue
                .update_status(&job.id, JobStatus::Completed, Some(&result), None)
                .await
        }
        Err(PoolError::Upload(err)) => {
            let message = err.to_string();
            // `job.retries` is the count before this attempt.
            let attempt = job.retries + 1;
            queue.increment_retries(&job.id).await?;

            if attempt < job.max_retries {
                tracing::warn!(
                    job = %job.id,
                    attempt,
                    max_retries = job.max_retries,
                    "job failed, re-enqueueing: {message}"
                );
                if !retry_backoff.is_zero() {
                    tokio::time::sleep(retry_backoff.saturating_mul(attempt)).await;
                }
                queue
                    .update_status(&job.id, JobStatus::Pending, None, Some(&message))
                    .await
            } else {
                tracing::warn!(job = %job.id, "job failed terminally: {message}");
                queue
                    .update_status(&job.id, JobStatus::Failed, None, Some(&message))
                    .await
            }
        }
        Err(PoolError::AtCapacity { .. }) => {
            // The loop checked capacity before claiming; losing that race
            // just puts the job back for the next poll.
            tracing::debug!(job = %job.id, "pool filled up before execute, releasing claim");
            queue
                .update_status(&job.id, JobStatus::Pending, None, None)
                .await
        }
    }
}
