//! Bounded worker pool: caps concurrent job executions and keeps counters.
//!
//! The pool only mutates the in-memory job it is handed; persisting status
//! transitions is the scheduler's responsibility.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Mutex;
use thiserror::Error;

use crate::job::{unix_timestamp_ms, Job, JobId, JobStatus};
use crate::upload::UploadError;

/// Errors surfaced by `WorkerPool::execute`.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool was already at its concurrency limit; the operation was
    /// never started. The scheduler avoids this by checking `can_accept`
    /// first, so hitting it means a racing caller.
    #[error("worker pool at capacity ({active}/{limit})")]
    AtCapacity { active: usize, limit: usize },
    /// The upload operation itself failed. Also recorded on the job.
    #[error("job execution failed")]
    Upload(#[source] UploadError),
}

/// Snapshot of the pool's execution counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub active_jobs: usize,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
    pub total_processed: u64,
}

#[derive(Debug, Default)]
struct PoolInner {
    active: HashSet<JobId>,
    completed_jobs: u64,
    failed_jobs: u64,
    total_processed: u64,
}

/// Enforces a hard upper bound on concurrently executing jobs.
#[derive(Debug)]
pub struct WorkerPool {
    max_concurrency: usize,
    inner: Mutex<PoolInner>,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// True iff a new execution can start right now. Pure query; the
    /// capacity check in `execute` is what actually reserves the slot.
    pub fn can_accept(&self) -> bool {
        self.inner.lock().unwrap().active.len() < self.max_concurrency
    }

    pub fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().unwrap();
        PoolStats {
            active_jobs: inner.active.len(),
            completed_jobs: inner.completed_jobs,
            failed_jobs: inner.failed_jobs,
            total_processed: inner.total_processed,
        }
    }

    /// Run `op` for `job`, bounded by the concurrency limit.
    ///
    /// Fails with `AtCapacity` before starting `op` when the pool is full.
    /// Otherwise the job is marked PROCESSING in memory and registered as
    /// active; on success it becomes COMPLETED with the result stored, on
    /// failure FAILED with the error text, and the failure is also returned
    /// to the caller. The active slot is released and `total_processed`
    /// bumped on every exit path, including cancellation mid-`op`.
    pub async fn execute<F, Fut>(&self, job: &mut Job, op: F) -> Result<serde_json::Value, PoolError>
    where
        F: FnOnce(&Job) -> Fut,
        Fut: Future<Output = Result<serde_json::Value, UploadError>>,
    {
        self.register(&job.id)?;
        let _slot = SlotGuard {
            pool: self,
            id: job.id.clone(),
        };

        job.status = JobStatus::Processing;
        job.updated_at = unix_timestamp_ms();

        match op(&*job).await {
            Ok(result) => {
                job.status = JobStatus::Completed;
                job.result = Some(result.clone());
                job.updated_at = unix_timestamp_ms();
                self.inner.lock().unwrap().completed_jobs += 1;
                Ok(result)
            }
            Err(err) => {
                job.status = JobStatus::Failed;
                job.error = Some(err.to_string());
                job.updated_at = unix_timestamp_ms();
                self.inner.lock().unwrap().failed_jobs += 1;
                Err(PoolError::Upload(err))
            }
        }
    }

    fn register(&self, id: &str) -> Result<(), PoolError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.active.len() >= self.max_concurrency {
            return Err(PoolError::AtCapacity {
                active: inner.active.len(),
                limit: self.max_concurrency,
            });
        }
        inner.active.insert(id.to_string());
        Ok(())
    }
}

/// Releases the active slot when dropped, so capacity comes back even if the
/// execution future is cancelled.
struct SlotGuard<'a> {
    pool: &'a WorkerPool,
    id: JobId,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.pool.inner.lock().unwrap();
        inner.active.remove(&self.id);
        inner.total_processed += 1;
    }
}
