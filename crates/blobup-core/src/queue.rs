//! Durable FIFO job queue: thin orchestration over the job store.

use crate::job::{Job, JobKind, JobPayload, JobStatus, QueueStats};
use crate::store::{JobStore, StoreError};

/// Default retry budget for newly enqueued jobs.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Store-backed job queue. Takes its store at construction so tests can
/// substitute an in-memory database.
#[derive(Clone)]
pub struct JobQueue {
    store: JobStore,
}

impl JobQueue {
    pub fn new(store: JobStore) -> Self {
        Self { store }
    }

    /// Create and persist a new PENDING job, returning the constructed record.
    pub async fn add_job(
        &self,
        kind: JobKind,
        payload: JobPayload,
        max_retries: u32,
    ) -> Result<Job, StoreError> {
        let job = Job::new(kind, payload, max_retries);
        self.store.insert_job(&job).await?;
        Ok(job)
    }

    /// Peek at the oldest PENDING job without claiming it.
    pub async fn next_pending(&self) -> Result<Option<Job>, StoreError> {
        Ok(self.store.pending_jobs().await?.into_iter().next())
    }

    /// Atomically claim the oldest PENDING job, transitioning it to
    /// PROCESSING. At most one claimer wins a given job.
    pub async fn claim_next_pending(&self) -> Result<Option<Job>, StoreError> {
        self.store.claim_next_pending().await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        self.store.update_status(id, status, result, error).await
    }

    pub async fn assign_account(&self, id: &str, account_name: &str) -> Result<(), StoreError> {
        self.store.assign_account(id, account_name).await
    }

    pub async fn increment_retries(&self, id: &str) -> Result<(), StoreError> {
        self.store.increment_retries(id).await
    }

    /// Reset jobs stranded in PROCESSING by an earlier crash back to
    /// PENDING. Only call when no other scheduler instance is live, since
    /// the store cannot tell a stuck job from one currently running.
    pub async fn reset_stuck_jobs(&self) -> Result<u64, StoreError> {
        self.store.reset_processing_jobs().await
    }

    pub async fn stats(&self) -> Result<QueueStats, StoreError> {
        self.store.stats().await
    }

    pub async fn jobs(&self) -> Result<Vec<Job>, StoreError> {
        self.store.all_jobs().await
    }

    pub async fn job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        self.store.get_job(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::db::open_memory;

    #[tokio::test]
    async fn add_job_persists_a_pending_record() {
        let queue = JobQueue::new(open_memory().await.unwrap());
        let job = queue
            .add_job(
                JobKind::Upload,
                JobPayload::for_file("a.txt"),
                DEFAULT_MAX_RETRIES,
            )
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.max_retries, 3);
        let stored = queue.job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.payload.file_path, "a.txt");
    }

    #[tokio::test]
    async fn next_pending_returns_head_without_claiming() {
        let queue = JobQueue::new(open_memory().await.unwrap());
        let first = queue
            .add_job(JobKind::Upload, JobPayload::for_file("a.txt"), 3)
            .await
            .unwrap();
        queue
            .add_job(JobKind::Upload, JobPayload::for_file("b.txt"), 3)
            .await
            .unwrap();

        let head = queue.next_pending().await.unwrap().unwrap();
        assert_eq!(head.id, first.id);
        // Peeking does not change state.
        assert_eq!(queue.stats().await.unwrap().pending, 2);
    }

    #[tokio::test]
    async fn claim_yields_jobs_in_enqueue_order() {
        let queue = JobQueue::new(open_memory().await.unwrap());
        let mut ids = Vec::new();
        for path in ["one", "two", "three"] {
            ids.push(
                queue
                    .add_job(JobKind::Upload, JobPayload::for_file(path), 3)
                    .await
                    .unwrap()
                    .id,
            );
        }
        for expected in &ids {
            let claimed = queue.claim_next_pending().await.unwrap().unwrap();
            assert_eq!(&claimed.id, expected);
        }
        assert!(queue.claim_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_stuck_jobs_requeues_processing() {
        let queue = JobQueue::new(open_memory().await.unwrap());
        queue
            .add_job(JobKind::Upload, JobPayload::for_file("a.txt"), 3)
            .await
            .unwrap();
        let claimed = queue.claim_next_pending().await.unwrap().unwrap();

        assert_eq!(queue.reset_stuck_jobs().await.unwrap(), 1);
        let job = queue.job(&claimed.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }
}
