//! Job read operations: get, list, stats.

use sqlx::Row;

use super::db::{job_from_row, JobStore, StoreError};
use crate::job::{Job, JobStatus, QueueStats};

const JOB_COLUMNS: &str =
    "id, kind, status, payload, result, error, retries, max_retries, created_at, updated_at";

impl JobStore {
    /// Fetch a single job by id.
    pub async fn get_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    /// All PENDING jobs, oldest first. Insertion order breaks created_at
    /// ties, so claim order is FIFO by enqueue time.
    pub async fn pending_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             WHERE status = 'PENDING' \
             ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    /// All jobs, newest first (status/reporting surface).
    pub async fn all_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    /// Job counts keyed by status plus a total, recomputed from the table.
    pub async fn stats(&self) -> Result<QueueStats, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS n
            FROM jobs
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = QueueStats::default();
        for row in rows {
            let status: String = row.get("status");
            let n = row.get::<i64, _>("n") as u64;
            stats.total += n;
            match JobStatus::from_str(&status) {
                JobStatus::Pending => stats.pending += n,
                JobStatus::Processing => stats.processing += n,
                JobStatus::Completed => stats.completed += n,
                JobStatus::Failed => stats.failed += n,
            }
        }
        Ok(stats)
    }
}
