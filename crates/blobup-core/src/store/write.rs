//! Job write operations: insert, claim, status updates, recovery.

use sqlx::Row;

use super::db::{job_from_row, JobStore, StoreError};
use crate::job::{unix_timestamp_ms, Job, JobPayload, JobStatus};

impl JobStore {
    /// Persist a new job record. Fails with `DuplicateId` if the id is
    /// already present.
    pub async fn insert_job(&self, job: &Job) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&job.payload)?;
        let result = job
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let res = sqlx::query(
            r#"
            INSERT INTO jobs (
                id, kind, status, payload, result, error,
                retries, max_retries, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&job.id)
        .bind(job.kind.as_str())
        .bind(job.status.as_str())
        .bind(payload)
        .bind(result)
        .bind(&job.error)
        .bind(job.retries as i64)
        .bind(job.max_retries as i64)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Err(StoreError::DuplicateId(job.id.clone()));
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Atomically claim the oldest PENDING job by transitioning it to
    /// PROCESSING in one transaction. The status check in the UPDATE means
    /// at most one scheduler can claim a given job, even with concurrent
    /// dispatch loops on the same database.
    pub async fn claim_next_pending(&self) -> Result<Option<Job>, StoreError> {
        let now = unix_timestamp_ms();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT id, kind, status, payload, result, error,
                   retries, max_retries, created_at, updated_at
            FROM jobs
            WHERE status = 'PENDING'
            ORDER BY created_at ASC, rowid ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let mut job = job_from_row(&row)?;

        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'PROCESSING',
                updated_at = ?1
            WHERE id = ?2 AND status = 'PENDING'
            "#,
        )
        .bind(now)
        .bind(&job.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        job.status = JobStatus::Processing;
        job.updated_at = now;
        Ok(Some(job))
    }

    /// Atomically update status plus optional result/error, refreshing
    /// `updated_at`. Absent result/error overwrite any previous value.
    pub async fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        result: Option<&serde_json::Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = unix_timestamp_ms();
        let result_json = result.map(serde_json::to_string).transpose()?;

        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                result = ?2,
                error = ?3,
                updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(status.as_str())
        .bind(result_json)
        .bind(error)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Record the account chosen for a job by rewriting its payload.
    pub async fn assign_account(&self, id: &str, account_name: &str) -> Result<(), StoreError> {
        let now = unix_timestamp_ms();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT payload FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let mut payload: JobPayload = serde_json::from_str(&row.get::<String, _>("payload"))?;
        payload.account_name = Some(account_name.to_string());

        sqlx::query(
            r#"
            UPDATE jobs
            SET payload = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(serde_json::to_string(&payload)?)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Bump the retry counter and `updated_at`.
    pub async fn increment_retries(&self, id: &str) -> Result<(), StoreError> {
        let now = unix_timestamp_ms();
        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET retries = retries + 1,
                updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Bulk-transition every PROCESSING job back to PENDING. Call at resume
    /// time, before the scheduler starts, so jobs stranded by a crash are
    /// picked up again. Returns the number of jobs reset.
    pub async fn reset_processing_jobs(&self) -> Result<u64, StoreError> {
        let now = unix_timestamp_ms();
        let res = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'PENDING',
                updated_at = ?1
            WHERE status = 'PROCESSING'
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}
