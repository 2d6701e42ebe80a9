//! SQLite-backed job store: connection, migration, row mapping.

use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use thiserror::Error;

use crate::job::{Job, JobKind, JobPayload, JobStatus};

/// Errors surfaced by the job store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} already exists")]
    DuplicateId(String),
    #[error("job {0} not found")]
    NotFound(String),
    #[error("invalid stored job data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Percent-encode a path for a sqlite:// URI so spaces and special
/// characters don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the SQLite-backed job store.
///
/// The database file lives under the XDG state directory
/// (`~/.local/state/blobup/jobs.db`). Cloning shares the pool.
#[derive(Clone)]
pub struct JobStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl JobStore {
    /// Open (or create) the default job database and run migrations.
    pub async fn open_default() -> Result<Self, StoreError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("blobup")?;
        let state_dir = xdg_dirs.get_state_home().join("blobup");
        tokio::fs::create_dir_all(&state_dir).await?;

        let db_path = state_dir.join("jobs.db");
        let uri = path_to_sqlite_uri(&db_path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;

        let store = JobStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Open (or create) the database at a specific path, creating parent
    /// directories as needed. Intended for tests (temp directories).
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let store = JobStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        // One table keyed by job id. The (status, created_at) index backs the
        // two hot scans: "PENDING oldest first" and "all PROCESSING".
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                status TEXT NOT NULL,
                payload TEXT NOT NULL,
                result TEXT,
                error TEXT,
                retries INTEGER NOT NULL DEFAULT 0,
                max_retries INTEGER NOT NULL DEFAULT 3,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS jobs_status_created_idx
            ON jobs (status, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Map a full `jobs` row to a `Job`. Shared by read and claim paths.
pub(crate) fn job_from_row(row: &SqliteRow) -> Result<Job, StoreError> {
    let payload_json: String = row.get("payload");
    let payload: JobPayload = serde_json::from_str(&payload_json)?;
    let result_json: Option<String> = row.get("result");
    let result = result_json
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()?;

    let kind: String = row.get("kind");
    let status: String = row.get("status");

    Ok(Job {
        id: row.get("id"),
        kind: JobKind::from_str(&kind),
        status: JobStatus::from_str(&status),
        payload,
        result,
        error: row.get("error"),
        retries: row.get::<i64, _>("retries") as u32,
        max_retries: row.get::<i64, _>("max_retries") as u32,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
/// Open an in-memory store for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<JobStore, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let store = JobStore { pool };
    store.migrate().await?;
    Ok(store)
}
