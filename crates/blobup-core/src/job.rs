//! Job model: the unit of schedulable work with a persisted lifecycle.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Job identifier (uuid v4, assigned at creation).
pub type JobId = String;

/// Kind of work a job represents, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Upload,
    Download,
    Verify,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Upload => "UPLOAD",
            JobKind::Download => "DOWNLOAD",
            JobKind::Verify => "VERIFY",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "DOWNLOAD" => JobKind::Download,
            "VERIFY" => JobKind::Verify,
            _ => JobKind::Upload,
        }
    }
}

/// Lifecycle state of a job, stored as a string in the database.
///
/// Created `Pending`, claimed to `Processing` by the scheduler loop, then
/// terminal `Completed` or `Failed` (unless re-enqueued by the retry policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "PENDING" => JobStatus::Pending,
            "PROCESSING" => JobStatus::Processing,
            "COMPLETED" => JobStatus::Completed,
            _ => JobStatus::Failed,
        }
    }
}

/// Structured job payload, serialized as JSON text in the database.
///
/// `account_name` is written once, when the scheduler assigns an account
/// at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

impl JobPayload {
    pub fn for_file(path: impl Into<String>) -> Self {
        Self {
            file_path: path.into(),
            account_name: None,
        }
    }
}

/// A schedulable job. Timestamps are unix milliseconds; `updated_at` is
/// refreshed on every status mutation and never moves backwards.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub payload: JobPayload,
    /// Upload receipt, set exactly once on success.
    pub result: Option<serde_json::Value>,
    /// Failure message, set on each failed attempt.
    pub error: Option<String>,
    pub retries: u32,
    pub max_retries: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Job {
    /// Build a fresh `Pending` job with a new uuid and current timestamps.
    pub fn new(kind: JobKind, payload: JobPayload, max_retries: u32) -> Self {
        let now = unix_timestamp_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            status: JobStatus::Pending,
            payload,
            result: None,
            error: None,
            retries: 0,
            max_retries,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Aggregate job counts keyed by status, recomputed from the jobs table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Current time as unix milliseconds (for job timestamps).
pub fn unix_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_roundtrip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn kind_string_roundtrip() {
        for kind in [JobKind::Upload, JobKind::Download, JobKind::Verify] {
            assert_eq!(JobKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn new_job_is_pending_with_fresh_id() {
        let a = Job::new(JobKind::Upload, JobPayload::for_file("a.txt"), 3);
        let b = Job::new(JobKind::Upload, JobPayload::for_file("b.txt"), 3);
        assert_eq!(a.status, JobStatus::Pending);
        assert_eq!(a.retries, 0);
        assert_eq!(a.created_at, a.updated_at);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn payload_json_shape() {
        let p = JobPayload::for_file("video.mp4");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"filePath":"video.mp4"}"#);

        let mut assigned = p.clone();
        assigned.account_name = Some("primary".to_string());
        let json = serde_json::to_string(&assigned).unwrap();
        assert_eq!(json, r#"{"filePath":"video.mp4","accountName":"primary"}"#);
        let back: JobPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assigned);
    }
}
