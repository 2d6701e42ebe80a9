//! Upload executor contract and the simulated stand-in transfer.
//!
//! The core treats the actual network transfer as an opaque asynchronous
//! collaborator: it eventually settles with a receipt or a failure. No
//! timeout is imposed here; a hung transfer holds its pool slot.

use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::job::Job;

/// Failure raised by an upload operation.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("transfer failed: {0}")]
    Transfer(String),
}

/// Boxed future returned by `UploadExecutor::upload`.
pub type UploadFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, UploadError>> + Send>>;

/// The opaque transfer collaborator handed to the pool per job. The returned
/// receipt is stored verbatim as the job's result.
pub trait UploadExecutor: Send + Sync {
    fn upload(&self, job: &Job) -> UploadFuture;
}

/// Stand-in executor: sleeps for a random interval and returns a mock blob
/// receipt. `fail_rate` injects failures for exercising the retry path.
#[derive(Debug, Clone)]
pub struct SimulatedUploader {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub fail_rate: f64,
}

impl Default for SimulatedUploader {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            fail_rate: 0.0,
        }
    }
}

impl SimulatedUploader {
    /// Instant, always-successful variant for tests.
    pub fn instant() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            fail_rate: 0.0,
        }
    }
}

impl UploadExecutor for SimulatedUploader {
    fn upload(&self, job: &Job) -> UploadFuture {
        let file_path = job.payload.file_path.clone();
        let span = self.max_delay.saturating_sub(self.min_delay);
        let (delay, fail) = {
            let mut rng = rand::thread_rng();
            (
                self.min_delay + span.mul_f64(rng.gen::<f64>()),
                rng.gen::<f64>() < self.fail_rate,
            )
        };

        Box::pin(async move {
            tokio::time::sleep(delay).await;
            if fail {
                return Err(UploadError::Transfer(format!(
                    "simulated transfer failure for {file_path}"
                )));
            }
            Ok(serde_json::json!({
                "blobId": format!("blob-{}", uuid::Uuid::new_v4()),
                "filePath": file_path,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobKind, JobPayload};

    #[tokio::test]
    async fn simulated_receipt_references_the_file() {
        let job = Job::new(JobKind::Upload, JobPayload::for_file("a.txt"), 3);
        let receipt = SimulatedUploader::instant().upload(&job).await.unwrap();
        assert_eq!(receipt["filePath"], "a.txt");
        assert!(receipt["blobId"].as_str().unwrap().starts_with("blob-"));
    }

    #[tokio::test]
    async fn full_fail_rate_always_fails() {
        let uploader = SimulatedUploader {
            fail_rate: 1.0,
            ..SimulatedUploader::instant()
        };
        let job = Job::new(JobKind::Upload, JobPayload::for_file("a.txt"), 3);
        let err = uploader.upload(&job).await.unwrap_err();
        assert!(err.to_string().contains("a.txt"));
    }
}
