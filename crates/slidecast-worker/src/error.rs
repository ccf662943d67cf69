//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Image acquisition failed: {0}")]
    ImageAcquisitionFailed(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Invalid request: {0}")]
    Request(#[from] slidecast_models::RequestError),

    #[error("Media error: {0}")]
    Media(#[from] slidecast_media::MediaError),

    #[error("Provider error: {0}")]
    Provider(#[from] slidecast_providers::ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Human-readable message safe to surface across the job-status
    /// boundary.
    pub fn user_message(&self) -> String {
        match self {
            WorkerError::Media(slidecast_media::MediaError::RenderVerificationFailed {
                reason,
                ..
            }) => {
                format!("Video rendering failed: {reason}")
            }
            WorkerError::Cancelled
            | WorkerError::Media(slidecast_media::MediaError::Cancelled) => {
                "Job was cancelled".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_failure_message() {
        let err = WorkerError::from(slidecast_media::MediaError::verification_failed(
            "/tmp/out.mp4",
            "output file missing",
            None,
        ));
        assert_eq!(
            err.user_message(),
            "Video rendering failed: output file missing"
        );
    }
}
