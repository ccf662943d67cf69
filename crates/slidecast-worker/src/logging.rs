//! Structured job logging.

use tracing::{error, info, warn, Span};

use slidecast_models::JobId;

/// Job logger with consistent contextual fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: String,
}

impl JobLogger {
    /// Create a logger for one job and pipeline stage.
    pub fn new(job_id: &JobId, stage: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Derive a logger for a different stage of the same job.
    pub fn stage(&self, stage: &str) -> Self {
        Self {
            job_id: self.job_id.clone(),
            stage: stage.to_string(),
        }
    }

    pub fn info(&self, message: &str) {
        info!(job_id = %self.job_id, stage = %self.stage, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(job_id = %self.job_id, stage = %self.stage, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(job_id = %self.job_id, stage = %self.stage, "{}", message);
    }

    /// Create a tracing span carrying the job context.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, stage = %self.stage)
    }
}
