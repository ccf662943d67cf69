//! Job status tracking exposed to the routing/UI layer.

use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use slidecast_models::{JobId, RenderJob, RenderResult};

/// Capacity of the status broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// In-process job status store with push notification.
///
/// Progress is monotonically non-decreasing while a job is processing;
/// once a terminal status is set, further writes are idempotent no-ops.
/// Poll with [`JobTracker::get`], push with [`JobTracker::subscribe`]
/// (the out-of-scope WebSocket layer consumes the broadcast).
pub struct JobTracker {
    jobs: RwLock<HashMap<String, RenderJob>>,
    events: broadcast::Sender<RenderJob>,
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            jobs: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a new pending job.
    pub async fn create(&self, id: &JobId) -> RenderJob {
        let job = RenderJob::new(id.clone());
        self.jobs
            .write()
            .await
            .insert(id.to_string(), job.clone());
        let _ = self.events.send(job.clone());
        job
    }

    /// Snapshot of one job's status.
    pub async fn get(&self, id: &JobId) -> Option<RenderJob> {
        self.jobs.read().await.get(id.as_str()).cloned()
    }

    /// Subscribe to status change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderJob> {
        self.events.subscribe()
    }

    /// Move a job into `Processing`.
    pub async fn start(&self, id: &JobId) {
        self.mutate(id, |job| job.start()).await;
    }

    /// Record a progress milestone.
    pub async fn update(&self, id: &JobId, progress: u8, message: impl Into<String>) {
        let message = message.into();
        self.mutate(id, |job| job.set_progress(progress, message)).await;
    }

    /// Record successful completion.
    pub async fn complete(&self, id: &JobId, result: RenderResult) {
        self.mutate(id, |job| job.complete(result)).await;
    }

    /// Record terminal failure.
    pub async fn fail(&self, id: &JobId, error: impl Into<String>) {
        let error = error.into();
        self.mutate(id, |job| job.fail(error)).await;
    }

    async fn mutate(&self, id: &JobId, f: impl FnOnce(&mut RenderJob)) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(id.as_str()) else {
            debug!(job_id = %id, "Ignoring update for unknown job");
            return;
        };
        if job.is_terminal() {
            debug!(job_id = %id, "Ignoring update after terminal state");
            return;
        }
        f(job);
        let _ = self.events.send(job.clone());
    }
}
