//! Bounded job executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{info, warn};

use crate::context::{PipelineContext, QueuedJob};
use crate::error::WorkerResult;
use crate::pipeline::process_job;

/// Drains the FIFO submission queue under a concurrency limit.
///
/// Jobs queue in arrival order; a semaphore throttles simultaneous
/// external-tool invocations across jobs.
pub struct JobExecutor {
    ctx: Arc<PipelineContext>,
    queue_rx: mpsc::Receiver<QueuedJob>,
    semaphore: Arc<Semaphore>,
    shutdown_rx: watch::Receiver<bool>,
}

impl JobExecutor {
    pub fn new(
        ctx: Arc<PipelineContext>,
        queue_rx: mpsc::Receiver<QueuedJob>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs));
        Self {
            ctx,
            queue_rx,
            semaphore,
            shutdown_rx,
        }
    }

    /// Consume jobs until the queue closes or shutdown is signalled,
    /// then drain in-flight work.
    pub async fn run(mut self) -> WorkerResult<()> {
        info!(
            max_concurrent = self.ctx.config.max_concurrent_jobs,
            "Job executor started"
        );

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                job = self.queue_rx.recv() => {
                    let Some(job) = job else {
                        info!("Submission queue closed, stopping executor");
                        break;
                    };
                    self.dispatch(job).await;
                }
            }
        }

        self.drain().await;
        info!("Job executor stopped");
        Ok(())
    }

    async fn dispatch(&self, job: QueuedJob) {
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            let _permit = permit;
            let id = job.id.clone();
            process_job(&ctx, job).await;
            ctx.finish_job(&id).await;
        });
    }

    /// Wait for in-flight jobs to finish, bounded by the shutdown timeout.
    async fn drain(&self) {
        let max = self.ctx.config.max_concurrent_jobs;
        let waited = tokio::time::timeout(self.ctx.config.shutdown_timeout, async {
            loop {
                if self.semaphore.available_permits() == max {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;

        if waited.is_err() {
            warn!(
                "Shutdown timeout reached with jobs still in flight after {:?}",
                self.ctx.config.shutdown_timeout
            );
        }
    }
}
