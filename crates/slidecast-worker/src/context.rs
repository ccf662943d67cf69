//! Explicit pipeline context replacing ambient module-level state.
//!
//! One `PipelineContext` is constructed at process startup and passed by
//! reference into the executor and pipeline; provider order is data held
//! here, not branching code.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};

use slidecast_media::{FfmpegTool, MediaTool};
use slidecast_models::{JobId, RenderRequest};
use slidecast_providers::{
    ElevenLabsClient, GeminiClient, GoogleTranslateTts, ImageProvider, OfflineStudio,
    OpenAiClient, PexelsClient, PixabayClient, ProviderChain, TextProvider, VoiceProvider,
};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::tracker::JobTracker;

/// Submission queue capacity; jobs beyond this are rejected upstream.
const QUEUE_CAPACITY: usize = 100;

/// One accepted render job waiting for a worker slot.
pub struct QueuedJob {
    pub id: JobId,
    pub request: RenderRequest,
    pub cancel: watch::Receiver<bool>,
}

/// Shared state for the whole pipeline lifetime.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub tracker: Arc<JobTracker>,
    pub media: Arc<dyn MediaTool>,
    pub voice: ProviderChain<dyn VoiceProvider>,
    pub images: ProviderChain<dyn ImageProvider>,
    pub text: ProviderChain<dyn TextProvider>,
    pub offline: OfflineStudio,
    pub http: reqwest::Client,
    queue_tx: mpsc::Sender<QueuedJob>,
    cancellations: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl PipelineContext {
    /// Build the production context: FFmpeg tool plus every vendor whose
    /// API key is configured.
    pub fn new(config: WorkerConfig) -> (Arc<Self>, mpsc::Receiver<QueuedJob>) {
        let media: Arc<dyn MediaTool> = Arc::new(
            FfmpegTool::new().with_render_timeout(config.render_timeout.as_secs()),
        );
        let voice = build_voice_chain(&config);
        let images = build_image_chain(&config);
        let text = build_text_chain(&config);
        Self::with_parts(config, media, voice, images, text)
    }

    /// Build a context from explicit parts (tests inject fakes here).
    pub fn with_parts(
        config: WorkerConfig,
        media: Arc<dyn MediaTool>,
        voice: ProviderChain<dyn VoiceProvider>,
        images: ProviderChain<dyn ImageProvider>,
        text: ProviderChain<dyn TextProvider>,
    ) -> (Arc<Self>, mpsc::Receiver<QueuedJob>) {
        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let ctx = Arc::new(Self {
            config,
            tracker: Arc::new(JobTracker::new()),
            media,
            voice,
            images,
            text,
            offline: OfflineStudio,
            http: reqwest::Client::new(),
            queue_tx,
            cancellations: Mutex::new(HashMap::new()),
        });
        (ctx, queue_rx)
    }

    /// Accept a render request into the FIFO queue.
    pub async fn submit(&self, request: RenderRequest) -> WorkerResult<JobId> {
        request.validate()?;

        let id = JobId::new();
        self.tracker.create(&id).await;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.cancellations
            .lock()
            .await
            .insert(id.to_string(), cancel_tx);

        self.queue_tx
            .send(QueuedJob {
                id: id.clone(),
                request,
                cancel: cancel_rx,
            })
            .await
            .map_err(|_| WorkerError::QueueClosed)?;

        info!(job_id = %id, "Render job accepted");
        Ok(id)
    }

    /// Abort a job externally; stages notice between steps and abandon
    /// cleanly.
    pub async fn abort(&self, id: &JobId) {
        if let Some(cancel) = self.cancellations.lock().await.get(id.as_str()) {
            let _ = cancel.send(true);
            info!(job_id = %id, "Abort requested");
        }
    }

    /// Drop per-job state once the pipeline finished.
    pub(crate) async fn finish_job(&self, id: &JobId) {
        self.cancellations.lock().await.remove(id.as_str());
    }
}

fn build_voice_chain(config: &WorkerConfig) -> ProviderChain<dyn VoiceProvider> {
    let mut providers: Vec<Arc<dyn VoiceProvider>> = Vec::new();

    match ElevenLabsClient::from_env() {
        Ok(client) => providers.push(Arc::new(client)),
        Err(e) => debug!(error = %e, "ElevenLabs voice not registered"),
    }
    // Key-less fallback vendor, always available.
    providers.push(Arc::new(GoogleTranslateTts::default()));

    ProviderChain::new(providers)
        .with_preferred(config.preferred_voice.clone())
        .with_timeout_secs(config.provider_timeout.as_secs())
}

fn build_image_chain(config: &WorkerConfig) -> ProviderChain<dyn ImageProvider> {
    let mut providers: Vec<Arc<dyn ImageProvider>> = Vec::new();

    match PexelsClient::from_env() {
        Ok(client) => providers.push(Arc::new(client)),
        Err(e) => debug!(error = %e, "Pexels image search not registered"),
    }
    match PixabayClient::from_env() {
        Ok(client) => providers.push(Arc::new(client)),
        Err(e) => debug!(error = %e, "Pixabay image search not registered"),
    }

    ProviderChain::new(providers)
        .with_preferred(config.preferred_image.clone())
        .with_timeout_secs(config.provider_timeout.as_secs())
}

fn build_text_chain(config: &WorkerConfig) -> ProviderChain<dyn TextProvider> {
    let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();

    match OpenAiClient::from_env() {
        Ok(client) => providers.push(Arc::new(client)),
        Err(e) => debug!(error = %e, "OpenAI text not registered"),
    }
    match GeminiClient::from_env() {
        Ok(client) => providers.push(Arc::new(client)),
        Err(e) => debug!(error = %e, "Gemini text not registered"),
    }

    ProviderChain::new(providers)
        .with_preferred(config.preferred_text.clone())
        .with_timeout_secs(config.provider_timeout.as_secs())
}
