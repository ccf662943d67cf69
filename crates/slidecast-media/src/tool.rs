//! The narrow external-tool interface.
//!
//! Process invocation and diagnostic-stream scraping hide behind
//! [`MediaTool`] so the pipeline can swap the whole unit out in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::warn;

use slidecast_models::AudioSegment;

use crate::command::{check_ffmpeg, check_ffprobe};
use crate::compose::{render_composite, CompositeSpec};
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::silence::{detect_silence, SilenceParams};

/// External media tool capabilities consumed by the pipeline.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Probe an audio file's duration, falling back to a conservative
    /// default on failure.
    async fn probe_duration(&self, audio: &Path) -> f64;

    /// Detect silence intervals and return the full segment timeline.
    async fn detect_silence(
        &self,
        audio: &Path,
        params: &SilenceParams,
        total_duration: f64,
    ) -> Vec<AudioSegment>;

    /// Render the slideshow composition (with degraded fallback inside).
    async fn render_composite(
        &self,
        spec: &CompositeSpec,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<PathBuf>;
}

/// FFmpeg-backed implementation of [`MediaTool`].
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    /// Timeout for analysis calls (probe, silence detection)
    analysis_timeout_secs: u64,
    /// Timeout for render calls
    render_timeout_secs: u64,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTool {
    pub fn new() -> Self {
        if check_ffmpeg().is_err() || check_ffprobe().is_err() {
            // Startup can proceed; every call degrades per its own policy.
            warn!("ffmpeg/ffprobe not found in PATH, renders will degrade");
        }
        Self {
            analysis_timeout_secs: 30,
            render_timeout_secs: 120,
        }
    }

    pub fn with_render_timeout(mut self, secs: u64) -> Self {
        self.render_timeout_secs = secs;
        self
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_duration(&self, audio: &Path) -> f64 {
        probe_duration(audio).await
    }

    async fn detect_silence(
        &self,
        audio: &Path,
        params: &SilenceParams,
        total_duration: f64,
    ) -> Vec<AudioSegment> {
        detect_silence(audio, params, total_duration, self.analysis_timeout_secs).await
    }

    async fn render_composite(
        &self,
        spec: &CompositeSpec,
        cancel: Option<watch::Receiver<bool>>,
    ) -> MediaResult<PathBuf> {
        render_composite(spec, self.render_timeout_secs, cancel).await
    }
}
