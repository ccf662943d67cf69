//! The end-to-end render pipeline.
//!
//! Stage order: script segmentation → voice acquisition → audio
//! analysis → image resolution → duration allocation → subtitle build →
//! composition → finalization. Each boundary reports a fixed progress
//! milestone and checks the cancellation flag.

use std::path::PathBuf;
use tokio::sync::watch;

use slidecast_media::{move_file, CompositeSpec, SilenceParams};
use slidecast_models::{
    AttemptOutcome, Capability, ProviderAttempt, RenderResult, TextSegment,
};
use slidecast_providers::{derive_keywords, resolve_images, ImageSpec};
use slidecast_timeline::{
    allocate_from_cuts, allocate_from_segments, build_srt, generate_cut_points, segment_script,
    ScriptParams, DEFAULT_MIN_SEGMENT_SECS,
};

use crate::context::{PipelineContext, QueuedJob};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Fixed progress milestones reported at stage boundaries.
pub const PROGRESS_ACCEPTED: u8 = 10;
pub const PROGRESS_AUDIO: u8 = 30;
pub const PROGRESS_IMAGES: u8 = 50;
pub const PROGRESS_COMPOSING: u8 = 70;
pub const PROGRESS_FINALIZING: u8 = 90;

/// Run one job to a terminal state, recording the outcome in the tracker.
pub async fn process_job(ctx: &PipelineContext, job: QueuedJob) {
    let id = job.id.clone();
    let logger = JobLogger::new(&id, "pipeline");

    ctx.tracker.start(&id).await;
    ctx.tracker
        .update(&id, PROGRESS_ACCEPTED, "Request accepted")
        .await;

    match run_stages(ctx, &job, &logger).await {
        Ok(result) => {
            metrics::counter!("slidecast_jobs_completed_total").increment(1);
            logger.info(&format!(
                "Render complete: {} ({} bytes)",
                result.file_name, result.size_bytes
            ));
            ctx.tracker.complete(&id, result).await;
        }
        Err(e) => {
            metrics::counter!("slidecast_jobs_failed_total").increment(1);
            logger.error(&format!("Render failed: {e}"));
            ctx.tracker.fail(&id, e.user_message()).await;
        }
    }
}

async fn run_stages(
    ctx: &PipelineContext,
    job: &QueuedJob,
    logger: &JobLogger,
) -> WorkerResult<RenderResult> {
    let id = &job.id;
    let options = &job.request.options;
    let mut attempts: Vec<ProviderAttempt> = Vec::new();

    // Scratch space is namespaced by job ID so concurrent jobs never
    // collide on file paths.
    let scratch = tempfile::Builder::new()
        .prefix(&format!("slidecast-{id}-"))
        .tempdir()?;

    ensure_active(&job.cancel)?;

    // Script segmentation
    let segments = segment_script(&job.request.script, &ScriptParams::default());
    if segments.is_empty() {
        return Err(WorkerError::job_failed("Script has no narratable content"));
    }
    logger.info(&format!("Script split into {} segments", segments.len()));

    // Voice acquisition through the fallback chain
    let audio_bytes = ctx
        .voice
        .synthesize_with_fallback(
            &job.request.script,
            options.voice.as_deref(),
            options.speed,
            &ctx.offline,
            &mut attempts,
        )
        .await;

    // The offline tone is WAV; every vendor returns MP3.
    let voice_is_demo = last_success(&attempts, Capability::Voice) == Some("offline");
    let audio_name = if voice_is_demo {
        "narration.wav"
    } else {
        "narration.mp3"
    };
    let audio_path = scratch.path().join(audio_name);
    tokio::fs::write(&audio_path, &audio_bytes).await?;

    ensure_active(&job.cancel)?;
    ctx.tracker
        .update(id, PROGRESS_AUDIO, "Narration audio acquired")
        .await;

    // Audio analysis
    let total_duration = ctx.media.probe_duration(&audio_path).await;
    let cut_points = if options.detect_silence {
        let audio_segments = ctx
            .media
            .detect_silence(&audio_path, &SilenceParams::default(), total_duration)
            .await;
        generate_cut_points(&audio_segments, DEFAULT_MIN_SEGMENT_SECS)
    } else {
        vec![0.0]
    };
    logger.info(&format!(
        "Audio spans {total_duration:.2}s with {} cut points",
        cut_points.len()
    ));

    ensure_active(&job.cancel)?;

    // Image resolution
    let keywords = if options.custom_images.is_empty() {
        derive_keywords(
            options.topic.as_deref(),
            &segments,
            &ctx.text,
            &ctx.offline,
            &mut attempts,
        )
        .await
    } else {
        Vec::new()
    };

    let image_spec = ImageSpec {
        explicit_urls: options.custom_images.clone(),
        keywords,
        count: ImageSpec::default_count(segments.len()),
    };
    let images = resolve_images(
        &ctx.http,
        &ctx.images,
        &ctx.offline,
        &image_spec,
        scratch.path(),
        &mut attempts,
    )
    .await
    .map_err(|e| WorkerError::ImageAcquisitionFailed(e.to_string()))?;

    ensure_active(&job.cancel)?;
    ctx.tracker
        .update(
            id,
            PROGRESS_IMAGES,
            format!("Resolved {} images", images.len()),
        )
        .await;

    // Duration allocation
    let durations = if options.detect_silence {
        allocate_from_cuts(&cut_points, images.len(), total_duration)
    } else {
        allocate_from_segments(&segments, images.len())
    }
    .map_err(|e| WorkerError::job_failed(e.to_string()))?;

    // Subtitle track
    let subtitles = write_subtitles(scratch.path(), &segments).await?;

    // Composition
    ensure_active(&job.cancel)?;
    ctx.tracker
        .update(id, PROGRESS_COMPOSING, "Composing video")
        .await;

    let spec = CompositeSpec {
        images: images.iter().map(|i| i.local_path.clone()).collect(),
        durations,
        audio: audio_path,
        subtitles,
        fade: wants_fade(&options.transitions),
        resolution: options.resolution,
        output: scratch.path().join("render.mp4"),
    };
    let rendered = ctx
        .media
        .render_composite(&spec, Some(job.cancel.clone()))
        .await?;

    // Finalization
    ensure_active(&job.cancel)?;
    let finalize_note = if attempts
        .iter()
        .any(|a| a.provider == "offline" && a.outcome == AttemptOutcome::Success)
    {
        "Finalizing (demo assets substituted for unavailable providers)"
    } else {
        "Finalizing"
    };
    ctx.tracker
        .update(id, PROGRESS_FINALIZING, finalize_note)
        .await;

    let file_name = format!("slidecast_{id}.mp4");
    let final_path = ctx.config.output_dir.join(&file_name);
    move_file(&rendered, &final_path).await?;
    let size_bytes = tokio::fs::metadata(&final_path).await?.len();

    if ctx.config.keep_temp {
        let kept = scratch.keep();
        logger.info(&format!("Keeping scratch directory {}", kept.display()));
    }

    Ok(RenderResult {
        video_path: final_path,
        file_name,
        size_bytes,
        duration_secs: total_duration,
    })
}

/// Write the SRT track unless every caption stripped to nothing.
async fn write_subtitles(
    scratch: &std::path::Path,
    segments: &[TextSegment],
) -> WorkerResult<Option<PathBuf>> {
    let srt = build_srt(segments);
    if srt.is_empty() {
        return Ok(None);
    }
    let path = scratch.join("captions.srt");
    tokio::fs::write(&path, srt).await?;
    Ok(Some(path))
}

/// Fades apply by default; an explicit transition list opts in per name.
fn wants_fade(transitions: &[String]) -> bool {
    transitions.is_empty() || transitions.iter().any(|t| t == "fade")
}

fn last_success(attempts: &[ProviderAttempt], kind: Capability) -> Option<&str> {
    attempts
        .iter()
        .rev()
        .find(|a| a.kind == kind && a.outcome == AttemptOutcome::Success)
        .map(|a| a.provider.as_str())
}

/// Between-stage cancellation check.
fn ensure_active(cancel: &watch::Receiver<bool>) -> WorkerResult<()> {
    if *cancel.borrow() {
        return Err(WorkerError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_fade() {
        assert!(wants_fade(&[]));
        assert!(wants_fade(&["fade".to_string()]));
        assert!(!wants_fade(&["wipe".to_string()]));
    }

    #[test]
    fn test_last_success_picks_most_recent() {
        let attempts = vec![
            ProviderAttempt::failure(Capability::Voice, "elevenlabs", "down"),
            ProviderAttempt::success(Capability::Voice, "offline"),
            ProviderAttempt::success(Capability::Text, "openai"),
        ];
        assert_eq!(last_success(&attempts, Capability::Voice), Some("offline"));
        assert_eq!(last_success(&attempts, Capability::Text), Some("openai"));
        assert_eq!(last_success(&attempts, Capability::Image), None);
    }

    #[test]
    fn test_milestones_are_increasing() {
        let milestones = [
            PROGRESS_ACCEPTED,
            PROGRESS_AUDIO,
            PROGRESS_IMAGES,
            PROGRESS_COMPOSING,
            PROGRESS_FINALIZING,
        ];
        for pair in milestones.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }
}
