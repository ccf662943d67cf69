//! Slideshow composition via the concat demuxer.

use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn};

use slidecast_models::Resolution;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Smallest output size accepted as a playable video.
pub const MIN_OUTPUT_BYTES: u64 = 1000;

/// Fade transition length in seconds.
const FADE_SECS: f64 = 0.5;

/// Everything the compositor needs for one render.
#[derive(Debug, Clone)]
pub struct CompositeSpec {
    /// Ordered image files
    pub images: Vec<PathBuf>,
    /// Display duration per image, aligned with `images`
    pub durations: Vec<f64>,
    /// Narration audio file
    pub audio: PathBuf,
    /// Optional SRT caption track
    pub subtitles: Option<PathBuf>,
    /// Apply fade-in/fade-out transitions
    pub fade: bool,
    /// Target resolution
    pub resolution: Resolution,
    /// Output video path
    pub output: PathBuf,
}

/// Render the slideshow, falling back to a degraded single-image
/// composition when the primary invocation fails.
///
/// The returned path has passed the output verification check; a
/// verification failure is the one render error with no further fallback
/// below it.
pub async fn render_composite(
    spec: &CompositeSpec,
    timeout_secs: u64,
    cancel: Option<watch::Receiver<bool>>,
) -> MediaResult<PathBuf> {
    let manifest = spec.output.with_extension("concat.txt");
    write_concat_manifest(&manifest, &spec.images, &spec.durations).await?;

    let mut runner = FfmpegRunner::new().with_timeout(timeout_secs);
    if let Some(rx) = cancel.clone() {
        runner = runner.with_cancel(rx);
    }

    metrics::counter!("slidecast_renders_total").increment(1);

    match runner.run(&primary_command(spec, &manifest)).await {
        Ok(stderr) => {
            verify_output(&spec.output, &stderr).await?;
            Ok(spec.output.clone())
        }
        Err(MediaError::Cancelled) => Err(MediaError::Cancelled),
        Err(primary_err) => {
            warn!(
                error = %primary_err,
                "Primary composition failed, retrying with single-image fallback"
            );
            metrics::counter!("slidecast_renders_degraded_total").increment(1);

            let mut degraded_runner = FfmpegRunner::new().with_timeout(timeout_secs);
            if let Some(rx) = cancel {
                degraded_runner = degraded_runner.with_cancel(rx);
            }

            let stderr = degraded_runner.run(&degraded_command(spec)?).await?;
            verify_output(&spec.output, &stderr).await?;
            info!(output = %spec.output.display(), "Degraded composition succeeded");
            Ok(spec.output.clone())
        }
    }
}

/// Write a concat-demuxer manifest: one `file`/`duration` pair per image,
/// with the last file repeated without a duration as the demuxer requires.
pub async fn write_concat_manifest(
    path: &Path,
    images: &[PathBuf],
    durations: &[f64],
) -> MediaResult<()> {
    if images.is_empty() || images.len() != durations.len() {
        return Err(MediaError::ffmpeg_failed(
            format!(
                "Concat manifest needs matching images and durations, got {} and {}",
                images.len(),
                durations.len()
            ),
            None,
            None,
        ));
    }

    let mut manifest = String::from("ffconcat version 1.0\n");
    for (image, duration) in images.iter().zip(durations) {
        manifest.push_str(&format!(
            "file '{}'\nduration {:.3}\n",
            image.display(),
            duration
        ));
    }
    // Repeat the final frame so the demuxer holds it to the end.
    if let Some(last) = images.last() {
        manifest.push_str(&format!("file '{}'\n", last.display()));
    }

    tokio::fs::write(path, manifest).await?;
    Ok(())
}

fn primary_command(spec: &CompositeSpec, manifest: &Path) -> FfmpegCommand {
    let total: f64 = spec.durations.iter().sum();

    let mut filters = vec![scale_filter(spec.resolution)];
    if let Some(srt) = &spec.subtitles {
        filters.push(format!("subtitles={}", srt.display()));
    }
    if spec.fade {
        filters.push(format!("fade=t=in:st=0:d={FADE_SECS}"));
        let fade_out_start = (total - FADE_SECS).max(0.0);
        filters.push(format!("fade=t=out:st={fade_out_start:.3}:d={FADE_SECS}"));
    }
    filters.push("format=yuv420p".to_string());

    FfmpegCommand::new(&spec.output)
        .input_with_args(["-f", "concat", "-safe", "0"], manifest)
        .input(&spec.audio)
        .video_filter(filters.join(","))
        .video_codec("libx264")
        .output_args(["-preset", "medium", "-crf", "23"])
        .audio_codec("aac")
        .output_args(["-b:a", "128k"])
        .output_arg("-shortest")
}

fn degraded_command(spec: &CompositeSpec) -> MediaResult<FfmpegCommand> {
    let first_image = spec
        .images
        .first()
        .ok_or_else(|| MediaError::ffmpeg_failed("No images to compose", None, None))?;

    Ok(FfmpegCommand::new(&spec.output)
        .input_with_args(["-loop", "1"], first_image)
        .input(&spec.audio)
        .video_filter(format!("{},format=yuv420p", scale_filter(spec.resolution)))
        .video_codec("libx264")
        .output_args(["-tune", "stillimage"])
        .audio_codec("aac")
        .output_arg("-shortest"))
}

fn scale_filter(resolution: Resolution) -> String {
    let (w, h) = (resolution.width(), resolution.height());
    format!("scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2")
}

/// Post-condition check: the output must exist and exceed the sanity
/// threshold, else the render is treated as failed.
async fn verify_output(path: &Path, stderr: &str) -> MediaResult<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|_| {
        MediaError::verification_failed(path, "output file missing", Some(stderr.to_string()))
    })?;

    if metadata.len() <= MIN_OUTPUT_BYTES {
        return Err(MediaError::verification_failed(
            path,
            format!(
                "output is {} bytes, below the {} byte minimum",
                metadata.len(),
                MIN_OUTPUT_BYTES
            ),
            Some(stderr.to_string()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_format() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("list.txt");
        let images = vec![PathBuf::from("/tmp/a.png"), PathBuf::from("/tmp/b.png")];

        write_concat_manifest(&manifest, &images, &[2.5, 4.0])
            .await
            .unwrap();

        let text = tokio::fs::read_to_string(&manifest).await.unwrap();
        let expected = "ffconcat version 1.0\n\
                        file '/tmp/a.png'\nduration 2.500\n\
                        file '/tmp/b.png'\nduration 4.000\n\
                        file '/tmp/b.png'\n";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_manifest_rejects_mismatched_lengths() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("list.txt");
        let images = vec![PathBuf::from("/tmp/a.png")];
        let result = write_concat_manifest(&manifest, &images, &[1.0, 2.0]).await;
        assert!(result.is_err());
    }

    fn sample_spec(dir: &Path) -> CompositeSpec {
        CompositeSpec {
            images: vec![dir.join("a.png"), dir.join("b.png")],
            durations: vec![3.0, 3.5],
            audio: dir.join("voice.mp3"),
            subtitles: Some(dir.join("subs.srt")),
            fade: true,
            resolution: Resolution::P720,
            output: dir.join("out.mp4"),
        }
    }

    #[test]
    fn test_primary_command_filter_graph() {
        let dir = PathBuf::from("/work");
        let cmd = primary_command(&sample_spec(&dir), &dir.join("list.txt"));
        let args = cmd.build_args();
        let vf = args
            .iter()
            .position(|a| a == "-vf")
            .map(|i| args[i + 1].clone())
            .unwrap();

        assert!(vf.contains("scale=1280:720"));
        assert!(vf.contains("subtitles=/work/subs.srt"));
        assert!(vf.contains("fade=t=in:st=0"));
        assert!(vf.contains("fade=t=out:st=6.000"));
        assert!(vf.ends_with("format=yuv420p"));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_degraded_command_loops_first_image() {
        let dir = PathBuf::from("/work");
        let cmd = degraded_command(&sample_spec(&dir)).unwrap();
        let args = cmd.build_args();

        assert!(args.contains(&"-loop".to_string()));
        assert!(args.contains(&"/work/a.png".to_string()));
        // No captions and no fades in the last-resort path.
        let vf = args
            .iter()
            .position(|a| a == "-vf")
            .map(|i| args[i + 1].clone())
            .unwrap();
        assert!(!vf.contains("subtitles"));
        assert!(!vf.contains("fade"));
    }

    #[tokio::test]
    async fn test_verify_rejects_small_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.mp4");
        tokio::fs::write(&path, b"stub").await.unwrap();

        let err = verify_output(&path, "diagnostics").await.unwrap_err();
        assert!(matches!(err, MediaError::RenderVerificationFailed { .. }));
    }

    #[tokio::test]
    async fn test_verify_accepts_reasonable_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ok.mp4");
        tokio::fs::write(&path, vec![0u8; 4096]).await.unwrap();

        verify_output(&path, "").await.unwrap();
    }
}
