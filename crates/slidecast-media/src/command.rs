//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
///
/// Unlike a plain arg list this keeps per-input arguments attached to
/// their input, which the concat demuxer and `-loop 1` still-image
/// composition both need.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs as (args-before-`-i`, path) pairs, in order
    inputs: Vec<(Vec<String>, PathBuf)>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the inputs)
    output_args: Vec<String>,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command with the given output path.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    /// Add an input file.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(Vec::<String>::new(), path)
    }

    /// Add an input file with arguments placed before its `-i`.
    pub fn input_with_args<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push((
            args.into_iter().map(Into::into).collect(),
            path.as_ref().to_path_buf(),
        ));
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            self.log_level.clone(),
        ];

        for (input_args, path) in &self.inputs {
            args.extend(input_args.clone());
            args.push("-i".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with timeout and cancellation.
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command, returning the collected diagnostic stream.
    ///
    /// FFmpeg writes its filter diagnostics (including `silencedetect`
    /// markers) to stderr; callers that need them parse the returned text.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<String> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take();
        let collector = tokio::spawn(async move {
            let mut collected = String::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    collected.push_str(&line);
                    collected.push('\n');
                }
            }
            collected
        });

        // The deadline future is built unconditionally; without a
        // configured timeout the guard below keeps it from ever firing.
        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(24 * 60 * 60));
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut cancel_rx = self.cancel_rx.clone();

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                _ = &mut deadline, if self.timeout_secs.is_some() => {
                    warn!(
                        "FFmpeg timed out after {} seconds, killing process",
                        self.timeout_secs.unwrap_or_default()
                    );
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(self.timeout_secs.unwrap_or_default()));
                }
                changed = async {
                    match cancel_rx.as_mut() {
                        Some(rx) => rx.changed().await.is_ok() && *rx.borrow(),
                        None => std::future::pending().await,
                    }
                } => {
                    if changed {
                        info!("FFmpeg cancelled, killing process");
                        let _ = child.kill().await;
                        return Err(MediaError::Cancelled);
                    }
                }
            }
        };

        let stderr_text = collector.await.unwrap_or_default();

        if status.success() {
            Ok(stderr_text)
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(tail(&stderr_text, 2048)),
                status.code(),
            ))
        }
    }
}

/// Last `limit` bytes of a diagnostic stream, for error payloads.
fn tail(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let start = text.len() - limit;
    let boundary = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= start)
        .unwrap_or(start);
    text[boundary..].to_string()
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_input_order() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input_with_args(["-f", "concat", "-safe", "0"], "list.txt")
            .input("audio.mp3")
            .video_codec("libx264")
            .output_arg("-shortest");

        let args = cmd.build_args();
        let concat_pos = args.iter().position(|a| a == "concat").unwrap();
        let list_pos = args.iter().position(|a| a == "list.txt").unwrap();
        let audio_pos = args.iter().position(|a| a == "audio.mp3").unwrap();
        assert!(concat_pos < list_pos);
        assert!(list_pos < audio_pos);
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn test_command_builder_log_level() {
        let args = FfmpegCommand::new("-").log_level("info").build_args();
        let v_pos = args.iter().position(|a| a == "-v").unwrap();
        assert_eq!(args[v_pos + 1], "info");
    }

    #[test]
    fn test_tail_respects_char_boundaries() {
        let text = "ααααα";
        let tailed = tail(text, 4);
        assert!(tailed.len() <= 4);
        assert!(tailed.chars().all(|c| c == 'α'));
    }
}
