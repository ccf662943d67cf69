//! Silence detection via FFmpeg's `silencedetect` filter.
//!
//! The filter prints `silence_start` / `silence_end` markers on stderr;
//! parsing and timeline reconstruction are pure functions so they can be
//! tested against captured diagnostic text without an FFmpeg install.

use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use slidecast_models::AudioSegment;

use crate::command::{FfmpegCommand, FfmpegRunner};

/// Parameters for silence detection.
#[derive(Debug, Clone, Copy)]
pub struct SilenceParams {
    /// Loudness threshold in dB below which audio counts as silent.
    /// More negative values treat quieter sound as "not silence".
    pub threshold_db: f64,
    /// Minimum silence duration in seconds before an interval is reported.
    pub min_silence_secs: f64,
}

impl Default for SilenceParams {
    fn default() -> Self {
        Self {
            threshold_db: -30.0,
            min_silence_secs: 0.3,
        }
    }
}

/// Detect silence intervals and reconstruct the full segment timeline.
///
/// Any detection failure (tool missing, non-zero exit) degrades to a
/// single non-silent segment covering the whole duration; a render must
/// still proceed.
pub async fn detect_silence(
    audio: &Path,
    params: &SilenceParams,
    total_duration: f64,
    timeout_secs: u64,
) -> Vec<AudioSegment> {
    let filter = format!(
        "silencedetect=noise={}dB:d={}",
        params.threshold_db, params.min_silence_secs
    );

    // Null muxer: we only want the diagnostic stream.
    let cmd = FfmpegCommand::new("-")
        .input(audio)
        .log_level("info")
        .output_arg("-af")
        .output_arg(filter)
        .output_arg("-f")
        .output_arg("null");

    let runner = FfmpegRunner::new().with_timeout(timeout_secs);

    match runner.run(&cmd).await {
        Ok(stderr) => {
            let intervals = parse_silence_intervals(&stderr, total_duration);
            debug!(
                path = %audio.display(),
                intervals = intervals.len(),
                "Silence detection complete"
            );
            build_segments(&intervals, total_duration)
        }
        Err(e) => {
            warn!(
                path = %audio.display(),
                error = %e,
                "Silence detection failed, treating audio as one segment"
            );
            vec![AudioSegment::new(0.0, total_duration, false)]
        }
    }
}

/// Parse `silence_start` / `silence_end` markers from FFmpeg's diagnostic
/// stream into ordered `(start, end)` pairs.
///
/// Malformed lines are skipped rather than aborting the scan; a trailing
/// `silence_start` without a matching end closes at `total_duration`.
pub fn parse_silence_intervals(log: &str, total_duration: f64) -> Vec<(f64, f64)> {
    // Unwraps are safe: the patterns are literals.
    let start_re = Regex::new(r"silence_start:\s*(-?[0-9]+(?:\.[0-9]+)?)").unwrap();
    let end_re = Regex::new(r"silence_end:\s*(-?[0-9]+(?:\.[0-9]+)?)").unwrap();

    let mut intervals = Vec::new();
    let mut pending_start: Option<f64> = None;

    for line in log.lines() {
        if let Some(caps) = start_re.captures(line) {
            if let Ok(start) = caps[1].parse::<f64>() {
                pending_start = Some(start.max(0.0));
            }
            continue;
        }
        if let Some(caps) = end_re.captures(line) {
            let Ok(end) = caps[1].parse::<f64>() else {
                continue;
            };
            // An end without a start means we lost the start marker;
            // drop the interval instead of guessing.
            if let Some(start) = pending_start.take() {
                if end > start {
                    intervals.push((start, end.min(total_duration)));
                }
            }
        }
    }

    if let Some(start) = pending_start {
        // Silence runs to the end of the file.
        if total_duration > start {
            intervals.push((start, total_duration));
        }
    }

    intervals
}

/// Reconstruct the contiguous segment timeline from silence intervals.
///
/// Gaps between silence intervals become non-silent segments. Handles
/// silence starting at 0, audio starting non-silent, and a trailing
/// non-silent tail after the last silence.
pub fn build_segments(intervals: &[(f64, f64)], total_duration: f64) -> Vec<AudioSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0.0f64;

    for &(start, end) in intervals {
        if start > cursor {
            segments.push(AudioSegment::new(cursor, start, false));
        }
        segments.push(AudioSegment::new(start.max(cursor), end, true));
        cursor = end;
    }

    if cursor < total_duration {
        segments.push(AudioSegment::new(cursor, total_duration, false));
    }

    if segments.is_empty() {
        segments.push(AudioSegment::new(0.0, total_duration, false));
    }

    segments
}
