//! FFprobe audio duration probing.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Conservative duration assumed when probing fails.
///
/// Downstream stages degrade gracefully with a short clip rather than
/// aborting the whole render over an unreadable file.
pub const FALLBACK_DURATION_SECS: f64 = 10.0;

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe an audio file for its duration in seconds.
///
/// Never errors: any probe failure (tool missing, unreadable file,
/// malformed output) logs a warning and returns
/// [`FALLBACK_DURATION_SECS`].
pub async fn probe_duration(path: impl AsRef<Path>) -> f64 {
    let path = path.as_ref();
    match try_probe(path).await {
        Ok(duration) => duration,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "Audio probe failed, assuming {}s", FALLBACK_DURATION_SECS
            );
            FALLBACK_DURATION_SECS
        }
    }
}

async fn try_probe(path: &Path) -> MediaResult<f64> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| *d > 0.0)
        .ok_or_else(|| MediaError::FfprobeFailed {
            message: "No duration in probe output".to_string(),
            stderr: None,
        })
}
