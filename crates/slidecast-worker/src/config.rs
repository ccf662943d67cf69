//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent render jobs
    pub max_concurrent_jobs: usize,
    /// Timeout for one composition invocation
    pub render_timeout: Duration,
    /// Timeout for one provider call
    pub provider_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Directory for finished videos
    pub output_dir: PathBuf,
    /// Keep per-job scratch directories for debugging
    pub keep_temp: bool,
    /// Preferred voice provider name
    pub preferred_voice: Option<String>,
    /// Preferred image provider name
    pub preferred_image: Option<String>,
    /// Preferred text provider name
    pub preferred_text: Option<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            render_timeout: Duration::from_secs(120),
            provider_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("./output"),
            keep_temp: false,
            preferred_voice: None,
            preferred_image: None,
            preferred_text: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("SLIDECAST_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            render_timeout: Duration::from_secs(
                std::env::var("SLIDECAST_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            provider_timeout: Duration::from_secs(
                std::env::var("SLIDECAST_PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("SLIDECAST_SHUTDOWN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            output_dir: std::env::var("SLIDECAST_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./output")),
            keep_temp: std::env::var("SLIDECAST_KEEP_TEMP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            preferred_voice: std::env::var("SLIDECAST_PREFERRED_VOICE").ok(),
            preferred_image: std::env::var("SLIDECAST_PREFERRED_IMAGE").ok(),
            preferred_text: std::env::var("SLIDECAST_PREFERRED_TEXT").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 2);
        assert_eq!(config.render_timeout, Duration::from_secs(120));
        assert!(!config.keep_temp);
        assert!(config.preferred_voice.is_none());
    }
}
