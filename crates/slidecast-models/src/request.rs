//! Render request and option types accepted from the routing layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised when validating an incoming request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Script must not be empty")]
    EmptyScript,

    #[error("Invalid custom image URL: {0}")]
    InvalidImageUrl(String),
}

/// Target output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Resolution {
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    #[default]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub fn width(&self) -> u32 {
        match self {
            Resolution::P480 => 854,
            Resolution::P720 => 1280,
            Resolution::P1080 => 1920,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Resolution::P480 => 480,
            Resolution::P720 => 720,
            Resolution::P1080 => 1080,
        }
    }
}

/// Options controlling one render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Voice profile name passed to the voice provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Narration speed multiplier (1.0 = natural)
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Topic used for image search when no custom images are given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Derive scene cuts from silence analysis of the narration
    #[serde(default = "default_detect_silence")]
    pub detect_silence: bool,
    /// Requested transitions (currently fade in/out)
    #[serde(default)]
    pub transitions: Vec<String>,
    /// Output resolution
    #[serde(default)]
    pub resolution: Resolution,
    /// Explicit image URLs supplied by the caller
    #[serde(default)]
    pub custom_images: Vec<String>,
}

fn default_speed() -> f32 {
    1.0
}

fn default_detect_silence() -> bool {
    true
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            voice: None,
            speed: default_speed(),
            topic: None,
            detect_silence: default_detect_silence(),
            transitions: Vec::new(),
            resolution: Resolution::default(),
            custom_images: Vec::new(),
        }
    }
}

/// One end-to-end request to turn a script into a finished video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Narration script text
    pub script: String,
    /// Render options
    #[serde(default)]
    pub options: RenderOptions,
}

impl RenderRequest {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            options: RenderOptions::default(),
        }
    }

    /// Validate the request before it is accepted into the queue.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.script.trim().is_empty() {
            return Err(RequestError::EmptyScript);
        }
        for raw in &self.options.custom_images {
            Url::parse(raw).map_err(|_| RequestError::InvalidImageUrl(raw.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_dimensions() {
        assert_eq!(Resolution::P480.height(), 480);
        assert_eq!(Resolution::P720.width(), 1280);
        assert_eq!(Resolution::P1080.width(), 1920);
    }

    #[test]
    fn test_resolution_serde_names() {
        let json = serde_json::to_string(&Resolution::P720).unwrap();
        assert_eq!(json, "\"720p\"");
        let back: Resolution = serde_json::from_str("\"1080p\"").unwrap();
        assert_eq!(back, Resolution::P1080);
    }

    #[test]
    fn test_validate_rejects_empty_script() {
        let req = RenderRequest::new("   ");
        assert!(matches!(req.validate(), Err(RequestError::EmptyScript)));
    }

    #[test]
    fn test_validate_rejects_bad_image_url() {
        let mut req = RenderRequest::new("A short script.");
        req.options.custom_images = vec!["not a url".to_string()];
        assert!(matches!(
            req.validate(),
            Err(RequestError::InvalidImageUrl(_))
        ));
    }

    #[test]
    fn test_request_defaults() {
        let req: RenderRequest = serde_json::from_str(r#"{"script":"hello"}"#).unwrap();
        assert!(req.options.detect_silence);
        assert!((req.options.speed - 1.0).abs() < f32::EPSILON);
        assert_eq!(req.options.resolution, Resolution::P720);
    }
}
