//! Audio and text segment timelines.

use serde::{Deserialize, Serialize};

/// A contiguous interval of the narration audio.
///
/// Segment lists produced by the analyzer are ordered, non-overlapping,
/// and cover `[0, total_duration]` exactly: `end - start == duration` and
/// each segment's `end` equals the next segment's `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Whether the interval is below the silence threshold
    pub is_silent: bool,
}

impl AudioSegment {
    pub fn new(start: f64, end: f64, is_silent: bool) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            is_silent,
        }
    }
}

/// One narration chunk with an estimated speaking duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    /// Narration text
    pub text: String,
    /// Estimated speaking duration in seconds
    pub duration: f64,
    /// Whether the segment carries emphasis (exclamation, question,
    /// or an emphasis keyword)
    pub emphasis: bool,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, duration: f64, emphasis: bool) -> Self {
        Self {
            text: text.into(),
            duration,
            emphasis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_segment_duration() {
        let seg = AudioSegment::new(1.0, 4.0, false);
        assert!((seg.duration - 3.0).abs() < 1e-9);
        assert!(!seg.is_silent);
    }
}
