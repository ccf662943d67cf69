//! Script segmentation and speaking-duration estimation.

use slidecast_models::TextSegment;

/// Tuning knobs for the duration heuristic.
#[derive(Debug, Clone)]
pub struct ScriptParams {
    /// Fixed overhead per segment in seconds
    pub base_secs: f64,
    /// Added seconds per word
    pub per_word_secs: f64,
    /// Lower bound on any segment's duration
    pub min_segment_secs: f64,
    /// Multiplier applied to emphasized segments
    pub emphasis_boost: f64,
}

impl Default for ScriptParams {
    fn default() -> Self {
        Self {
            base_secs: 1.0,
            per_word_secs: 0.4,
            min_segment_secs: 2.0,
            emphasis_boost: 1.2,
        }
    }
}

/// Keywords that mark a sentence as emphasized even without terminal
/// punctuation.
const EMPHASIS_KEYWORDS: &[&str] = &["amazing", "incredible", "important", "must", "best", "now"];

/// Split a script into sentences and estimate a speaking duration for each.
///
/// Sentences end on `.`, `!` or `?`; the terminal punctuation stays with
/// the sentence so emphasis detection can see it. Whitespace-only chunks
/// are dropped. A script with no terminal punctuation yields one segment.
pub fn segment_script(script: &str, params: &ScriptParams) -> Vec<TextSegment> {
    split_sentences(script)
        .into_iter()
        .map(|sentence| {
            let emphasis = detect_emphasis(&sentence);
            let duration = estimate_duration(&sentence, emphasis, params);
            TextSegment::new(sentence, duration, emphasis)
        })
        .collect()
}

/// Duration heuristic: baseline plus per-word weighting, floored, with a
/// boost for emphasized sentences.
pub fn estimate_duration(text: &str, emphasis: bool, params: &ScriptParams) -> f64 {
    let words = text.split_whitespace().count() as f64;
    let mut secs = (params.base_secs + words * params.per_word_secs).max(params.min_segment_secs);
    if emphasis {
        secs *= params.emphasis_boost;
    }
    secs
}

fn detect_emphasis(sentence: &str) -> bool {
    let trimmed = sentence.trim_end();
    if trimmed.ends_with('!') || trimmed.ends_with('?') {
        return true;
    }
    let lower = sentence.to_lowercase();
    EMPHASIS_KEYWORDS
        .iter()
        .any(|kw| lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *kw))
}

fn split_sentences(script: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in script.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_terminal_punctuation() {
        let segs = segment_script("First part. Second part! Third?", &ScriptParams::default());
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].text, "First part.");
        assert_eq!(segs[1].text, "Second part!");
        assert_eq!(segs[2].text, "Third?");
    }

    #[test]
    fn test_exclamation_marks_emphasis() {
        let segs = segment_script("Plain sentence. Buy it today!", &ScriptParams::default());
        assert!(!segs[0].emphasis);
        assert!(segs[1].emphasis);
    }

    #[test]
    fn test_keyword_marks_emphasis() {
        let segs = segment_script("This tool is amazing.", &ScriptParams::default());
        assert!(segs[0].emphasis);
    }

    #[test]
    fn test_duration_floor() {
        let params = ScriptParams::default();
        let segs = segment_script("Hi.", &params);
        assert!(segs[0].duration >= params.min_segment_secs);
    }

    #[test]
    fn test_emphasis_boost_applied() {
        let params = ScriptParams::default();
        let plain = estimate_duration("one two three four five six", false, &params);
        let boosted = estimate_duration("one two three four five six", true, &params);
        assert!((boosted - plain * params.emphasis_boost).abs() < 1e-9);
    }

    #[test]
    fn test_unterminated_script_yields_one_segment() {
        let segs = segment_script("no punctuation here", &ScriptParams::default());
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn test_durations_never_negative() {
        for text in ["", ".", "a.", "word word word."] {
            for seg in segment_script(text, &ScriptParams::default()) {
                assert!(seg.duration > 0.0);
            }
        }
    }
}
