//! SRT subtitle track building.

use slidecast_models::TextSegment;

/// Build an SRT caption track from ordered text segments.
///
/// Entries are consecutive and non-overlapping, starting at
/// `00:00:00,000`, one entry per segment with its estimated duration.
/// Markdown and bracket artifacts left over from AI-generated scripts
/// are stripped before emission.
pub fn build_srt(segments: &[TextSegment]) -> String {
    let mut out = String::new();
    let mut clock = 0.0f64;

    let mut index = 1usize;
    for segment in segments {
        let text = clean_caption(&segment.text);
        if text.is_empty() {
            clock += segment.duration;
            continue;
        }

        let start = clock;
        let end = clock + segment.duration;
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index,
            format_timestamp(start),
            format_timestamp(end),
            text
        ));
        clock = end;
        index += 1;
    }

    out
}

/// Format seconds as `HH:MM:SS,mmm`.
fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Strip markdown tokens and bracketed stage directions from caption text.
fn clean_caption(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut in_bracket = false;

    for ch in text.chars() {
        match ch {
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            '*' | '`' | '#' if !in_bracket => {}
            _ if in_bracket => {}
            _ => cleaned.push(ch),
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, duration: f64) -> TextSegment {
        TextSegment::new(text, duration, false)
    }

    #[test]
    fn test_timestamp_format() {
        assert_eq!(format_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_timestamp(1.5), "00:00:01,500");
        assert_eq!(format_timestamp(61.025), "00:01:01,025");
        assert_eq!(format_timestamp(3661.0), "01:01:01,000");
    }

    #[test]
    fn test_entries_are_consecutive() {
        let srt = build_srt(&[seg("First.", 2.0), seg("Second.", 3.5)]);
        let expected = "1\n00:00:00,000 --> 00:00:02,000\nFirst.\n\n\
                        2\n00:00:02,000 --> 00:00:05,500\nSecond.\n\n";
        assert_eq!(srt, expected);
    }

    #[test]
    fn test_markdown_stripped() {
        let srt = build_srt(&[seg("**Bold** and `code` and # heading", 2.0)]);
        assert!(srt.contains("Bold and code and heading"));
        assert!(!srt.contains('*'));
        assert!(!srt.contains('`'));
        assert!(!srt.contains('#'));
    }

    #[test]
    fn test_bracketed_directions_removed() {
        let srt = build_srt(&[seg("Welcome [pause] to the show.", 2.0)]);
        assert!(srt.contains("Welcome to the show."));
        assert!(!srt.contains('['));
    }

    #[test]
    fn test_empty_caption_still_advances_clock() {
        let srt = build_srt(&[seg("[music]", 2.0), seg("Hello.", 1.0)]);
        // The bracket-only segment is dropped but its time still passes.
        assert!(srt.starts_with("1\n00:00:02,000 --> 00:00:03,000\nHello."));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(build_srt(&[]), "");
    }
}
