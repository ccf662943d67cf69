//! Scene cut-point derivation from silence-analysis segments.

use slidecast_models::AudioSegment;

/// Minimum duration a non-silent segment must have to open a new scene.
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 1.0;

/// Derive scene-cut timestamps from an analyzed segment timeline.
///
/// Keeps non-silent segments of at least `min_segment` seconds and takes
/// their start times. The result is strictly increasing and always begins
/// with `0.0`: when no segment qualifies (continuous silence, or audio
/// below the duration threshold) the render still proceeds with a single
/// full-length scene `[0.0]`; when the first qualifying start is later
/// than zero, `0.0` is prefixed.
pub fn generate_cut_points(segments: &[AudioSegment], min_segment: f64) -> Vec<f64> {
    let mut cuts: Vec<f64> = segments
        .iter()
        .filter(|s| !s.is_silent && s.duration >= min_segment)
        .map(|s| s.start)
        .collect();

    if cuts.is_empty() {
        return vec![0.0];
    }

    if cuts[0] > 0.0 {
        cuts.insert(0, 0.0);
    }

    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_segments() -> Vec<AudioSegment> {
        // 1.0s silent lead-in, 3.0s speech, 0.5s silence, 2.0s speech
        vec![
            AudioSegment::new(0.0, 1.0, true),
            AudioSegment::new(1.0, 4.0, false),
            AudioSegment::new(4.0, 4.5, true),
            AudioSegment::new(4.5, 6.5, false),
        ]
    }

    #[test]
    fn test_fixture_cut_points() {
        let cuts = generate_cut_points(&fixture_segments(), 1.0);
        assert_eq!(cuts, vec![0.0, 1.0, 4.5]);
    }

    #[test]
    fn test_non_silent_from_zero_is_not_doubled() {
        let segments = vec![
            AudioSegment::new(0.0, 3.0, false),
            AudioSegment::new(3.0, 3.5, true),
            AudioSegment::new(3.5, 6.0, false),
        ];
        let cuts = generate_cut_points(&segments, 1.0);
        assert_eq!(cuts, vec![0.0, 3.5]);
    }

    #[test]
    fn test_continuous_silence_falls_back_to_single_scene() {
        let segments = vec![AudioSegment::new(0.0, 5.0, true)];
        assert_eq!(generate_cut_points(&segments, 1.0), vec![0.0]);
    }

    #[test]
    fn test_below_threshold_segments_excluded() {
        let segments = vec![
            AudioSegment::new(0.0, 0.4, false),
            AudioSegment::new(0.4, 1.0, true),
            AudioSegment::new(1.0, 4.0, false),
        ];
        // The 0.4s opener is too short to qualify; zero is prefixed instead.
        assert_eq!(generate_cut_points(&segments, 1.0), vec![0.0, 1.0]);
    }

    #[test]
    fn test_monotonicity() {
        let cuts = generate_cut_points(&fixture_segments(), 0.1);
        for pair in cuts.windows(2) {
            assert!(pair[0] < pair[1], "cut points must be strictly increasing");
        }
        assert_eq!(cuts[0], 0.0);
    }

    #[test]
    fn test_empty_segment_list() {
        assert_eq!(generate_cut_points(&[], 1.0), vec![0.0]);
    }
}
