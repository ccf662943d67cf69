//! Image display-duration allocation.
//!
//! Two regimes feed the compositor:
//! - cut-driven: inter-cut intervals of the narration map onto images;
//! - emphasis-driven: estimated text-segment durations map onto images,
//!   with emphasized segments taking the remainder first.
//!
//! Both conserve total duration: the returned vector has one entry per
//! image and sums to the input duration within floating-point tolerance.

use slidecast_models::TextSegment;
use thiserror::Error;

/// Errors from duration allocation.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("Cannot allocate durations without images")]
    NoImages,

    #[error("Cannot allocate durations without segments")]
    NoSegments,
}

/// Allocate per-image display durations from scene cut points.
///
/// `cut_points` must be strictly increasing and start at 0 (the planner
/// guarantees this); the final interval ends at `total`. When there are
/// more intervals than images, interval `i` accrues to image
/// `i % image_count`; otherwise images are spread across intervals
/// (earliest intervals absorb the remainder) and each interval's duration
/// splits evenly among its images.
pub fn allocate_from_cuts(
    cut_points: &[f64],
    image_count: usize,
    total: f64,
) -> Result<Vec<f64>, AllocationError> {
    if image_count == 0 {
        return Err(AllocationError::NoImages);
    }

    let mut intervals = Vec::with_capacity(cut_points.len());
    for (i, &start) in cut_points.iter().enumerate() {
        let end = cut_points.get(i + 1).copied().unwrap_or(total);
        if end > start {
            intervals.push(end - start);
        }
    }
    if intervals.is_empty() {
        intervals.push(total);
    }

    if intervals.len() > image_count {
        let mut durations = vec![0.0; image_count];
        for (i, len) in intervals.iter().enumerate() {
            durations[i % image_count] += len;
        }
        Ok(durations)
    } else {
        // image_count >= intervals: earliest intervals take one extra image
        let base = image_count / intervals.len();
        let remainder = image_count % intervals.len();
        let mut durations = Vec::with_capacity(image_count);
        for (i, len) in intervals.iter().enumerate() {
            let images_here = base + usize::from(i < remainder);
            let share = len / images_here as f64;
            durations.extend(std::iter::repeat(share).take(images_here));
        }
        Ok(durations)
    }
}

/// Allocate per-image display durations from estimated text segments.
///
/// With at least one image per segment, every segment gets
/// `image_count / segment_count` images and emphasized segments (in
/// original order) receive the remainder first; each segment's duration
/// splits evenly across its images. With fewer images than segments,
/// consecutive segments group into `image_count` buckets (bucket sizes
/// balanced around `ceil(segment_count / image_count)`) and each bucket's
/// summed duration becomes one image's display time.
pub fn allocate_from_segments(
    segments: &[TextSegment],
    image_count: usize,
) -> Result<Vec<f64>, AllocationError> {
    if image_count == 0 {
        return Err(AllocationError::NoImages);
    }
    if segments.is_empty() {
        return Err(AllocationError::NoSegments);
    }

    let segment_count = segments.len();

    if image_count >= segment_count {
        let base = image_count / segment_count;
        let mut remainder = image_count - segment_count * base;
        let mut assigned = vec![base; segment_count];

        // Emphasized segments spend the remainder first, in original order.
        for (i, seg) in segments.iter().enumerate() {
            if remainder == 0 {
                break;
            }
            if seg.emphasis {
                assigned[i] += 1;
                remainder -= 1;
            }
        }
        for slot in assigned.iter_mut() {
            if remainder == 0 {
                break;
            }
            // Second pass covers scripts without enough emphasis.
            if *slot == base {
                *slot += 1;
                remainder -= 1;
            }
        }

        let mut durations = Vec::with_capacity(image_count);
        for (seg, &count) in segments.iter().zip(&assigned) {
            let share = seg.duration / count as f64;
            durations.extend(std::iter::repeat(share).take(count));
        }
        Ok(durations)
    } else {
        // Consecutive bucketing; earliest buckets absorb the remainder so
        // every image receives at least one segment.
        let base = segment_count / image_count;
        let remainder = segment_count % image_count;
        let mut durations = Vec::with_capacity(image_count);
        let mut cursor = 0usize;
        for i in 0..image_count {
            let size = base + usize::from(i < remainder);
            let bucket = &segments[cursor..cursor + size];
            durations.push(bucket.iter().map(|s| s.duration).sum());
            cursor += size;
        }
        Ok(durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(duration: f64, emphasis: bool) -> TextSegment {
        TextSegment::new("text", duration, emphasis)
    }

    fn assert_sums_to(durations: &[f64], expected: f64) {
        let sum: f64 = durations.iter().sum();
        assert!(
            (sum - expected).abs() < 1e-6,
            "expected sum {expected}, got {sum}"
        );
    }

    #[test]
    fn test_cuts_more_intervals_than_images_cycles() {
        // Intervals: [0,2), [2,5), [5,6), [6,10) = 2, 3, 1, 4
        let durations = allocate_from_cuts(&[0.0, 2.0, 5.0, 6.0], 2, 10.0).unwrap();
        assert_eq!(durations.len(), 2);
        // image 0 takes intervals 0 and 2; image 1 takes intervals 1 and 3
        assert!((durations[0] - 3.0).abs() < 1e-9);
        assert!((durations[1] - 7.0).abs() < 1e-9);
        assert_sums_to(&durations, 10.0);
    }

    #[test]
    fn test_cuts_more_images_than_intervals_splits_evenly() {
        // Intervals: [0,4), [4,10) = 4, 6 with 5 images → 3 + 2 assignment
        let durations = allocate_from_cuts(&[0.0, 4.0], 5, 10.0).unwrap();
        assert_eq!(durations.len(), 5);
        assert_sums_to(&durations, 10.0);
        for d in &durations {
            assert!(*d > 0.0);
        }
    }

    #[test]
    fn test_cuts_single_scene() {
        let durations = allocate_from_cuts(&[0.0], 3, 9.0).unwrap();
        assert_eq!(durations, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_cuts_no_images_is_error() {
        assert_eq!(
            allocate_from_cuts(&[0.0], 0, 9.0),
            Err(AllocationError::NoImages)
        );
    }

    #[test]
    fn test_segments_emphasis_takes_remainder_first() {
        let segments = vec![seg(4.0, false), seg(6.0, true), seg(2.0, false)];
        // 4 images over 3 segments: base 1 each, remainder 1 to the
        // emphasized segment; its 6.0s splits across 2 images.
        let durations = allocate_from_segments(&segments, 4).unwrap();
        assert_eq!(durations.len(), 4);
        assert!((durations[0] - 4.0).abs() < 1e-9);
        assert!((durations[1] - 3.0).abs() < 1e-9);
        assert!((durations[2] - 3.0).abs() < 1e-9);
        assert!((durations[3] - 2.0).abs() < 1e-9);
        assert_sums_to(&durations, 12.0);
    }

    #[test]
    fn test_segments_remainder_spills_to_plain_segments() {
        let segments = vec![seg(3.0, false), seg(3.0, false)];
        let durations = allocate_from_segments(&segments, 5).unwrap();
        assert_eq!(durations.len(), 5);
        assert_sums_to(&durations, 6.0);
    }

    #[test]
    fn test_segments_bucketing_when_fewer_images() {
        let segments = vec![
            seg(1.0, false),
            seg(2.0, false),
            seg(3.0, false),
            seg(4.0, false),
            seg(5.0, false),
        ];
        let durations = allocate_from_segments(&segments, 2).unwrap();
        assert_eq!(durations.len(), 2);
        // First bucket takes three segments, second takes two.
        assert!((durations[0] - 6.0).abs() < 1e-9);
        assert!((durations[1] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_conservation_across_shapes() {
        let segments: Vec<TextSegment> = (1..=7).map(|i| seg(i as f64, i % 3 == 0)).collect();
        let total: f64 = segments.iter().map(|s| s.duration).sum();
        for image_count in 1..=15 {
            let durations = allocate_from_segments(&segments, image_count).unwrap();
            assert_eq!(durations.len(), image_count);
            assert_sums_to(&durations, total);
            for d in &durations {
                assert!(*d > 0.0, "no image may receive a non-positive duration");
            }
        }
    }

    #[test]
    fn test_cuts_conservation_across_shapes() {
        let cuts = vec![0.0, 1.5, 4.0, 4.5, 9.0];
        for image_count in 1..=10 {
            let durations = allocate_from_cuts(&cuts, image_count, 12.0).unwrap();
            assert_eq!(durations.len(), image_count);
            assert_sums_to(&durations, 12.0);
        }
    }
}
