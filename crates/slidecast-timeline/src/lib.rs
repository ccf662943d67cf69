//! Pure time-domain planning for the render pipeline.
//!
//! This crate provides:
//! - Cut-point derivation from silence-analysis segments
//! - Script segmentation with emphasis-weighted duration estimates
//! - Image display-duration allocation (cut-driven and emphasis-driven)
//! - SRT subtitle track building
//!
//! Everything here is pure computation; all I/O lives in
//! `slidecast-media` and `slidecast-providers`.

pub mod allocate;
pub mod cuts;
pub mod script;
pub mod subtitle;

pub use allocate::{allocate_from_cuts, allocate_from_segments, AllocationError};
pub use cuts::{generate_cut_points, DEFAULT_MIN_SEGMENT_SECS};
pub use script::{estimate_duration, segment_script, ScriptParams};
pub use subtitle::build_srt;
