//! FFmpeg CLI wrapper for the slidecast render pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - A runner with timeout and cancellation
//! - Audio duration probing with a conservative fallback
//! - Silence detection via the `silencedetect` filter
//! - Slideshow composition with a degraded single-image retry
//!
//! Everything external-tool-shaped hides behind the narrow [`MediaTool`]
//! trait so the regex parsing and process plumbing stay one swappable,
//! independently testable unit.

pub mod command;
pub mod compose;
pub mod error;
pub mod fsops;
pub mod probe;
pub mod silence;
pub mod tool;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use compose::{CompositeSpec, MIN_OUTPUT_BYTES};
pub use error::{MediaError, MediaResult};
pub use fsops::move_file;
pub use probe::FALLBACK_DURATION_SECS;
pub use silence::{build_segments, parse_silence_intervals, SilenceParams};
pub use tool::{FfmpegTool, MediaTool};
