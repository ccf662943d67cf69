//! Render job executor and end-to-end slideshow pipeline.
//!
//! This crate provides:
//! - The job tracker exposed to the routing/UI layer
//! - A bounded FIFO executor for render jobs
//! - The stage sequence from narration synthesis to final composition
//! - Progress emission at fixed milestones
//! - Graceful shutdown

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod tracker;

pub use config::WorkerConfig;
pub use context::{PipelineContext, QueuedJob};
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use tracker::JobTracker;
