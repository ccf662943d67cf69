//! Shared data models for the slidecast render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their status lifecycle
//! - Render requests and options
//! - Audio/text segment timelines
//! - Image references and provider attempt logs

pub mod attempt;
pub mod image;
pub mod job;
pub mod request;
pub mod segment;

// Re-export common types
pub use attempt::{AttemptOutcome, Capability, ProviderAttempt};
pub use image::{ImageReference, ImageSource};
pub use job::{JobId, JobStatus, RenderJob, RenderResult};
pub use request::{RenderOptions, RenderRequest, RequestError, Resolution};
pub use segment::{AudioSegment, TextSegment};
