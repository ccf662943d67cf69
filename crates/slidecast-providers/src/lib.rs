//! Provider integrations for the slidecast pipeline.
//!
//! This crate provides:
//! - Capability traits (`VoiceProvider`, `ImageProvider`, `TextProvider`)
//! - One thin client per vendor (ElevenLabs, Google Translate TTS,
//!   Pexels, Pixabay, OpenAI, Gemini)
//! - The deterministic offline/demo generator used as the guaranteed
//!   last-resort fallback
//! - The ordered fallback chain with preferred-first dispatch
//! - Image supply resolution (explicit URLs, keyword search, placeholders)

pub mod chain;
pub mod download;
pub mod error;
pub mod image_search;
pub mod offline;
pub mod resolve;
pub mod text;
pub mod voice;

pub use chain::{Provider, ProviderChain, DEFAULT_PROVIDER_TIMEOUT_SECS};
pub use error::{ProviderError, ProviderResult};
pub use image_search::{ImageHit, ImageProvider, PexelsClient, PixabayClient};
pub use offline::OfflineStudio;
pub use resolve::{derive_keywords, resolve_images, ImageSpec};
pub use text::{GeminiClient, OpenAiClient, TextProvider};
pub use voice::{ElevenLabsClient, GoogleTranslateTts, VoiceProvider};
