//! The deterministic offline/demo generator.
//!
//! Last-resort artifacts with no external dependency: a pipeline must
//! still reach `completed` when every configured vendor is down, so
//! everything here is pure computation plus local file writes.

use image::{Rgb, RgbImage};
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Sample rate of the demo tone.
const DEMO_SAMPLE_RATE: u32 = 22_050;
/// Demo tone pitch in Hz.
const DEMO_TONE_HZ: f32 = 440.0;
/// Demo tone amplitude (of full scale).
const DEMO_AMPLITUDE: f32 = 0.3;
/// Fade length at each end of the tone, in seconds.
const DEMO_FADE_SECS: f32 = 0.05;

/// Placeholder frame dimensions.
const PLACEHOLDER_WIDTH: u32 = 1280;
const PLACEHOLDER_HEIGHT: u32 = 720;

/// Muted colour palette cycled by ordinal.
const PLACEHOLDER_PALETTE: [[u8; 3]; 6] = [
    [52, 73, 94],
    [39, 96, 108],
    [84, 64, 109],
    [112, 78, 54],
    [46, 88, 62],
    [98, 57, 71],
];

/// Deterministic producer of demo audio, placeholder frames and
/// fallback keywords.
#[derive(Debug, Clone, Default)]
pub struct OfflineStudio;

impl OfflineStudio {
    /// Generate a sine-tone WAV standing in for narration.
    ///
    /// The tone's length follows the same per-word pacing the script
    /// segmenter assumes, so downstream duration allocation still
    /// behaves sensibly.
    pub fn demo_voice(&self, text: &str) -> Vec<u8> {
        let words = text.split_whitespace().count() as f32;
        let secs = (1.0 + words * 0.4).clamp(2.0, 30.0);
        let total_samples = (secs * DEMO_SAMPLE_RATE as f32) as usize;
        let fade_samples = (DEMO_FADE_SECS * DEMO_SAMPLE_RATE as f32) as usize;

        let mut pcm = Vec::with_capacity(total_samples * 2);
        for i in 0..total_samples {
            let t = i as f32 / DEMO_SAMPLE_RATE as f32;
            let mut sample = (TAU * DEMO_TONE_HZ * t).sin() * DEMO_AMPLITUDE;

            // Short fades avoid clicks at the edges.
            if i < fade_samples {
                sample *= i as f32 / fade_samples as f32;
            } else if i >= total_samples - fade_samples {
                sample *= (total_samples - i) as f32 / fade_samples as f32;
            }

            let quantized = (sample * i16::MAX as f32) as i16;
            pcm.extend_from_slice(&quantized.to_le_bytes());
        }

        let mut wav = Vec::with_capacity(44 + pcm.len());
        write_wav_header(&mut wav, pcm.len() as u32, DEMO_SAMPLE_RATE);
        wav.extend_from_slice(&pcm);

        debug!(secs, bytes = wav.len(), "Demo voice tone generated");
        wav
    }

    /// Synthesize a solid-colour placeholder frame.
    pub fn placeholder_image(&self, dir: &Path, ordinal: usize) -> ProviderResult<PathBuf> {
        let [r, g, b] = PLACEHOLDER_PALETTE[ordinal % PLACEHOLDER_PALETTE.len()];
        let fill = Rgb([r, g, b]);
        let border = Rgb([
            r.saturating_add(40),
            g.saturating_add(40),
            b.saturating_add(40),
        ]);

        let mut frame = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, fill);
        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let edge = x < 8
                || y < 8
                || x >= PLACEHOLDER_WIDTH - 8
                || y >= PLACEHOLDER_HEIGHT - 8;
            if edge {
                *pixel = border;
            }
        }

        let path = dir.join(format!("placeholder_{ordinal}.png"));
        frame
            .save(&path)
            .map_err(|e| ProviderError::ImageEncoding(e.to_string()))?;

        debug!(path = %path.display(), "Placeholder frame generated");
        Ok(path)
    }

    /// Naive keyword extraction: the first few substantive words.
    pub fn demo_keywords(&self, text: &str) -> String {
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| w.chars().count() >= 4)
            .take(3)
            .collect();

        if words.is_empty() {
            "abstract background".to_string()
        } else {
            words.join(", ")
        }
    }
}

/// Write a canonical 44-byte PCM WAV header (16-bit mono).
fn write_wav_header(out: &mut Vec<u8>, data_len: u32, sample_rate: u32) {
    let byte_rate = sample_rate * 2;

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
}
