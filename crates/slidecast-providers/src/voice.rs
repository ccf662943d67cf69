//! Voice synthesis providers and their fallback chain.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use slidecast_models::{Capability, ProviderAttempt};

use crate::chain::{Provider, ProviderChain};
use crate::error::{ProviderError, ProviderResult};
use crate::offline::OfflineStudio;

/// A voice synthesis vendor.
#[async_trait]
pub trait VoiceProvider: Provider {
    /// Synthesize narration audio for `text`.
    ///
    /// `voice` selects a vendor-specific voice profile; `speed` is a
    /// playback-rate multiplier vendors may ignore.
    async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        speed: f32,
    ) -> ProviderResult<Vec<u8>>;
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

/// Default ElevenLabs voice when the caller does not pick one.
const ELEVENLABS_DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

#[derive(Debug, Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsClient {
    /// Create a client from the `ELEVENLABS_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("ELEVENLABS_API_KEY not set".into()))?;
        Ok(Self::new(api_key, "https://api.elevenlabs.io"))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Provider for ElevenLabsClient {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }
}

#[async_trait]
impl VoiceProvider for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        _speed: f32,
    ) -> ProviderResult<Vec<u8>> {
        let voice_id = voice.unwrap_or(ELEVENLABS_DEFAULT_VOICE);
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&ElevenLabsRequest {
                text,
                model_id: "eleven_multilingual_v2",
                voice_settings: VoiceSettings {
                    stability: 0.5,
                    similarity_boost: 0.75,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response("Empty audio payload"));
        }

        debug!(bytes = bytes.len(), "ElevenLabs synthesis complete");
        Ok(bytes.to_vec())
    }
}

/// Google Translate's unofficial TTS endpoint (key-less, rate limited).
///
/// The endpoint caps each request around 200 characters, so longer
/// scripts are chunked at word boundaries and the MP3 payloads
/// concatenated.
pub struct GoogleTranslateTts {
    client: Client,
    base_url: String,
}

const GTTS_CHUNK_CHARS: usize = 180;

impl Default for GoogleTranslateTts {
    fn default() -> Self {
        Self::new("https://translate.google.com")
    }
}

impl GoogleTranslateTts {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str) -> ProviderResult<Vec<u8>> {
        let url = format!(
            "{}/translate_tts?ie=UTF-8&client=tw-ob&tl=en&q={}",
            self.base_url,
            urlencoding::encode(chunk)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::invalid_response("Empty audio payload"));
        }
        Ok(bytes.to_vec())
    }
}

impl Provider for GoogleTranslateTts {
    fn name(&self) -> &'static str {
        "gtts"
    }
}

#[async_trait]
impl VoiceProvider for GoogleTranslateTts {
    async fn synthesize(
        &self,
        text: &str,
        _voice: Option<&str>,
        _speed: f32,
    ) -> ProviderResult<Vec<u8>> {
        let mut audio = Vec::new();
        for chunk in chunk_text(text, GTTS_CHUNK_CHARS) {
            audio.extend(self.fetch_chunk(&chunk).await?);
        }
        if audio.is_empty() {
            return Err(ProviderError::invalid_response("No audio produced"));
        }
        Ok(audio)
    }
}

/// Split text into chunks of at most `limit` characters at word
/// boundaries; a single oversized word becomes its own chunk.
fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

impl ProviderChain<dyn VoiceProvider> {
    /// Walk the chain, then fall back to the offline demo tone.
    ///
    /// Each candidate is attempted at most once; errors and per-call
    /// timeouts advance the chain and land in `attempts`. The offline
    /// generator cannot fail, so this always returns audio.
    pub async fn synthesize_with_fallback(
        &self,
        text: &str,
        voice: Option<&str>,
        speed: f32,
        offline: &OfflineStudio,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> Vec<u8> {
        let per_call = Duration::from_secs(self.timeout_secs());

        for provider in self.ordered() {
            let outcome = timeout(per_call, provider.synthesize(text, voice, speed)).await;
            match outcome {
                Ok(Ok(audio)) => {
                    info!(provider = provider.name(), "Voice synthesis succeeded");
                    attempts.push(ProviderAttempt::success(Capability::Voice, provider.name()));
                    return audio;
                }
                Ok(Err(e)) => {
                    warn!(provider = provider.name(), error = %e, "Voice provider failed");
                    attempts.push(ProviderAttempt::failure(
                        Capability::Voice,
                        provider.name(),
                        e.to_string(),
                    ));
                }
                Err(_) => {
                    let e = ProviderError::Timeout(self.timeout_secs());
                    warn!(provider = provider.name(), error = %e, "Voice provider timed out");
                    attempts.push(ProviderAttempt::failure(
                        Capability::Voice,
                        provider.name(),
                        e.to_string(),
                    ));
                }
            }
        }

        info!("All voice providers failed, using offline demo tone");
        attempts.push(ProviderAttempt::success(Capability::Voice, "offline"));
        offline.demo_voice(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_models::AttemptOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted test double recording how often it was called.
    struct ScriptedVoice {
        name: &'static str,
        payload: Option<&'static [u8]>,
        calls: AtomicUsize,
    }

    impl ScriptedVoice {
        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                payload: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn succeeding(name: &'static str, payload: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                name,
                payload: Some(payload),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Provider for ScriptedVoice {
        fn name(&self) -> &'static str {
            self.name
        }
    }

    #[async_trait]
    impl VoiceProvider for ScriptedVoice {
        async fn synthesize(
            &self,
            _text: &str,
            _voice: Option<&str>,
            _speed: f32,
        ) -> ProviderResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.payload {
                Some(payload) => Ok(payload.to_vec()),
                None => Err(ProviderError::unavailable("down")),
            }
        }
    }

    #[tokio::test]
    async fn test_preferred_succeeds_others_untouched() {
        // Fallback ordering: with preferred=c, neither a nor b is called
        // once c succeeds.
        let a = ScriptedVoice::failing("a");
        let b = ScriptedVoice::failing("b");
        let c = ScriptedVoice::succeeding("c", b"mp3");
        let chain = ProviderChain::new(vec![
            Arc::clone(&a) as Arc<dyn VoiceProvider>,
            Arc::clone(&b) as Arc<dyn VoiceProvider>,
            Arc::clone(&c) as Arc<dyn VoiceProvider>,
        ])
        .with_preferred(Some("c".to_string()));

        let offline = OfflineStudio::default();
        let mut attempts = Vec::new();
        let audio = chain
            .synthesize_with_fallback("hello", None, 1.0, &offline, &mut attempts)
            .await;

        assert_eq!(audio, b"mp3");
        assert_eq!(c.call_count(), 1);
        assert_eq!(a.call_count(), 0);
        assert_eq!(b.call_count(), 0);
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].provider, "c");
        assert_eq!(attempts[0].outcome, AttemptOutcome::Success);
    }

    #[tokio::test]
    async fn test_exhaustion_reaches_offline_once() {
        let a = ScriptedVoice::failing("a");
        let b = ScriptedVoice::failing("b");
        let chain = ProviderChain::new(vec![
            Arc::clone(&a) as Arc<dyn VoiceProvider>,
            Arc::clone(&b) as Arc<dyn VoiceProvider>,
        ]);

        let offline = OfflineStudio::default();
        let mut attempts = Vec::new();
        let audio = chain
            .synthesize_with_fallback("hello world", None, 1.0, &offline, &mut attempts)
            .await;

        assert!(!audio.is_empty());
        // Each real provider attempted exactly once before the offline tone.
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
        let offline_attempts: Vec<_> = attempts
            .iter()
            .filter(|a| a.provider == "offline")
            .collect();
        assert_eq!(offline_attempts.len(), 1);
        assert_eq!(offline_attempts[0].outcome, AttemptOutcome::Success);
        assert_eq!(attempts.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_chain_goes_straight_to_offline() {
        let chain: ProviderChain<dyn VoiceProvider> = ProviderChain::new(Vec::new());
        let offline = OfflineStudio::default();
        let mut attempts = Vec::new();
        let audio = chain
            .synthesize_with_fallback("hi", None, 1.0, &offline, &mut attempts)
            .await;
        assert!(!audio.is_empty());
        assert_eq!(attempts.len(), 1);
    }

    #[test]
    fn test_chunk_text_respects_limit() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunk_text(text, 15);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 15);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn test_chunk_text_single_word_over_limit() {
        let chunks = chunk_text("supercalifragilistic", 5);
        assert_eq!(chunks, vec!["supercalifragilistic".to_string()]);
    }
}
