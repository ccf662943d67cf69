//! Text generation providers for keyword extraction.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use slidecast_models::{Capability, ProviderAttempt};

use crate::chain::{Provider, ProviderChain};
use crate::error::{ProviderError, ProviderResult};
use crate::offline::OfflineStudio;

/// Prompt template for keyword extraction.
const KEYWORD_PROMPT: &str = "Extract 2-3 short descriptive keywords for a stock image search \
     from the following text. Reply with only the keywords, comma separated.";

/// Longest keyword reply accepted before truncation.
const MAX_KEYWORDS_LEN: usize = 80;

/// A text-generation vendor used to extract search keywords.
#[async_trait]
pub trait TextProvider: Provider {
    /// Extract 2-3 comma-separated descriptive keywords from `text`.
    async fn extract_keywords(&self, text: &str) -> ProviderResult<String>;
}

/// Trim, strip quotes, collapse to one line and cap the length of a
/// model reply.
fn tidy_keywords(raw: &str) -> String {
    let line = raw.lines().next().unwrap_or_default();
    let cleaned = line.trim().trim_matches(['"', '\'', '`']).trim();
    cleaned.chars().take(MAX_KEYWORDS_LEN).collect()
}

/// OpenAI chat-completions client.
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    content: String,
}

impl OpenAiClient {
    /// Create a client from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key, "https://api.openai.com"))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Provider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl TextProvider for OpenAiClient {
    async fn extract_keywords(&self, text: &str) -> ProviderResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = OpenAiRequest {
            model: "gpt-4o-mini",
            messages: vec![OpenAiMessage {
                role: "user",
                content: format!("{KEYWORD_PROMPT}\n\n{text}"),
            }],
            max_tokens: 32,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: OpenAiResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::invalid_response("No choices in reply"))?;

        let keywords = tidy_keywords(content);
        if keywords.is_empty() {
            return Err(ProviderError::invalid_response("Empty keyword reply"));
        }

        debug!(keywords = %keywords, "OpenAI keyword extraction complete");
        Ok(keywords)
    }
}

/// Gemini generateContent client.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key, "https://generativelanguage.googleapis.com"))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Provider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    async fn extract_keywords(&self, text: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/v1beta/models/gemini-2.0-flash:generateContent?key={}",
            self.base_url, self.api_key
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: format!("{KEYWORD_PROMPT}\n\n{text}"),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: GeminiResponse = response.json().await?;
        let content = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ProviderError::invalid_response("No candidates in reply"))?;

        let keywords = tidy_keywords(content);
        if keywords.is_empty() {
            return Err(ProviderError::invalid_response("Empty keyword reply"));
        }

        debug!(keywords = %keywords, "Gemini keyword extraction complete");
        Ok(keywords)
    }
}

impl ProviderChain<dyn TextProvider> {
    /// Walk the chain, then fall back to naive first-words extraction.
    ///
    /// The offline extractor is pure string work and cannot fail, so this
    /// always returns keywords.
    pub async fn extract_keywords_with_fallback(
        &self,
        text: &str,
        offline: &OfflineStudio,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> String {
        let per_call = Duration::from_secs(self.timeout_secs());

        for provider in self.ordered() {
            let outcome = timeout(per_call, provider.extract_keywords(text)).await;
            let error = match outcome {
                Ok(Ok(keywords)) => {
                    info!(provider = provider.name(), "Keyword extraction succeeded");
                    attempts.push(ProviderAttempt::success(Capability::Text, provider.name()));
                    return keywords;
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.timeout_secs()),
            };

            warn!(provider = provider.name(), error = %error, "Text provider failed");
            attempts.push(ProviderAttempt::failure(
                Capability::Text,
                provider.name(),
                error.to_string(),
            ));
        }

        attempts.push(ProviderAttempt::success(Capability::Text, "offline"));
        offline.demo_keywords(text)
    }
}
