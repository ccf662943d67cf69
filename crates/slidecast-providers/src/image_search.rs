//! Stock-image search providers and their fallback chain.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use slidecast_models::{Capability, ImageSource, ProviderAttempt};

use crate::chain::{Provider, ProviderChain};
use crate::error::{ProviderError, ProviderResult};

/// One search result with a fetchable URL.
#[derive(Debug, Clone)]
pub struct ImageHit {
    /// Direct image URL
    pub url: String,
    /// Which vendor produced the hit
    pub source: ImageSource,
}

/// A stock-image search vendor.
#[async_trait]
pub trait ImageProvider: Provider {
    /// Search for up to `count` images matching `query`.
    async fn search(&self, query: &str, count: usize) -> ProviderResult<Vec<ImageHit>>;
}

/// Pexels search API client.
pub struct PexelsClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PexelsResponse {
    photos: Vec<PexelsPhoto>,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    large: String,
}

impl PexelsClient {
    /// Create a client from the `PEXELS_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("PEXELS_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("PEXELS_API_KEY not set".into()))?;
        Ok(Self::new(api_key, "https://api.pexels.com"))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Provider for PexelsClient {
    fn name(&self) -> &'static str {
        "pexels"
    }
}

#[async_trait]
impl ImageProvider for PexelsClient {
    async fn search(&self, query: &str, count: usize) -> ProviderResult<Vec<ImageHit>> {
        let url = format!(
            "{}/v1/search?query={}&per_page={}",
            self.base_url,
            urlencoding::encode(query),
            count.max(1)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: PexelsResponse = response.json().await?;
        let hits: Vec<ImageHit> = parsed
            .photos
            .into_iter()
            .map(|p| ImageHit {
                url: p.src.large,
                source: ImageSource::Pexels,
            })
            .collect();

        debug!(query, hits = hits.len(), "Pexels search complete");
        Ok(hits)
    }
}

/// Pixabay search API client.
pub struct PixabayClient {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PixabayResponse {
    hits: Vec<PixabayHit>,
}

#[derive(Debug, Deserialize)]
struct PixabayHit {
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
}

impl PixabayClient {
    /// Create a client from the `PIXABAY_API_KEY` environment variable.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("PIXABAY_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("PIXABAY_API_KEY not set".into()))?;
        Ok(Self::new(api_key, "https://pixabay.com"))
    }

    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Provider for PixabayClient {
    fn name(&self) -> &'static str {
        "pixabay"
    }
}

#[async_trait]
impl ImageProvider for PixabayClient {
    async fn search(&self, query: &str, count: usize) -> ProviderResult<Vec<ImageHit>> {
        // Pixabay rejects per_page below 3.
        let url = format!(
            "{}/api/?key={}&q={}&image_type=photo&per_page={}",
            self.base_url,
            self.api_key,
            urlencoding::encode(query),
            count.max(3)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let parsed: PixabayResponse = response.json().await?;
        let hits: Vec<ImageHit> = parsed
            .hits
            .into_iter()
            .take(count)
            .map(|h| ImageHit {
                url: h.large_image_url,
                source: ImageSource::Pixabay,
            })
            .collect();

        debug!(query, hits = hits.len(), "Pixabay search complete");
        Ok(hits)
    }
}

impl ProviderChain<dyn ImageProvider> {
    /// Walk the chain until one vendor returns a non-empty result.
    ///
    /// An empty result counts as a failure and advances the chain; the
    /// caller handles exhaustion with placeholder synthesis (the image
    /// capability's offline fallback).
    pub async fn search_with_fallback(
        &self,
        query: &str,
        count: usize,
        attempts: &mut Vec<ProviderAttempt>,
    ) -> ProviderResult<Vec<ImageHit>> {
        let per_call = Duration::from_secs(self.timeout_secs());

        for provider in self.ordered() {
            let outcome = timeout(per_call, provider.search(query, count)).await;
            let error = match outcome {
                Ok(Ok(hits)) if !hits.is_empty() => {
                    info!(provider = provider.name(), query, "Image search succeeded");
                    attempts.push(ProviderAttempt::success(Capability::Image, provider.name()));
                    return Ok(hits);
                }
                Ok(Ok(_)) => ProviderError::invalid_response("Empty search result"),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(self.timeout_secs()),
            };

            warn!(provider = provider.name(), error = %error, "Image provider failed");
            attempts.push(ProviderAttempt::failure(
                Capability::Image,
                provider.name(),
                error.to_string(),
            ));
        }

        Err(ProviderError::Exhausted {
            capability: "image".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_pexels_search_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("query", "sunset"))
            .and(header("Authorization", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "photos": [
                    {"src": {"large": "https://images.pexels.com/1.jpg"}},
                    {"src": {"large": "https://images.pexels.com/2.jpg"}}
                ]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("test-key", server.uri());
        let hits = client.search("sunset", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://images.pexels.com/1.jpg");
        assert_eq!(hits[0].source, ImageSource::Pexels);
    }

    #[tokio::test]
    async fn test_pexels_auth_failure_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = PexelsClient::new("wrong", server.uri());
        let err = client.search("sunset", 2).await.unwrap_err();
        assert!(matches!(err, ProviderError::Auth(_)));
    }

    #[tokio::test]
    async fn test_pixabay_search_parses_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": [
                    {"largeImageURL": "https://cdn.pixabay.com/a.jpg"},
                    {"largeImageURL": "https://cdn.pixabay.com/b.jpg"},
                    {"largeImageURL": "https://cdn.pixabay.com/c.jpg"}
                ]
            })))
            .mount(&server)
            .await;

        let client = PixabayClient::new("key", server.uri());
        let hits = client.search("sunset", 2).await.unwrap();
        // Requested two, server returned three, result is capped.
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].source, ImageSource::Pixabay);
    }

    #[tokio::test]
    async fn test_chain_advances_past_empty_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"photos": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": [{"largeImageURL": "https://cdn.pixabay.com/only.jpg"}]
            })))
            .mount(&server)
            .await;

        let chain = ProviderChain::new(vec![
            Arc::new(PexelsClient::new("k", server.uri())) as Arc<dyn ImageProvider>,
            Arc::new(PixabayClient::new("k", server.uri())) as Arc<dyn ImageProvider>,
        ]);

        let mut attempts = Vec::new();
        let hits = chain
            .search_with_fallback("sunset", 1, &mut attempts)
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].provider, "pexels");
        assert_eq!(attempts[1].provider, "pixabay");
    }

    #[tokio::test]
    async fn test_chain_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let chain = ProviderChain::new(vec![Arc::new(PexelsClient::new("k", server.uri()))
            as Arc<dyn ImageProvider>]);

        let mut attempts = Vec::new();
        let err = chain
            .search_with_fallback("sunset", 1, &mut attempts)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Exhausted { .. }));
    }
}
