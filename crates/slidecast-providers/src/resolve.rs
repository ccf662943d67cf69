//! Image supply resolution.
//!
//! Resolution order: explicit caller URLs, then keyword search through
//! the image provider chain, then synthesized placeholders. The result
//! is never empty; placeholder synthesis has no external dependency and
//! tops the list up to the requested count whenever suppliers fall
//! short.

use futures::future::join_all;
use reqwest::Client;
use std::path::Path;
use tracing::{info, warn};

use slidecast_models::{Capability, ImageReference, ImageSource, ProviderAttempt, TextSegment};

use crate::chain::ProviderChain;
use crate::download::download_image;
use crate::error::{ProviderError, ProviderResult};
use crate::image_search::ImageProvider;
use crate::offline::OfflineStudio;
use crate::text::TextProvider;

/// What the resolver should produce.
#[derive(Debug, Clone, Default)]
pub struct ImageSpec {
    /// Caller-supplied image URLs; used verbatim when present
    pub explicit_urls: Vec<String>,
    /// Search keywords, one query per keyword
    pub keywords: Vec<String>,
    /// Number of images to produce
    pub count: usize,
}

impl ImageSpec {
    /// Default image count: roughly one image per two narration
    /// segments, never fewer than two.
    pub fn default_count(segment_count: usize) -> usize {
        segment_count.div_ceil(2).max(2)
    }
}

/// Derive one search keyword string per narration chunk.
///
/// Each chunk goes through the text provider chain; the chain's own
/// offline fallback (naive first-words extraction) guarantees a keyword
/// for every chunk. The topic, when given, is searched as-is first.
pub async fn derive_keywords(
    topic: Option<&str>,
    segments: &[TextSegment],
    chain: &ProviderChain<dyn TextProvider>,
    offline: &OfflineStudio,
    attempts: &mut Vec<ProviderAttempt>,
) -> Vec<String> {
    let mut keywords = Vec::new();

    if let Some(topic) = topic {
        let trimmed = topic.trim();
        if !trimmed.is_empty() {
            keywords.push(trimmed.to_string());
        }
    }

    for segment in segments {
        let keyword = chain
            .extract_keywords_with_fallback(&segment.text, offline, attempts)
            .await;
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }

    keywords
}

/// Resolve the image list for one render.
///
/// Errors only when placeholder synthesis itself fails; every upstream
/// failure is absorbed by the next resolution step.
pub async fn resolve_images(
    http: &Client,
    chain: &ProviderChain<dyn ImageProvider>,
    offline: &OfflineStudio,
    spec: &ImageSpec,
    scratch_dir: &Path,
    attempts: &mut Vec<ProviderAttempt>,
) -> ProviderResult<Vec<ImageReference>> {
    // Explicit URLs win outright: the caller picked these images, so a
    // partial batch is returned as-is rather than topped up.
    if !spec.explicit_urls.is_empty() {
        let refs = download_explicit(http, &spec.explicit_urls, scratch_dir).await;
        if !refs.is_empty() {
            return Ok(refs);
        }
        warn!("All explicit image downloads failed, falling back to search");
    }

    let mut refs: Vec<ImageReference> = Vec::new();

    for keyword in &spec.keywords {
        if refs.len() >= spec.count {
            break;
        }
        let remaining = spec.count - refs.len();

        let hits = match chain.search_with_fallback(keyword, remaining, attempts).await {
            Ok(hits) => hits,
            Err(ProviderError::Exhausted { .. }) => break,
            Err(e) => {
                warn!(keyword, error = %e, "Image search failed");
                continue;
            }
        };

        for hit in hits.into_iter().take(remaining) {
            let ordinal = refs.len();
            let dest = scratch_dir.join(format!("search_{ordinal}.jpg"));
            match download_image(http, &hit.url, &dest).await {
                Ok(()) => refs.push(ImageReference::new(dest, hit.source, ordinal)),
                Err(e) => warn!(url = %hit.url, error = %e, "Dropping failed image download"),
            }
        }
    }

    // Placeholder synthesis guarantees the requested count.
    if refs.len() < spec.count {
        let missing = spec.count - refs.len();
        info!(missing, "Synthesizing placeholder images");
        attempts.push(ProviderAttempt::success(Capability::Image, "offline"));
        while refs.len() < spec.count {
            let ordinal = refs.len();
            let path = offline.placeholder_image(scratch_dir, ordinal)?;
            refs.push(ImageReference::new(path, ImageSource::Placeholder, ordinal));
        }
    }

    Ok(refs)
}

/// Download caller-supplied URLs concurrently, dropping individual
/// failures without aborting the batch.
async fn download_explicit(
    http: &Client,
    urls: &[String],
    scratch_dir: &Path,
) -> Vec<ImageReference> {
    let downloads = urls.iter().enumerate().map(|(i, url)| {
        let dest = scratch_dir.join(format!("custom_{i}.jpg"));
        async move {
            match download_image(http, url, &dest).await {
                Ok(()) => Some(dest),
                Err(e) => {
                    warn!(url, error = %e, "Dropping failed custom image");
                    None
                }
            }
        }
    });

    join_all(downloads)
        .await
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(ordinal, path)| ImageReference::new(path, ImageSource::Custom, ordinal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::image_search::PexelsClient;

    #[test]
    fn test_default_count() {
        assert_eq!(ImageSpec::default_count(0), 2);
        assert_eq!(ImageSpec::default_count(1), 2);
        assert_eq!(ImageSpec::default_count(4), 2);
        assert_eq!(ImageSpec::default_count(5), 3);
        assert_eq!(ImageSpec::default_count(10), 5);
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_exact_placeholder_count() {
        let dir = TempDir::new().unwrap();
        let chain: ProviderChain<dyn ImageProvider> = ProviderChain::new(Vec::new());
        let offline = OfflineStudio;
        let mut attempts = Vec::new();

        let spec = ImageSpec {
            explicit_urls: Vec::new(),
            keywords: vec!["sunset".to_string()],
            count: 3,
        };

        let refs = resolve_images(
            &Client::new(),
            &chain,
            &offline,
            &spec,
            dir.path(),
            &mut attempts,
        )
        .await
        .unwrap();

        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|r| r.is_placeholder()));
        assert!(refs.iter().all(|r| r.local_path.exists()));
        assert_eq!(
            refs.iter().map(|r| r.ordinal).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_explicit_urls_drop_individual_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 128]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let chain: ProviderChain<dyn ImageProvider> = ProviderChain::new(Vec::new());
        let mut attempts = Vec::new();

        let spec = ImageSpec {
            explicit_urls: vec![
                format!("{}/good.jpg", server.uri()),
                format!("{}/bad.jpg", server.uri()),
            ],
            keywords: Vec::new(),
            count: 2,
        };

        let refs = resolve_images(
            &Client::new(),
            &chain,
            &OfflineStudio,
            &spec,
            dir.path(),
            &mut attempts,
        )
        .await
        .unwrap();

        // The failing URL is dropped; the surviving custom image is
        // returned without placeholder top-up.
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].source, ImageSource::Custom);
    }

    #[tokio::test]
    async fn test_search_results_topped_up_with_placeholders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "photos": [{"src": {"large": format!("{}/img.jpg", "http://127.0.0.1:0")}}]
            })))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let chain = ProviderChain::new(vec![Arc::new(PexelsClient::new("k", server.uri()))
            as Arc<dyn ImageProvider>]);
        let mut attempts = Vec::new();

        let spec = ImageSpec {
            explicit_urls: Vec::new(),
            keywords: vec!["sunset".to_string()],
            count: 2,
        };

        // The search succeeds but the download target is unreachable, so
        // placeholders fill the gap.
        let refs = resolve_images(
            &Client::new(),
            &chain,
            &OfflineStudio,
            &spec,
            dir.path(),
            &mut attempts,
        )
        .await
        .unwrap();

        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.is_placeholder()));
    }
}
