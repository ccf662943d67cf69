//! Image downloading.

use reqwest::Client;
use std::path::Path;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Download one image URL to a local file.
///
/// Verifies the response carries a non-empty body before writing; an
/// empty payload would poison the concat manifest later.
pub async fn download_image(client: &Client, url: &str, dest: &Path) -> ProviderResult<()> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status, body));
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(ProviderError::invalid_response("Empty image payload"));
    }

    tokio::fs::write(dest, &bytes).await?;
    debug!(url, dest = %dest.display(), bytes = bytes.len(), "Image downloaded");
    Ok(())
}
