//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors from a single provider attempt.
///
/// These are recovered locally by advancing the fallback chain; only
/// [`ProviderError::Exhausted`] from a chain with no offline fallback,
/// or an offline-generator I/O failure, can surface further.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider call timed out after {0} seconds")]
    Timeout(u64),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("All {capability} providers failed")]
    Exhausted { capability: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image encoding error: {0}")]
    ImageEncoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status into the matching taxonomy entry.
    pub fn from_status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        match status.as_u16() {
            401 | 403 => Self::Auth(format!("HTTP {status}: {body}")),
            429 => Self::Quota(format!("HTTP {status}: {body}")),
            _ => Self::Unavailable(format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let auth = ProviderError::from_status(reqwest::StatusCode::UNAUTHORIZED, "no key");
        assert!(matches!(auth, ProviderError::Auth(_)));

        let quota = ProviderError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(quota, ProviderError::Quota(_)));

        let other = ProviderError::from_status(reqwest::StatusCode::BAD_GATEWAY, "oops");
        assert!(matches!(other, ProviderError::Unavailable(_)));
    }
}
