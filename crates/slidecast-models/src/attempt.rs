//! Provider attempt log for fallback diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability a provider implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Voice,
    Image,
    Text,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Voice => "voice",
            Capability::Image => "image",
            Capability::Text => "text",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// One entry in the per-job fallback diagnostic log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAttempt {
    /// Capability being exercised
    pub kind: Capability,
    /// Provider name (e.g. "elevenlabs", "pexels", "offline")
    pub provider: String,
    /// Whether the attempt succeeded
    pub outcome: AttemptOutcome,
    /// Failure description, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ProviderAttempt {
    pub fn success(kind: Capability, provider: impl Into<String>) -> Self {
        Self {
            kind,
            provider: provider.into(),
            outcome: AttemptOutcome::Success,
            reason: None,
        }
    }

    pub fn failure(
        kind: Capability,
        provider: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider: provider.into(),
            outcome: AttemptOutcome::Failure,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_constructors() {
        let ok = ProviderAttempt::success(Capability::Voice, "elevenlabs");
        assert_eq!(ok.outcome, AttemptOutcome::Success);
        assert!(ok.reason.is_none());

        let bad = ProviderAttempt::failure(Capability::Image, "pexels", "HTTP 429");
        assert_eq!(bad.outcome, AttemptOutcome::Failure);
        assert_eq!(bad.reason.as_deref(), Some("HTTP 429"));
    }
}
