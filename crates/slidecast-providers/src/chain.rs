//! Ordered fallback chain with preferred-first dispatch.
//!
//! The fallback order is data, not code: each capability holds an
//! ordered provider list, and the orchestrator walks
//! `TryPreferred → TryAlternatives → TryOfflineDemo → Terminal` by
//! iterating the reordered list, never attempting the same provider
//! twice within one request.

use std::sync::Arc;
use tracing::warn;

/// Per-provider call timeout.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Common surface of every provider, whatever its capability.
pub trait Provider: Send + Sync {
    /// Stable vendor name used in configuration and attempt logs.
    fn name(&self) -> &'static str;
}

/// An ordered list of providers for one capability.
#[derive(Clone)]
pub struct ProviderChain<P: ?Sized> {
    providers: Vec<Arc<P>>,
    preferred: Option<String>,
    timeout_secs: u64,
}

impl<P: Provider + ?Sized> ProviderChain<P> {
    /// Create a chain from providers in their static fallback order.
    pub fn new(providers: Vec<Arc<P>>) -> Self {
        Self {
            providers,
            preferred: None,
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }

    /// Name the preferred provider; it is attempted first regardless of
    /// its position in the static order. Unknown names are ignored with
    /// a warning.
    pub fn with_preferred(mut self, preferred: Option<String>) -> Self {
        if let Some(name) = &preferred {
            if !self.providers.iter().any(|p| p.name() == name) {
                warn!(provider = %name, "Preferred provider not registered, using static order");
                self.preferred = None;
                return self;
            }
        }
        self.preferred = preferred;
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Per-call timeout in seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Candidates in attempt order: the preferred provider first, then
    /// the remaining providers in their static order.
    pub fn ordered(&self) -> Vec<Arc<P>> {
        let Some(preferred) = &self.preferred else {
            return self.providers.clone();
        };

        let mut ordered = Vec::with_capacity(self.providers.len());
        for p in &self.providers {
            if p.name() == preferred {
                ordered.insert(0, Arc::clone(p));
            } else {
                ordered.push(Arc::clone(p));
            }
        }
        ordered
    }
}
