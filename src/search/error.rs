//! Error types for routed searches.
//!
//! Every variant renders a message built from provider names, HTTP statuses
//! and configuration variable names only. Credential values never reach an
//! error. [`SearchError::safe_display`] additionally scrubs configured key
//! values from the rendered text, for keys that happen to coincide with that
//! fixed vocabulary.

use crate::config::Credentials;
use crate::diagnostics::scrub_secrets;
use crate::providers::{ClassifiedFailure, FailureKind, ProviderId};
use thiserror::Error;

/// Errors returned by [`Router::search`](super::Router::search)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request was rejected before any provider was contacted
    #[error("invalid search request: {reason}")]
    InvalidRequest { reason: String },

    /// No provider credential is configured
    #[error(
        "no web search provider configured: set {} or {}",
        ProviderId::Serper.credential_var(),
        ProviderId::Tavily.credential_var()
    )]
    NoProviderConfigured,

    /// Auth or validation failure; fallback is never attempted
    #[error("{0}")]
    ProviderTerminal(ClassifiedFailure),

    /// Transient failure with no fallback provider available
    #[error("{0}")]
    ProviderTransient(ClassifiedFailure),

    /// Primary failed transiently and the fallback failed too
    #[error("{primary}; fallback provider {} also failed: {fallback}", .fallback.provider())]
    CombinedFailure {
        primary: ClassifiedFailure,
        fallback: ClassifiedFailure,
    },
}

impl SearchError {
    /// Wrap a single-provider failure according to its class
    pub fn from_failure(failure: ClassifiedFailure) -> Self {
        match failure.kind() {
            FailureKind::Terminal => SearchError::ProviderTerminal(failure),
            FailureKind::Transient => SearchError::ProviderTransient(failure),
        }
    }

    /// Whether this is a configuration problem rather than a provider outage
    pub fn is_configuration(&self) -> bool {
        matches!(self, SearchError::NoProviderConfigured)
    }

    /// Rendered message with every configured key value replaced by `***`
    pub fn safe_display(&self, credentials: &Credentials) -> String {
        scrub_secrets(&self.to_string(), &credentials.secret_values())
    }
}
