//! Failure classification shared by every provider adapter
//!
//! A provider call can fail in a handful of ways. Each raw signal maps to
//! exactly one [`FailureKind`]; the router falls back only on
//! [`FailureKind::Transient`].

use super::identity::ProviderId;
use std::fmt;
use thiserror::Error;

/// Whether a failure justifies trying another provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Load, timeouts, malformed responses: another provider may succeed
    Transient,
    /// Bad credentials or a bad request: another provider will not help
    Terminal,
}

/// Raw failure observed while talking to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// Non-2xx HTTP status
    HttpStatus(u16),
    /// Connection, TLS or I/O failure before a status was received
    Network { timeout: bool },
    /// 2xx response whose body is not the expected shape
    MalformedBody,
}

impl fmt::Display for FailureSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureSignal::HttpStatus(status) => write!(f, "HTTP {}", status),
            FailureSignal::Network { timeout: true } => f.write_str("request timed out"),
            FailureSignal::Network { timeout: false } => f.write_str("network error"),
            FailureSignal::MalformedBody => f.write_str("malformed response body"),
        }
    }
}

/// Classify a raw failure signal
pub fn classify(signal: &FailureSignal) -> FailureKind {
    match *signal {
        FailureSignal::HttpStatus(429) => FailureKind::Transient,
        FailureSignal::HttpStatus(status) if status >= 500 => FailureKind::Transient,
        // 400, 401, 403 and every other client error
        FailureSignal::HttpStatus(status) if (400..500).contains(&status) => FailureKind::Terminal,
        // 1xx/3xx that reached us cannot carry the expected payload
        FailureSignal::HttpStatus(_) => FailureKind::Transient,
        FailureSignal::Network { .. } => FailureKind::Transient,
        FailureSignal::MalformedBody => FailureKind::Transient,
    }
}

/// A provider failure together with its classification.
///
/// The message is assembled from the provider name and the signal only, so it
/// never embeds request or response data. A key value that is itself a
/// substring of that fixed vocabulary (e.g. `"HTTP"`) would still appear
/// verbatim; rendering through [`SearchError::safe_display`] removes it.
///
/// [`SearchError::safe_display`]: crate::search::SearchError::safe_display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedFailure {
    kind: FailureKind,
    provider: ProviderId,
    signal: FailureSignal,
    message: String,
}

impl ClassifiedFailure {
    pub fn new(provider: ProviderId, signal: FailureSignal) -> Self {
        let kind = classify(&signal);
        let message = match signal {
            FailureSignal::HttpStatus(401) | FailureSignal::HttpStatus(403) => format!(
                "{} search failed: {} (check {})",
                provider,
                signal,
                provider.credential_var()
            ),
            _ => format!("{} search failed: {}", provider, signal),
        };

        Self {
            kind,
            provider,
            signal,
            message,
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn signal(&self) -> FailureSignal {
        self.signal
    }

    /// Caller-visible message, free of secret material
    pub fn safe_message(&self) -> &str {
        &self.message
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}
