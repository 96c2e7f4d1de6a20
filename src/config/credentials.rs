//! Provider API credentials
//!
//! Credentials live apart from [`Settings`](super::Settings): they are never
//! read from the settings file and never serialized.

use crate::diagnostics::redact_env_value;
use crate::providers::ProviderId;
use std::fmt;

/// An API key. Its value is only reachable through [`ApiKey::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for empty or whitespace-only input
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw key value, for placing into an outbound request header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// The set of configured provider keys
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    serper: Option<ApiKey>,
    tavily: Option<ApiKey>,
}

impl Credentials {
    /// No credentials at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every provider's key from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Self::new();
        for provider in ProviderId::PREFERENCE {
            if let Some(key) = lookup(provider.credential_var()).and_then(ApiKey::new) {
                credentials.set(provider, key);
            }
        }
        credentials
    }

    /// Builder-style setter; blank values leave the provider unconfigured
    pub fn with(mut self, provider: ProviderId, value: impl Into<String>) -> Self {
        if let Some(key) = ApiKey::new(value) {
            self.set(provider, key);
        }
        self
    }

    pub fn set(&mut self, provider: ProviderId, key: ApiKey) {
        *self.slot_mut(provider) = Some(key);
    }

    pub fn get(&self, provider: ProviderId) -> Option<&ApiKey> {
        match provider {
            ProviderId::Serper => self.serper.as_ref(),
            ProviderId::Tavily => self.tavily.as_ref(),
        }
    }

    pub fn is_present(&self, provider: ProviderId) -> bool {
        self.get(provider).is_some()
    }

    /// All configured key values, for scrubbing free-form text
    pub fn secret_values(&self) -> Vec<&str> {
        ProviderId::PREFERENCE
            .iter()
            .filter_map(|p| self.get(*p))
            .map(ApiKey::expose)
            .collect()
    }

    fn slot_mut(&mut self, provider: ProviderId) -> &mut Option<ApiKey> {
        match provider {
            ProviderId::Serper => &mut self.serper,
            ProviderId::Tavily => &mut self.tavily,
        }
    }
}

/// Display value for every provider credential variable, never the key itself
pub fn redacted_credentials<F>(lookup: F) -> Vec<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    ProviderId::PREFERENCE
        .into_iter()
        .map(|provider| {
            let var = provider.credential_var();
            let shown = match lookup(var) {
                Some(value) if !value.trim().is_empty() => {
                    redact_env_value(var, &value).to_string()
                }
                _ => "(not set)".to_string(),
            };
            (var, shown)
        })
        .collect()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |present: bool| if present { "set" } else { "not set" };
        f.debug_struct("Credentials")
            .field("serper", &state(self.serper.is_some()))
            .field("tavily", &state(self.tavily.is_some()))
            .finish()
    }
}
