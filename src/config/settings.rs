//! Settings structures for websearch-router configuration

use crate::providers::ProviderId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Values accepted as "on" for boolean environment flags
const TRUTHY: [&str; 4] = ["1", "true", "yes", "on"];

/// Main settings structure, loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    pub providers: ProvidersSettings,
    pub diagnostics: DiagnosticsSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge with environment variables (WEBSEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_lookup(|name| std::env::var(name).ok());
    }

    /// Merge with values from an arbitrary variable lookup
    pub fn merge_lookup<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("WEBSEARCH_REQUEST_TIMEOUT") {
            if let Ok(timeout) = val.trim().parse::<f64>() {
                if is_valid_timeout(timeout) {
                    self.outgoing.request_timeout = timeout;
                }
            }
        }
        if let Some(val) = lookup("WEBSEARCH_DIAGNOSTICS") {
            self.diagnostics.enabled = is_truthy(&val);
        }
        if let Some(val) = lookup("WEBSEARCH_SERPER_ENDPOINT") {
            self.providers.serper.endpoint = val;
        }
        if let Some(val) = lookup("WEBSEARCH_TAVILY_ENDPOINT") {
            self.providers.tavily.endpoint = val;
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.search.default_num_results == 0 {
            anyhow::bail!("search.default_num_results must be at least 1");
        }
        check_timeout("outgoing.request_timeout", self.outgoing.request_timeout)?;
        for provider in ProviderId::PREFERENCE {
            let endpoint = self.providers.get(provider);
            Url::parse(&endpoint.endpoint).with_context(|| {
                format!("providers.{}.endpoint is not a valid URL", provider.name())
            })?;
            if let Some(timeout) = endpoint.timeout {
                check_timeout(&format!("providers.{}.timeout", provider.name()), timeout)?;
            }
        }
        Ok(())
    }

    /// Effective timeout for one provider
    pub fn provider_timeout(&self, provider: ProviderId) -> Duration {
        let seconds = self
            .providers
            .get(provider)
            .timeout
            .unwrap_or(self.outgoing.request_timeout);
        timeout_duration(seconds)
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of results requested when the caller does not say
    pub default_num_results: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_num_results: 3,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// User agent sent to providers
    pub user_agent: String,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
}

impl OutgoingSettings {
    /// Client-wide request timeout
    pub fn timeout(&self) -> Duration {
        timeout_duration(self.request_timeout)
    }
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            user_agent: format!("websearch-router/{}", crate::VERSION),
            pool_maxsize: 8,
        }
    }
}

/// Per-provider endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub serper: ProviderEndpoint,
    pub tavily: ProviderEndpoint,
}

impl ProvidersSettings {
    pub fn get(&self, provider: ProviderId) -> &ProviderEndpoint {
        match provider {
            ProviderId::Serper => &self.serper,
            ProviderId::Tavily => &self.tavily,
        }
    }
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            serper: ProviderEndpoint::for_provider(ProviderId::Serper),
            tavily: ProviderEndpoint::for_provider(ProviderId::Tavily),
        }
    }
}

/// Where and how long to talk to one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Search endpoint URL
    pub endpoint: String,
    /// Custom timeout in seconds, overrides outgoing.request_timeout
    #[serde(default)]
    pub timeout: Option<f64>,
}

impl ProviderEndpoint {
    pub fn for_provider(provider: ProviderId) -> Self {
        Self {
            endpoint: provider.default_endpoint().to_string(),
            timeout: None,
        }
    }
}

/// Diagnostics settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    /// Record a structured per-request trace
    pub enabled: bool,
}

/// Whether `seconds` is usable as a request timeout
pub fn is_valid_timeout(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0 && seconds <= crate::MAX_TIMEOUT as f64
}

fn check_timeout(name: &str, seconds: f64) -> Result<()> {
    if !is_valid_timeout(seconds) {
        anyhow::bail!(
            "{} must be greater than 0 and at most {} seconds",
            name,
            crate::MAX_TIMEOUT
        );
    }
    Ok(())
}

/// Convert a timeout in seconds, capped at [`crate::MAX_TIMEOUT`].
/// Values that were never validated cannot panic here.
pub fn timeout_duration(seconds: f64) -> Duration {
    let max = Duration::from_secs(crate::MAX_TIMEOUT);
    Duration::try_from_secs_f64(seconds)
        .map(|timeout| timeout.min(max))
        .unwrap_or(max)
}

/// Interpret an environment flag value
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    TRUTHY.contains(&value.as_str())
}
