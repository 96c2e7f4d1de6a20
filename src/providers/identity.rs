//! Provider identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of search providers the router can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Serper,
    Tavily,
}

impl ProviderId {
    /// Routing preference, highest first. When several providers are
    /// configured the first one present becomes primary.
    pub const PREFERENCE: [ProviderId; 2] = [ProviderId::Serper, ProviderId::Tavily];

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::Serper => "serper",
            ProviderId::Tavily => "tavily",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Serper => "Serper",
            ProviderId::Tavily => "Tavily",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn credential_var(&self) -> &'static str {
        match self {
            ProviderId::Serper => "SERPER_API_KEY",
            ProviderId::Tavily => "TAVILY_API_KEY",
        }
    }

    /// Default search endpoint
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Serper => "https://google.serper.dev/search",
            ProviderId::Tavily => "https://api.tavily.com/search",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
