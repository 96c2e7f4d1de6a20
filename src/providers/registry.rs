//! Fixed table of provider adapters, one slot per [`ProviderId`]

use super::identity::ProviderId;
use super::serper::Serper;
use super::tavily::Tavily;
use super::traits::{HttpAdapter, ProviderAdapter};
use crate::config::Settings;
use crate::network::HttpClient;
use std::sync::Arc;
use tracing::info;

/// Adapter for every provider variant
#[derive(Clone)]
pub struct ProviderTable {
    serper: Arc<dyn ProviderAdapter>,
    tavily: Arc<dyn ProviderAdapter>,
}

impl ProviderTable {
    /// Build a table from explicit adapters
    pub fn new(serper: Arc<dyn ProviderAdapter>, tavily: Arc<dyn ProviderAdapter>) -> Self {
        debug_assert_eq!(serper.id(), ProviderId::Serper);
        debug_assert_eq!(tavily.id(), ProviderId::Tavily);
        Self { serper, tavily }
    }

    /// Build HTTP adapters from settings, sharing one client
    pub fn from_settings(settings: &Settings, client: &HttpClient) -> Self {
        let serper = HttpAdapter::new(
            Serper::with_endpoint(&settings.providers.serper.endpoint),
            client.clone(),
            settings.provider_timeout(ProviderId::Serper),
        );
        let tavily = HttpAdapter::new(
            Tavily::with_endpoint(&settings.providers.tavily.endpoint),
            client.clone(),
            settings.provider_timeout(ProviderId::Tavily),
        );

        for provider in ProviderId::PREFERENCE {
            info!(
                "Loaded provider: {} ({})",
                provider,
                settings.providers.get(provider).endpoint
            );
        }

        Self::new(serper.shared(), tavily.shared())
    }

    /// Get the adapter for a provider
    pub fn get(&self, provider: ProviderId) -> &Arc<dyn ProviderAdapter> {
        match provider {
            ProviderId::Serper => &self.serper,
            ProviderId::Tavily => &self.tavily,
        }
    }
}
