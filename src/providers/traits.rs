//! Provider traits and types

use super::classify::{ClassifiedFailure, FailureSignal};
use super::identity::ProviderId;
use crate::config::ApiKey;
use crate::diagnostics::scrub_secrets;
use crate::network::HttpClient;
use crate::results::SearchResult;
use crate::search::SearchRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP request to be made for a provider. Always a JSON POST.
#[derive(Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// Request headers, including authentication
    pub headers: HashMap<String, String>,
    /// JSON body
    pub body: serde_json::Value,
}

impl ProviderRequest {
    /// Create a POST request with a JSON body
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

// Headers carry the API key, so only their names are printed.
impl std::fmt::Debug for ProviderRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut header_names: Vec<&str> = self.headers.keys().map(String::as_str).collect();
        header_names.sort_unstable();
        f.debug_struct("ProviderRequest")
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body", &self.body)
            .finish()
    }
}

/// HTTP response from a provider request
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ProviderResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Wire mapping for one search provider
pub trait Provider: Send + Sync {
    /// Which provider this is
    fn id(&self) -> ProviderId;

    /// Build the HTTP request for a search
    fn request(&self, api_key: &ApiKey, search: &SearchRequest) -> ProviderRequest;

    /// Parse a 2xx response body into results, in provider ranking order
    fn response(&self, body: &str) -> serde_json::Result<Vec<SearchResult>>;
}

/// Uniform "search with provider X" capability consumed by the router
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to
    fn id(&self) -> ProviderId;

    /// Run one search. An empty result list is a success.
    async fn invoke(
        &self,
        api_key: &ApiKey,
        search: &SearchRequest,
    ) -> Result<Vec<SearchResult>, ClassifiedFailure>;
}

/// Adapter that runs a [`Provider`] mapping over HTTP
pub struct HttpAdapter<P> {
    provider: P,
    client: HttpClient,
    timeout: Duration,
}

impl<P: Provider> HttpAdapter<P> {
    pub fn new(provider: P, client: HttpClient, timeout: Duration) -> Self {
        Self {
            provider,
            client,
            timeout,
        }
    }

    /// Wrap into a shareable trait object
    pub fn shared(self) -> Arc<dyn ProviderAdapter>
    where
        P: 'static,
    {
        Arc::new(self)
    }
}

#[async_trait]
impl<P: Provider> ProviderAdapter for HttpAdapter<P> {
    fn id(&self) -> ProviderId {
        self.provider.id()
    }

    async fn invoke(
        &self,
        api_key: &ApiKey,
        search: &SearchRequest,
    ) -> Result<Vec<SearchResult>, ClassifiedFailure> {
        let provider = self.provider.id();
        let request = self.provider.request(api_key, search);
        let secrets = [api_key.expose()];

        debug!(
            "Sending {} request to {} with timeout {:?}",
            provider, request.url, self.timeout
        );

        // reqwest enforces the per-request timeout and reports it via is_timeout()
        let response = match self.client.execute_with_timeout(request, self.timeout).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Request to {} failed: {}",
                    provider,
                    scrub_secrets(&e.to_string(), &secrets)
                );
                return Err(ClassifiedFailure::new(
                    provider,
                    FailureSignal::Network {
                        timeout: e.is_timeout(),
                    },
                ));
            }
        };

        if !response.is_success() {
            warn!("{} returned HTTP {}", provider, response.status);
            return Err(ClassifiedFailure::new(
                provider,
                FailureSignal::HttpStatus(response.status),
            ));
        }

        let mut results = self.provider.response(&response.text).map_err(|e| {
            warn!(
                "Failed to parse response from {}: {}",
                provider,
                scrub_secrets(&e.to_string(), &secrets)
            );
            ClassifiedFailure::new(provider, FailureSignal::MalformedBody)
        })?;

        results.truncate(search.num_results as usize);
        debug!("{} returned {} results", provider, results.len());

        Ok(results)
    }
}
