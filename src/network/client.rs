//! HTTP client for making requests to search providers

use crate::config::OutgoingSettings;
use crate::providers::{ProviderRequest, ProviderResponse};
use reqwest::{Client, Response};
use std::time::Duration;

/// HTTP client wrapper shared by every provider adapter
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> reqwest::Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(settings.user_agent.clone())
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Execute a provider request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: ProviderRequest,
        timeout: Duration,
    ) -> reqwest::Result<ProviderResponse> {
        let mut req_builder = self
            .client
            .post(&request.url)
            .timeout(timeout)
            .header("Accept", "application/json");

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.json(&request.body).send().await?;

        Self::parse_response(response).await
    }

    /// Read status and body. Non-2xx statuses are not errors at this level.
    async fn parse_response(response: Response) -> reqwest::Result<ProviderResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(ProviderResponse { status, text })
    }
}
