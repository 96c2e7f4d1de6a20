//! Serper (Google results) provider implementation

use super::identity::ProviderId;
use super::traits::*;
use crate::config::ApiKey;
use crate::results::SearchResult;
use crate::search::SearchRequest;
use serde::Deserialize;
use serde_json::json;

/// Serper web search
pub struct Serper {
    endpoint: String,
}

impl Serper {
    pub fn new() -> Self {
        Self::with_endpoint(ProviderId::Serper.default_endpoint())
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Serper {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl Provider for Serper {
    fn id(&self) -> ProviderId {
        ProviderId::Serper
    }

    fn request(&self, api_key: &ApiKey, search: &SearchRequest) -> ProviderRequest {
        ProviderRequest::post(
            &self.endpoint,
            json!({
                "q": search.query,
                "num": search.num_results,
            }),
        )
        .header("X-API-KEY", api_key.expose())
    }

    fn response(&self, body: &str) -> serde_json::Result<Vec<SearchResult>> {
        let parsed: SerperResponse = serde_json::from_str(body)?;

        Ok(parsed
            .organic
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| SearchResult::new(item.title, item.link, item.snippet))
            .collect())
    }
}
