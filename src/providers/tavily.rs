//! Tavily search provider implementation

use super::identity::ProviderId;
use super::traits::*;
use crate::config::ApiKey;
use crate::results::SearchResult;
use crate::search::SearchRequest;
use serde::Deserialize;
use serde_json::json;

/// Tavily web search
pub struct Tavily {
    endpoint: String,
}

impl Tavily {
    pub fn new() -> Self {
        Self::with_endpoint(ProviderId::Tavily.default_endpoint())
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for Tavily {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

impl Provider for Tavily {
    fn id(&self) -> ProviderId {
        ProviderId::Tavily
    }

    fn request(&self, api_key: &ApiKey, search: &SearchRequest) -> ProviderRequest {
        // Answers, images and raw page content are never used downstream
        ProviderRequest::post(
            &self.endpoint,
            json!({
                "query": search.query,
                "max_results": search.num_results,
                "search_depth": "basic",
                "include_answer": false,
                "include_images": false,
                "include_raw_content": false,
            }),
        )
        .header("Authorization", format!("Bearer {}", api_key.expose()))
    }

    fn response(&self, body: &str) -> serde_json::Result<Vec<SearchResult>> {
        let parsed: TavilyResponse = serde_json::from_str(body)?;

        Ok(parsed
            .results
            .into_iter()
            .filter(|item| !item.url.is_empty())
            .map(|item| SearchResult::new(item.title, item.url, item.content))
            .collect())
    }
}
