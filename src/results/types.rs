//! Result type definitions

use crate::diagnostics::DiagnosticEntry;
use serde::{Deserialize, Serialize};

/// A single normalized search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result
    pub title: String,
    /// The URL of the result
    pub link: String,
    /// Provider snippet/preview text
    pub snippet: String,
    /// Page content, filled by a later extraction stage. Always `None` here.
    pub page_content: Option<String>,
}

impl SearchResult {
    /// Create a new result
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            page_content: None,
        }
    }
}

/// Envelope printed by the command-line tool
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Per-request trace, present only when diagnostics are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<DiagnosticEntry>>,
}

impl SearchResponse {
    /// Attach the diagnostic trace recorded for this request
    pub fn with_diagnostics(mut self, entries: Vec<DiagnosticEntry>) -> Self {
        self.diagnostics = Some(entries);
        self
    }
}

impl From<Vec<SearchResult>> for SearchResponse {
    fn from(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            diagnostics: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_content_serializes_as_null() {
        let result = SearchResult::new("Rust", "https://www.rust-lang.org/", "A language");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["title"], "Rust");
        assert_eq!(json["link"], "https://www.rust-lang.org/");
        assert!(json["page_content"].is_null());
    }

    #[test]
    fn test_response_envelope() {
        let response = SearchResponse::from(vec![SearchResult::new("a", "https://a.example", "")]);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["results"].as_array().map(Vec::len), Some(1));
        assert!(json.get("diagnostics").is_none());
    }

    #[test]
    fn test_response_envelope_carries_diagnostics() {
        let mut trace = crate::diagnostics::Diagnostics::new(true);
        trace.emit("router.done", "Search complete", serde_json::json!({ "results": 0 }));

        let response = SearchResponse::from(Vec::new()).with_diagnostics(trace.into_entries());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["diagnostics"][0]["stage"], "router.done");
        assert_eq!(json["diagnostics"][0]["data"]["results"], 0);

        let parsed: SearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.diagnostics.map(|d| d.len()), Some(1));
    }
}
