//! Search request model

use super::error::SearchError;
use serde::{Deserialize, Serialize};

/// Number of results requested when the caller does not say
pub const DEFAULT_NUM_RESULTS: u32 = 3;

/// One search as asked for by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The search query string
    pub query: String,
    /// Upper bound on returned results; providers may return fewer
    #[serde(default = "default_num_results")]
    pub num_results: u32,
}

fn default_num_results() -> u32 {
    DEFAULT_NUM_RESULTS
}

impl SearchRequest {
    /// Create a request with the default result count
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            num_results: DEFAULT_NUM_RESULTS,
        }
    }

    /// Set the result count
    pub fn with_num_results(mut self, num_results: u32) -> Self {
        self.num_results = num_results;
        self
    }

    /// Reject requests no provider should see
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidRequest {
                reason: "query must not be empty".to_string(),
            });
        }
        if self.num_results == 0 {
            return Err(SearchError::InvalidRequest {
                reason: "num_results must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
