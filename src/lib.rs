//! websearch-router: web search over Serper and Tavily
//!
//! A [`Router`] picks a primary provider from the configured credentials,
//! falls back to the other provider only on transient failures, and returns
//! normalized [`SearchResult`]s or a typed [`SearchError`] that never
//! contains credential values.

pub mod config;
pub mod diagnostics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;

pub use config::{Credentials, Settings};
pub use providers::{ProviderAdapter, ProviderId};
pub use results::SearchResult;
pub use search::{Router, SearchError, SearchRequest};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum timeout that can be set, in seconds
pub const MAX_TIMEOUT: u64 = 300;
