//! Configuration module for websearch-router
//!
//! Settings come from an optional YAML file plus `WEBSEARCH_*` environment
//! overrides. Provider credentials are kept separately in [`Credentials`].

mod credentials;
mod settings;

pub use credentials::{redacted_credentials, ApiKey, Credentials};
pub use settings::*;
