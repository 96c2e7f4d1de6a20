//! Search provider module
//!
//! Defines the provider identities, the failure classifier, the per-provider
//! wire mappings and the adapter table the router dispatches through.

mod classify;
mod identity;
mod registry;
mod traits;

// Provider implementations
pub mod serper;
pub mod tavily;

pub use classify::{classify, ClassifiedFailure, FailureKind, FailureSignal};
pub use identity::ProviderId;
pub use registry::ProviderTable;
pub use traits::*;
