//! Search routing module
//!
//! Resolves which providers are available, invokes the primary and falls
//! back to the secondary on transient failures.

mod error;
mod models;
mod plan;
mod router;

pub use error::SearchError;
pub use models::{SearchRequest, DEFAULT_NUM_RESULTS};
pub use plan::RoutingPlan;
pub use router::{Attempt, AttemptOutcome, RouteReport, Router};
