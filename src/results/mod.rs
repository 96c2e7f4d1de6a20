//! Result types returned by the router
//!
//! Every provider's response is normalized into [`SearchResult`].

mod types;

pub use types::*;
