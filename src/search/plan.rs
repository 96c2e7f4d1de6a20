//! Provider availability and role assignment

use super::error::SearchError;
use crate::config::Credentials;
use crate::providers::ProviderId;
use serde::Serialize;

/// Which provider to try first and which, if any, to fall back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingPlan {
    pub primary: ProviderId,
    pub secondary: Option<ProviderId>,
}

impl RoutingPlan {
    /// Derive the plan from credential presence alone.
    ///
    /// Serper is primary whenever its key is present, with Tavily as the
    /// fallback if that key is present too. Tavily alone has no fallback.
    pub fn resolve(credentials: &Credentials) -> Result<Self, SearchError> {
        let mut available = ProviderId::PREFERENCE
            .into_iter()
            .filter(|p| credentials.is_present(*p));

        let primary = available.next().ok_or(SearchError::NoProviderConfigured)?;
        let secondary = available.next();

        Ok(Self { primary, secondary })
    }
}
