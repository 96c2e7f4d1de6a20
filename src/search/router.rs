//! Provider routing with single-shot fallback

use super::error::SearchError;
use super::models::SearchRequest;
use super::plan::RoutingPlan;
use crate::config::{Credentials, Settings};
use crate::diagnostics::Diagnostics;
use crate::network::HttpClient;
use crate::providers::{ClassifiedFailure, ProviderId, ProviderTable};
use crate::results::SearchResult;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of one provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded { results: usize },
    Failed(ClassifiedFailure),
}

/// One provider call made while routing a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: ProviderId,
    pub elapsed_ms: u64,
    pub outcome: AttemptOutcome,
}

/// Full account of a successful routed search
#[derive(Debug, Clone)]
pub struct RouteReport {
    pub request_id: String,
    pub plan: RoutingPlan,
    /// Provider whose results were returned
    pub served_by: ProviderId,
    pub results: Vec<SearchResult>,
    /// Every provider call in order, including a failed primary
    pub attempts: Vec<Attempt>,
}

impl RouteReport {
    /// Whether the results came from the fallback provider
    pub fn used_fallback(&self) -> bool {
        self.served_by != self.plan.primary
    }
}

/// Routes searches to the configured providers.
///
/// Holds no mutable state; one instance can serve concurrent requests.
pub struct Router {
    credentials: Credentials,
    providers: ProviderTable,
    diagnostics: bool,
}

impl Router {
    /// Create a router over explicit credentials and adapters
    pub fn new(credentials: Credentials, providers: ProviderTable) -> Self {
        Self {
            credentials,
            providers,
            diagnostics: false,
        }
    }

    /// Validate settings and build HTTP adapters from them
    pub fn from_settings(settings: &Settings, credentials: Credentials) -> anyhow::Result<Self> {
        settings.validate()?;
        let client = HttpClient::with_settings(&settings.outgoing)?;
        let providers = ProviderTable::from_settings(settings, &client);

        Ok(Self::new(credentials, providers).with_diagnostics(settings.diagnostics.enabled))
    }

    /// Enable or disable per-request diagnostics
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Keys this router searches with, e.g. for [`SearchError::safe_display`]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Search and return the results of whichever provider succeeded
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        self.route(request).await.map(|report| report.results)
    }

    /// Search and report which providers were tried
    pub async fn route(&self, request: &SearchRequest) -> Result<RouteReport, SearchError> {
        let mut diagnostics = Diagnostics::new(self.diagnostics);
        self.route_traced(request, &mut diagnostics).await
    }

    /// Like [`Router::route`], recording into a caller-owned trace so the
    /// entries survive a failed search
    pub async fn route_traced(
        &self,
        request: &SearchRequest,
        diagnostics: &mut Diagnostics,
    ) -> Result<RouteReport, SearchError> {
        let result = self.dispatch(request, diagnostics).await;
        if let Err(e) = &result {
            diagnostics.emit(
                "router.failed",
                &e.safe_display(&self.credentials),
                json!({ "configuration": e.is_configuration() }),
            );
        }
        result
    }

    async fn dispatch(
        &self,
        request: &SearchRequest,
        diagnostics: &mut Diagnostics,
    ) -> Result<RouteReport, SearchError> {
        request.validate()?;

        diagnostics.emit(
            "router.start",
            "Routing search",
            json!({ "num_results": request.num_results }),
        );

        let plan = match RoutingPlan::resolve(&self.credentials) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("{}", e);
                diagnostics.emit("router.plan", "No provider configured", json!({}));
                return Err(e);
            }
        };
        diagnostics.emit(
            "router.plan",
            "Resolved routing plan",
            json!({ "primary": plan.primary, "secondary": plan.secondary }),
        );
        info!(
            "Searching '{}' via {} (fallback: {})",
            request.query,
            plan.primary,
            plan.secondary.map(|p| p.display_name()).unwrap_or("none")
        );

        let mut attempts = Vec::with_capacity(2);

        let primary_failure = match self
            .attempt(plan.primary, request, &mut attempts, diagnostics)
            .await?
        {
            Ok(results) => {
                return Ok(Self::report(plan, plan.primary, results, attempts, diagnostics));
            }
            Err(failure) => failure,
        };

        let secondary = match plan.secondary {
            Some(secondary) if primary_failure.is_transient() => secondary,
            Some(_) => {
                warn!("{}; not falling back", primary_failure);
                return Err(SearchError::from_failure(primary_failure));
            }
            None => {
                warn!("{}; no fallback provider configured", primary_failure);
                return Err(SearchError::from_failure(primary_failure));
            }
        };

        warn!("{}; falling back to {}", primary_failure, secondary);
        diagnostics.emit(
            "router.fallback",
            "Primary failed transiently, trying fallback",
            json!({ "from": plan.primary, "to": secondary }),
        );

        match self
            .attempt(secondary, request, &mut attempts, diagnostics)
            .await?
        {
            Ok(results) => Ok(Self::report(plan, secondary, results, attempts, diagnostics)),
            Err(fallback) => {
                warn!("Fallback provider {} also failed: {}", secondary, fallback);
                Err(SearchError::CombinedFailure {
                    primary: primary_failure,
                    fallback,
                })
            }
        }
    }

    /// Invoke one provider and record the outcome.
    ///
    /// The outer error is only for a provider the plan chose without a key.
    async fn attempt(
        &self,
        provider: ProviderId,
        request: &SearchRequest,
        attempts: &mut Vec<Attempt>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Result<Vec<SearchResult>, ClassifiedFailure>, SearchError> {
        let api_key = self
            .credentials
            .get(provider)
            .ok_or(SearchError::NoProviderConfigured)?;

        diagnostics.emit(
            "provider.start",
            "Invoking provider",
            json!({ "provider": provider }),
        );

        let start = Instant::now();
        let result = self.providers.get(provider).invoke(api_key, request).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(results) => {
                debug!(
                    "{} returned {} results in {}ms",
                    provider,
                    results.len(),
                    elapsed_ms
                );
                diagnostics.emit(
                    "provider.success",
                    "Provider returned results",
                    json!({ "provider": provider, "results": results.len() }),
                );
                AttemptOutcome::Succeeded {
                    results: results.len(),
                }
            }
            Err(failure) => {
                diagnostics.emit(
                    "provider.failure",
                    failure.safe_message(),
                    json!({
                        "provider": provider,
                        "transient": failure.is_transient(),
                    }),
                );
                AttemptOutcome::Failed(failure.clone())
            }
        };

        attempts.push(Attempt {
            provider,
            elapsed_ms,
            outcome,
        });

        Ok(result)
    }

    fn report(
        plan: RoutingPlan,
        served_by: ProviderId,
        results: Vec<SearchResult>,
        attempts: Vec<Attempt>,
        diagnostics: &mut Diagnostics,
    ) -> RouteReport {
        diagnostics.emit(
            "router.done",
            "Search complete",
            json!({ "served_by": served_by, "results": results.len() }),
        );

        RouteReport {
            request_id: diagnostics.request_id().to_string(),
            plan,
            served_by,
            results,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::providers::{FailureSignal, ProviderAdapter};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const SERPER_KEY: &str = "serper-secret-0001";
    const TAVILY_KEY: &str = "tvly-secret-0002";

    /// Adapter with a canned outcome that counts its calls
    struct MockAdapter {
        id: ProviderId,
        outcome: Result<Vec<SearchResult>, FailureSignal>,
        calls: AtomicUsize,
        keys_seen: Mutex<Vec<String>>,
    }

    impl MockAdapter {
        fn ok(id: ProviderId, results: Vec<SearchResult>) -> Arc<Self> {
            Arc::new(Self {
                id,
                outcome: Ok(results),
                calls: AtomicUsize::new(0),
                keys_seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(id: ProviderId, signal: FailureSignal) -> Arc<Self> {
            Arc::new(Self {
                id,
                outcome: Err(signal),
                calls: AtomicUsize::new(0),
                keys_seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn invoke(
            &self,
            api_key: &ApiKey,
            _search: &SearchRequest,
        ) -> Result<Vec<SearchResult>, ClassifiedFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.keys_seen
                .lock()
                .unwrap()
                .push(api_key.expose().to_string());
            self.outcome
                .clone()
                .map_err(|signal| ClassifiedFailure::new(self.id, signal))
        }
    }

    fn results(prefix: &str, n: usize) -> Vec<SearchResult> {
        (1..=n)
            .map(|i| {
                SearchResult::new(
                    format!("{} {}", prefix, i),
                    format!("https://{}.example/{}", prefix, i),
                    "snippet",
                )
            })
            .collect()
    }

    fn both_keys() -> Credentials {
        Credentials::new()
            .with(ProviderId::Serper, SERPER_KEY)
            .with(ProviderId::Tavily, TAVILY_KEY)
    }

    fn router(
        credentials: Credentials,
        serper: &Arc<MockAdapter>,
        tavily: &Arc<MockAdapter>,
    ) -> Router {
        let table = ProviderTable::new(serper.clone(), tavily.clone());
        Router::new(credentials, table)
    }

    #[tokio::test]
    async fn test_tavily_only_uses_tavily() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 2));
        let credentials = Credentials::new().with(ProviderId::Tavily, TAVILY_KEY);
        let router = router(credentials, &serper, &tavily);

        let out = router.search(&SearchRequest::new("q")).await.unwrap();

        assert_eq!(out, results("tavily", 2));
        assert_eq!(tavily.calls(), 1);
        assert_eq!(serper.calls(), 0);
        assert_eq!(*tavily.keys_seen.lock().unwrap(), vec![TAVILY_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_single_provider_never_touches_the_other_even_on_failure() {
        for signal in [
            FailureSignal::HttpStatus(500),
            FailureSignal::HttpStatus(401),
            FailureSignal::MalformedBody,
        ] {
            let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
            let tavily = MockAdapter::failing(ProviderId::Tavily, signal);
            let credentials = Credentials::new().with(ProviderId::Tavily, TAVILY_KEY);
            let router = router(credentials, &serper, &tavily);

            assert!(router.search(&SearchRequest::new("q")).await.is_err());
            assert_eq!(tavily.calls(), 1);
            assert_eq!(serper.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_both_keys_defaults_to_serper() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let report = router.route(&SearchRequest::new("q")).await.unwrap();

        assert_eq!(report.served_by, ProviderId::Serper);
        assert!(!report.used_fallback());
        assert_eq!(report.results[0].link, "https://serper.example/1");
        assert_eq!(serper.calls(), 1);
        assert_eq!(tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_server_error_falls_back_to_tavily() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(500));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 2));
        let router = router(both_keys(), &serper, &tavily);

        let report = router.route(&SearchRequest::new("q")).await.unwrap();

        assert_eq!(report.results, results("tavily", 2));
        assert_eq!(report.served_by, ProviderId::Tavily);
        assert!(report.used_fallback());
        assert_eq!(serper.calls(), 1);
        assert_eq!(tavily.calls(), 1);

        assert_eq!(report.attempts.len(), 2);
        assert!(matches!(
            report.attempts[0].outcome,
            AttemptOutcome::Failed(ref f) if f.signal() == FailureSignal::HttpStatus(500)
        ));
        assert_eq!(
            report.attempts[1].outcome,
            AttemptOutcome::Succeeded { results: 2 }
        );
    }

    #[tokio::test]
    async fn test_every_transient_signal_falls_back() {
        for signal in [
            FailureSignal::HttpStatus(429),
            FailureSignal::HttpStatus(503),
            FailureSignal::Network { timeout: true },
            FailureSignal::Network { timeout: false },
            FailureSignal::MalformedBody,
        ] {
            let serper = MockAdapter::failing(ProviderId::Serper, signal);
            let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
            let router = router(both_keys(), &serper, &tavily);

            let out = router.search(&SearchRequest::new("q")).await.unwrap();
            assert_eq!(out, results("tavily", 1), "signal {:?}", signal);
            assert_eq!(tavily.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_auth_failure_does_not_fall_back() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(401));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let err = router.search(&SearchRequest::new("q")).await.unwrap_err();

        match err {
            SearchError::ProviderTerminal(failure) => {
                assert_eq!(failure.provider(), ProviderId::Serper);
                assert_eq!(failure.signal(), FailureSignal::HttpStatus(401));
            }
            other => panic!("expected terminal error, got {:?}", other),
        }
        assert_eq!(tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_terminal_statuses_never_fall_back() {
        for status in [400, 401, 403] {
            let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(status));
            let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
            let router = router(both_keys(), &serper, &tavily);

            let err = router.search(&SearchRequest::new("q")).await.unwrap_err();
            assert!(matches!(err, SearchError::ProviderTerminal(_)));
            assert_eq!(tavily.calls(), 0, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_empty_results_are_success_without_fallback() {
        let serper = MockAdapter::ok(ProviderId::Serper, Vec::new());
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let out = router.search(&SearchRequest::new("q")).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(Credentials::new(), &serper, &tavily);

        let err = router.search(&SearchRequest::new("q")).await.unwrap_err();

        assert!(err.is_configuration());
        let message = err.to_string();
        assert!(message.contains("SERPER_API_KEY"));
        assert!(message.contains("TAVILY_API_KEY"));
        assert_eq!(serper.calls() + tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_without_fallback_surfaces_transient_error() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(429));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let credentials = Credentials::new().with(ProviderId::Serper, SERPER_KEY);
        let router = router(credentials, &serper, &tavily);

        let err = router.search(&SearchRequest::new("q")).await.unwrap_err();

        match &err {
            SearchError::ProviderTransient(failure) => {
                assert_eq!(failure.provider(), ProviderId::Serper);
                assert_eq!(failure.signal(), FailureSignal::HttpStatus(429));
            }
            other => panic!("expected transient error, got {:?}", other),
        }
        assert_eq!(err.to_string(), "Serper search failed: HTTP 429");
        assert_eq!(serper.calls(), 1);
        assert_eq!(tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_both_fail_combines_messages_without_secrets() {
        for fallback_signal in [
            FailureSignal::HttpStatus(401),
            FailureSignal::HttpStatus(502),
            FailureSignal::Network { timeout: true },
        ] {
            let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(500));
            let tavily = MockAdapter::failing(ProviderId::Tavily, fallback_signal);
            let router = router(both_keys(), &serper, &tavily);

            let err = router.search(&SearchRequest::new("q")).await.unwrap_err();

            assert!(matches!(err, SearchError::CombinedFailure { .. }));
            let message = err.to_string();
            assert!(message.starts_with("Serper search failed: HTTP 500"));
            assert!(message.contains("fallback provider Tavily also failed"));

            for rendered in [message, format!("{:?}", err)] {
                assert!(!rendered.contains(SERPER_KEY));
                assert!(!rendered.contains(TAVILY_KEY));
            }

            // Fallback is single-shot: the primary is not retried
            assert_eq!(serper.calls(), 1);
            assert_eq!(tavily.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_invalid_request_contacts_no_provider() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let err = router.search(&SearchRequest::new("")).await.unwrap_err();

        assert!(matches!(err, SearchError::InvalidRequest { .. }));
        assert_eq!(serper.calls() + tavily.calls(), 0);
    }

    #[tokio::test]
    async fn test_diagnostics_trace_fallback() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(503));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let mut diagnostics = Diagnostics::new(true);
        let report = router
            .route_traced(&SearchRequest::new("q"), &mut diagnostics)
            .await
            .unwrap();

        let stages: Vec<&str> = diagnostics
            .entries()
            .iter()
            .map(|e| e.stage.as_str())
            .collect();
        assert_eq!(
            stages,
            vec![
                "router.start",
                "router.plan",
                "provider.start",
                "provider.failure",
                "router.fallback",
                "provider.start",
                "provider.success",
                "router.done",
            ]
        );
        assert!(diagnostics
            .entries()
            .iter()
            .all(|e| e.request_id == report.request_id));

        let trace = serde_json::to_string(diagnostics.entries()).unwrap();
        assert!(!trace.contains(SERPER_KEY));
        assert!(!trace.contains(TAVILY_KEY));
    }

    #[tokio::test]
    async fn test_diagnostics_kept_when_search_fails() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(500));
        let tavily = MockAdapter::failing(ProviderId::Tavily, FailureSignal::HttpStatus(502));
        let router = router(both_keys(), &serper, &tavily);

        let mut diagnostics = Diagnostics::new(true);
        let err = router
            .route_traced(&SearchRequest::new("q"), &mut diagnostics)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::CombinedFailure { .. }));
        let entries = diagnostics.entries();
        let last = entries.last().unwrap();
        assert_eq!(last.stage, "router.failed");
        assert_eq!(last.msg, err.to_string());
        assert_eq!(last.data["configuration"], false);
        assert_eq!(
            entries
                .iter()
                .filter(|e| e.stage == "provider.failure")
                .count(),
            2
        );

        let trace = serde_json::to_string(entries).unwrap();
        assert!(!trace.contains(SERPER_KEY));
        assert!(!trace.contains(TAVILY_KEY));
    }

    #[tokio::test]
    async fn test_failure_trace_scrubs_keys_matching_message_text() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(429));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let credentials = Credentials::new().with(ProviderId::Serper, "Serper");
        let router = router(credentials, &serper, &tavily);

        let mut diagnostics = Diagnostics::new(true);
        let err = router
            .route_traced(&SearchRequest::new("q"), &mut diagnostics)
            .await
            .unwrap_err();

        let last = diagnostics.entries().last().unwrap();
        assert_eq!(last.stage, "router.failed");
        assert!(!last.msg.contains("Serper"));
        assert_eq!(last.msg, err.safe_display(router.credentials()));
    }

    #[tokio::test]
    async fn test_configuration_failure_is_traced() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(Credentials::new(), &serper, &tavily);

        let mut diagnostics = Diagnostics::new(true);
        let err = router
            .route_traced(&SearchRequest::new("q"), &mut diagnostics)
            .await
            .unwrap_err();

        assert!(err.is_configuration());
        let last = diagnostics.entries().last().unwrap();
        assert_eq!(last.stage, "router.failed");
        assert_eq!(last.data["configuration"], true);
    }

    #[tokio::test]
    async fn test_diagnostics_off_by_default() {
        let serper = MockAdapter::ok(ProviderId::Serper, results("serper", 1));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = router(both_keys(), &serper, &tavily);

        let mut diagnostics = Diagnostics::new(router.diagnostics);
        router
            .route_traced(&SearchRequest::new("q"), &mut diagnostics)
            .await
            .unwrap();
        assert!(diagnostics.entries().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let serper = MockAdapter::failing(ProviderId::Serper, FailureSignal::HttpStatus(500));
        let tavily = MockAdapter::ok(ProviderId::Tavily, results("tavily", 1));
        let router = Arc::new(router(both_keys(), &serper, &tavily));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let router = router.clone();
                tokio::spawn(async move {
                    router
                        .search(&SearchRequest::new(format!("query {}", i)))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), results("tavily", 1));
        }
        assert_eq!(serper.calls(), 8);
        assert_eq!(tavily.calls(), 8);
    }
}
