//! One authentication probe against one backend

use crate::fixtures::TestIdentity;
use crate::metrics::ProbeMetrics;
use crate::target::{Backend, Target};
use gauntlet_config::IdentityCategory;
use gauntlet_http::HttpClient;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a single probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub backend: Backend,
    pub category: IdentityCategory,
    /// Named scope for filtering, e.g. `"elixir login"`
    pub scope: String,
    /// HTTP status, 0 when no response arrived
    pub status: u16,
    pub latency_ms: f64,
    /// The status matched the identity's expected status
    pub success: bool,
    /// `success` and the latency stayed under the check bound
    pub check_passed: bool,
    pub error: Option<String>,
}

/// Sends login probes and books their outcomes
pub struct RequestExecutor {
    client: Arc<dyn HttpClient>,
    metrics: ProbeMetrics,
    timeout: Duration,
    latency_check: Duration,
}

impl RequestExecutor {
    pub fn new(
        client: Arc<dyn HttpClient>,
        metrics: ProbeMetrics,
        timeout: Duration,
        latency_check: Duration,
    ) -> Self {
        Self {
            client,
            metrics,
            timeout,
            latency_check,
        }
    }

    /// Probe `target` with `identity`.
    ///
    /// Never fails: network errors and timeouts come back as unsuccessful
    /// results and are counted as errors for the target.
    pub async fn probe(&self, target: &Target, identity: &TestIdentity) -> ProbeResult {
        let body = json!({
            "username": identity.username,
            "password": identity.password,
        });

        let started = Instant::now();
        let outcome =
            tokio::time::timeout(self.timeout, self.client.post_json(&target.url, &body)).await;
        let latency = started.elapsed();

        let (status, error) = match outcome {
            Ok(Ok(response)) => (response.status, None),
            Ok(Err(e)) => (0, Some(e.to_string())),
            Err(_) => (0, Some(format!("request timed out after {:?}", self.timeout))),
        };

        let latency_ms = latency.as_secs_f64() * 1000.0;
        let success = status != 0 && status == identity.expected_status();
        let check_passed = success && latency < self.latency_check;

        self.book(target.backend, identity.category, success, check_passed, latency_ms);

        if let Some(ref e) = error {
            debug!("Probe to {} failed: {}", target.label, e);
        } else if !success {
            debug!(
                "Probe to {} as {} user got status {} (expected {})",
                target.label,
                identity.category,
                status,
                identity.expected_status()
            );
        }

        ProbeResult {
            backend: target.backend,
            category: identity.category,
            scope: format!("{} login", target.label),
            status,
            latency_ms,
            success,
            check_passed,
            error,
        }
    }

    fn book(
        &self,
        backend: Backend,
        category: IdentityCategory,
        success: bool,
        check_passed: bool,
        latency_ms: f64,
    ) {
        let backend_metrics = self.metrics.backend(backend);

        self.metrics.total_requests.increment();
        if success {
            backend_metrics.success.increment();
        } else {
            backend_metrics.error.increment();
        }
        backend_metrics.error_rate.observe(!success);
        backend_metrics.duration.add(latency_ms);
        if let Some(trend) = self.metrics.category(category) {
            trend.add(latency_ms);
        }
        self.metrics.checks.observe(check_passed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use crate::target::Targets;
    use gauntlet_config::{ProbeConfig, TargetsConfig};
    use gauntlet_http::{HttpConfig, HttpManager, MockResponse};
    use gauntlet_metrics::MetricRegistry;

    struct Fixture {
        registry: MetricRegistry,
        targets: Targets,
        executor: RequestExecutor,
    }

    fn fixture(mocks: Vec<(&str, MockResponse)>, latency_check: Duration) -> Fixture {
        let targets = Targets::from_config(&TargetsConfig::default(), &ProbeConfig::default());
        let registry = metrics::declare(MetricRegistry::builder(), &targets)
            .build()
            .unwrap();
        let probe_metrics = ProbeMetrics::resolve(&registry, &targets).unwrap();

        let mut manager = HttpManager::with_config(HttpConfig::default()).unwrap();
        manager.set_offline();
        for (url, mock) in mocks {
            manager.add_mock(url, mock);
        }

        let executor = RequestExecutor::new(
            Arc::new(manager),
            probe_metrics,
            Duration::from_secs(10),
            latency_check,
        );
        Fixture {
            registry,
            targets,
            executor,
        }
    }

    fn invalid_identity() -> TestIdentity {
        TestIdentity::new("invalid@test.com", "wrongpassword", IdentityCategory::Invalid)
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_identity_refused_is_success() {
        let f = fixture(
            vec![(
                "http://localhost:4000/login",
                MockResponse::status(401).with_delay(Duration::from_millis(120)),
            )],
            Duration::from_secs(3),
        );

        let result = f
            .executor
            .probe(f.targets.get(Backend::A), &invalid_identity())
            .await;

        assert!(result.success);
        assert!(result.check_passed);
        assert_eq!(result.status, 401);
        assert!((result.latency_ms - 120.0).abs() < 1.0, "latency {}", result.latency_ms);
        assert_eq!(result.scope, "elixir login");

        let snapshot = f.registry.snapshot();
        assert_eq!(snapshot.counter("total_requests"), Some(1));
        assert_eq!(snapshot.counter("elixir_success"), Some(1));
        assert_eq!(snapshot.counter("elixir_error"), Some(0));
        assert_eq!(snapshot.rate("elixir_error_rate").unwrap().rate(), 0.0);
        assert_eq!(snapshot.trend("invalid_user_duration").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_identity_accepted_is_failure() {
        let f = fixture(
            vec![("http://localhost:8000/login", MockResponse::status(200))],
            Duration::from_secs(3),
        );

        let result = f
            .executor
            .probe(f.targets.get(Backend::B), &invalid_identity())
            .await;

        assert!(!result.success);
        assert!(!result.check_passed);

        let snapshot = f.registry.snapshot();
        assert_eq!(snapshot.counter("python_error"), Some(1));
        assert_eq!(snapshot.rate("python_error_rate").unwrap().rate(), 1.0);
        assert_eq!(snapshot.counter("elixir_error"), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_success_fails_check_only() {
        let f = fixture(
            vec![(
                "http://localhost:4000/login",
                MockResponse::status(200).with_delay(Duration::from_millis(500)),
            )],
            Duration::from_millis(300),
        );
        let identity =
            TestIdentity::new("user1@test.com", "password123", IdentityCategory::Migrated);

        let result = f.executor.probe(f.targets.get(Backend::A), &identity).await;

        assert!(result.success);
        assert!(!result.check_passed);
        let snapshot = f.registry.snapshot();
        assert_eq!(snapshot.counter("elixir_success"), Some(1));
        assert_eq!(snapshot.rate("checks").unwrap().rate(), 0.0);
    }

    #[tokio::test]
    async fn test_network_failure_counts_as_error() {
        let f = fixture(
            vec![("http://localhost:4000/login", MockResponse::network_failure())],
            Duration::from_secs(3),
        );
        let identity =
            TestIdentity::new("legacy1@test.com", "legacypass", IdentityCategory::Legacy);

        let result = f.executor.probe(f.targets.get(Backend::A), &identity).await;

        assert!(!result.success);
        assert_eq!(result.status, 0);
        assert!(result.error.is_some());
        assert_eq!(f.registry.snapshot().counter("elixir_error"), Some(1));
    }
}
