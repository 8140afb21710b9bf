//! Full engine runs against mock HTTP backends

use gauntlet_config::{GauntletConfig, IdentityCategory};
use gauntlet_engine::{
    Backend, FixedSelector, LoadTestEngine, ScenarioDefinition, TestIdentity, TestPlan,
};
use gauntlet_http::{HttpConfig, HttpManager};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A backend that accepts known users and refuses the invalid one
async fn well_behaved_backend(delay: Duration) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({"username": "invalid@test.com"})))
        .respond_with(ResponseTemplate::new(401).set_delay(delay))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "t"}))
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    server
}

fn plan_for(a: &MockServer, b: &MockServer) -> TestPlan {
    let mut config = GauntletConfig::default();
    config.targets.backend_a.base_url = a.uri();
    config.targets.backend_b.base_url = b.uri();
    config.probe.max_think_time = Duration::from_millis(20);
    config.probe.progress_interval = Duration::from_millis(200);
    config.probe.seed = Some(7);

    let mut plan = TestPlan::from_config(&config).unwrap();
    plan.scenarios = vec![ScenarioDefinition::constant("smoke", 4, Duration::from_millis(800))
        .with_graceful_stop(Duration::from_secs(5))];
    plan
}

fn client() -> Arc<HttpManager> {
    Arc::new(HttpManager::with_config(HttpConfig::default()).unwrap())
}

#[tokio::test]
async fn test_well_behaved_backends_pass_every_threshold() {
    let a = well_behaved_backend(Duration::from_millis(5)).await;
    let b = well_behaved_backend(Duration::from_millis(15)).await;

    let mut engine = LoadTestEngine::new(plan_for(&a, &b), client()).unwrap();
    let outcome = engine.run().await.unwrap();
    let report = &outcome.report;

    assert!(report.total_requests > 0);
    assert_eq!(
        report.total_requests,
        report.backend_a.total_requests + report.backend_b.total_requests
    );
    assert_eq!(report.backend_a.failed_requests, 0);
    assert_eq!(report.backend_b.failed_requests, 0);
    assert_eq!(report.backend_a.error_rate, "0.00%");
    assert_eq!(report.checks.pass_rate, "100.00%");
    assert!(outcome.passed(), "verdicts: {:?}", outcome.verdicts);
    assert_eq!(outcome.summaries[0].forced_stops, 0);

    let received = a.received_requests().await.unwrap_or_default().len()
        + b.received_requests().await.unwrap_or_default().len();
    assert_eq!(received as u64, report.total_requests);
}

#[tokio::test]
async fn test_backend_accepting_invalid_credentials_accumulates_errors() {
    let a = well_behaved_backend(Duration::ZERO).await;

    // Backend B lets everyone in
    let b = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&b)
        .await;

    let mut plan = plan_for(&a, &b);
    plan.fixtures = vec![TestIdentity::new(
        "invalid@test.com",
        "wrongpassword",
        IdentityCategory::Invalid,
    )];
    plan.thresholds
        .insert("invalid_user_duration".to_string(), vec!["count>0".to_string()]);

    let mut engine = LoadTestEngine::new(plan, client()).unwrap();
    let outcome = engine.run().await.unwrap();
    let report = &outcome.report;

    assert_eq!(report.backend_a.failed_requests, 0);
    assert_eq!(report.backend_b.successful_requests, 0);
    assert_eq!(report.backend_b.error_rate, "100.00%");
    assert_eq!(report.comparison.winner_success_rate, "elixir");
    assert_eq!(outcome.verdicts.passed("python_error_rate"), Some(false));
    assert_eq!(outcome.verdicts.passed("elixir_error_rate"), Some(true));
    assert_eq!(outcome.verdicts.passed("invalid_user_duration"), Some(true));
    assert!(!outcome.passed());
}

#[tokio::test]
async fn test_unreachable_backend_counts_errors_without_aborting() {
    let a = well_behaved_backend(Duration::ZERO).await;
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = listener.local_addr().unwrap().port();
    drop(listener);

    let mut plan = plan_for(&a, &a);
    plan.targets = gauntlet_engine::Targets::new(
        plan.targets.get(Backend::A).clone(),
        gauntlet_engine::Target {
            backend: Backend::B,
            label: "python".to_string(),
            url: format!("http://127.0.0.1:{}/login", dead_port),
        },
    );

    let mut engine = LoadTestEngine::new(plan, client()).unwrap();
    engine.set_target_selector(Arc::new(FixedSelector(Backend::B)));
    let outcome = engine.run().await.unwrap();

    let report = &outcome.report;
    assert!(report.backend_b.failed_requests > 0);
    assert_eq!(report.backend_b.successful_requests, 0);
    assert_eq!(report.backend_a.total_requests, 0);
    assert_eq!(report.backend_a.success_rate, "0.00%");
    assert_eq!(outcome.verdicts.passed("elixir_login_duration"), Some(false));
}
