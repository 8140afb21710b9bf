//! Orchestration: one engine instance owns the metric sink for its runs

use crate::error::{EngineError, EngineResult};
use crate::fixtures::{FixtureProvider, TestIdentity};
use crate::metrics::{self, ProbeMetrics};
use crate::probe::RequestExecutor;
use crate::report::{AggregatedReport, TestInfo};
use crate::scenario::ScenarioDefinition;
use crate::scheduler::{ScenarioMonitor, ScenarioRunner, ScenarioSummary, Workload};
use crate::target::{Backend, TargetSelector, Targets, UniformSelector};
use crate::threshold::{ThresholdSet, ThresholdVerdicts};
use crate::workload::LoginWorkload;
use gauntlet_config::GauntletConfig;
use gauntlet_http::HttpClient;
use gauntlet_metrics::{Counter, MetricRegistry, MetricsSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Name the built-in login workload is registered under
pub const LOGIN_WORKLOAD: &str = "login";

/// Everything a run needs, already resolved from configuration
#[derive(Debug, Clone)]
pub struct TestPlan {
    pub targets: Targets,
    pub fixtures: Vec<TestIdentity>,
    pub scenarios: Vec<ScenarioDefinition>,
    pub thresholds: BTreeMap<String, Vec<String>>,
    pub request_timeout: Duration,
    pub latency_check: Duration,
    pub max_think_time: Duration,
    pub seed: Option<u64>,
    /// Zero disables progress logging
    pub progress_interval: Duration,
}

impl TestPlan {
    pub fn from_config(config: &GauntletConfig) -> EngineResult<Self> {
        config.validate_all()?;

        let scenarios = config
            .scenarios
            .iter()
            .map(|(name, scenario)| ScenarioDefinition::from_config(name, scenario))
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self {
            targets: Targets::from_config(&config.targets, &config.probe),
            fixtures: config.fixtures.iter().map(TestIdentity::from).collect(),
            scenarios,
            thresholds: config.effective_thresholds(),
            request_timeout: config.http.timeout,
            latency_check: config.probe.latency_check,
            max_think_time: config.probe.max_think_time,
            seed: config.probe.seed,
            progress_interval: config.probe.progress_interval,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summaries: Vec<ScenarioSummary>,
    pub snapshot: MetricsSnapshot,
    pub verdicts: ThresholdVerdicts,
    pub report: AggregatedReport,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.verdicts.all_passed()
    }
}

pub struct LoadTestEngine {
    plan: TestPlan,
    targets: Arc<Targets>,
    registry: MetricRegistry,
    thresholds: ThresholdSet,
    fixtures: FixtureProvider,
    executor: Arc<RequestExecutor>,
    workloads: HashMap<String, Arc<dyn Workload>>,
    monitors: Vec<ScenarioMonitor>,
    state: EngineState,
}

impl LoadTestEngine {
    /// Validate the plan and declare every metric.
    ///
    /// Any configuration problem surfaces here, before a single worker
    /// exists.
    pub fn new(plan: TestPlan, client: Arc<dyn HttpClient>) -> EngineResult<Self> {
        if plan.scenarios.is_empty() {
            return Err(EngineError::Configuration(
                "at least one scenario is required".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for scenario in &plan.scenarios {
            scenario.validate()?;
            if !names.insert(scenario.name.as_str()) {
                return Err(EngineError::Configuration(format!(
                    "scenario '{}' defined twice",
                    scenario.name
                )));
            }
        }

        let fixtures = FixtureProvider::new(plan.fixtures.clone())?;
        let targets = Arc::new(plan.targets.clone());
        let registry = metrics::declare(MetricRegistry::builder(), &targets).build()?;
        let thresholds = ThresholdSet::parse(&plan.thresholds, |name| registry.kind_of(name))?;

        let executor = Arc::new(RequestExecutor::new(
            client,
            ProbeMetrics::resolve(&registry, &targets)?,
            plan.request_timeout,
            plan.latency_check,
        ));

        let mut engine = Self {
            plan,
            targets,
            registry,
            thresholds,
            fixtures,
            executor,
            workloads: HashMap::new(),
            monitors: Vec::new(),
            state: EngineState::Idle,
        };
        engine.set_target_selector(Arc::new(UniformSelector));
        Ok(engine)
    }

    /// Swap how the login workload chooses a backend
    pub fn set_target_selector(&mut self, selector: Arc<dyn TargetSelector>) {
        let login = LoginWorkload::new(
            Arc::clone(&self.executor),
            self.fixtures.clone(),
            Arc::clone(&self.targets),
            selector,
            self.plan.max_think_time,
        );
        self.workloads
            .insert(LOGIN_WORKLOAD.to_string(), Arc::new(login));
    }

    /// Make `workload` available to scenarios whose `exec` is `name`
    pub fn register_workload(&mut self, name: impl Into<String>, workload: Arc<dyn Workload>) {
        self.workloads.insert(name.into(), workload);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn executor(&self) -> Arc<RequestExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn fixtures(&self) -> &FixtureProvider {
        &self.fixtures
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Monitors of the current or last run
    pub fn monitors(&self) -> &[ScenarioMonitor] {
        &self.monitors
    }

    pub async fn run(&mut self) -> EngineResult<RunOutcome> {
        self.run_until(CancellationToken::new()).await
    }

    /// Run every scenario concurrently. Cancelling `shutdown` ends the
    /// scenario windows early; workers then drain as usual.
    pub async fn run_until(&mut self, shutdown: CancellationToken) -> EngineResult<RunOutcome> {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState(
                "engine already ran; call reset() before running again".to_string(),
            ));
        }

        let mut planned = Vec::with_capacity(self.plan.scenarios.len());
        for scenario in &self.plan.scenarios {
            let workload = self.workloads.get(&scenario.exec).ok_or_else(|| {
                EngineError::Configuration(format!(
                    "scenario '{}' runs unknown workload '{}'",
                    scenario.name, scenario.exec
                ))
            })?;
            planned.push((scenario.clone(), Arc::clone(workload)));
        }
        let total_requests = self.registry.counter(metrics::TOTAL_REQUESTS)?;

        let base_seed = self.plan.seed.unwrap_or_else(rand::random);
        info!(
            "Starting run: {} vs {}, scenarios [{}], seed {}",
            self.targets.label(Backend::A),
            self.targets.label(Backend::B),
            planned
                .iter()
                .map(|(s, _)| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            base_seed
        );

        self.state = EngineState::Running;
        let started = Instant::now();

        let mut runners = JoinSet::new();
        let mut seeds = StdRng::seed_from_u64(base_seed);
        self.monitors.clear();
        for (scenario, workload) in planned {
            let runner = ScenarioRunner::new(scenario, workload, seeds.random());
            self.monitors.push(runner.monitor());
            runners.spawn(runner.run(shutdown.clone()));
        }

        let progress_stop = CancellationToken::new();
        let progress = (!self.plan.progress_interval.is_zero()).then(|| {
            tokio::spawn(report_progress(
                self.monitors.clone(),
                total_requests,
                self.plan.progress_interval,
                progress_stop.clone(),
            ))
        });

        let mut summaries = Vec::with_capacity(self.monitors.len());
        while let Some(joined) = runners.join_next().await {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!("Scenario task failed: {}", e),
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));

        progress_stop.cancel();
        if let Some(handle) = progress {
            if let Err(e) = handle.await {
                error!("Progress reporter failed: {}", e);
            }
        }

        let duration = started.elapsed();
        let snapshot = self.collect();
        let verdicts = self.thresholds.evaluate(&snapshot);
        let report = AggregatedReport::build(
            TestInfo::new(duration.as_secs_f64(), &summaries),
            &snapshot,
            &self.targets,
            &verdicts,
        );
        self.state = EngineState::Completed;

        info!(
            "Run finished in {:.2}s: {} requests, thresholds {}",
            duration.as_secs_f64(),
            report.total_requests,
            if verdicts.all_passed() { "passed" } else { "FAILED" }
        );

        Ok(RunOutcome {
            summaries,
            snapshot,
            verdicts,
            report,
        })
    }

    /// Freeze the current metric state
    pub fn collect(&self) -> MetricsSnapshot {
        self.registry.snapshot()
    }

    /// Zero all metrics and allow another run
    pub fn reset(&mut self) {
        self.registry.reset();
        self.monitors.clear();
        self.state = EngineState::Idle;
    }
}

async fn report_progress(
    monitors: Vec<ScenarioMonitor>,
    total_requests: Arc<Counter>,
    every: Duration,
    stop: CancellationToken,
) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval_at(started + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let active = monitors
                    .iter()
                    .map(|m| format!("{}={}", m.name(), m.active_vus()))
                    .collect::<Vec<_>>()
                    .join(" ");
                info!(
                    elapsed_secs = started.elapsed().as_secs(),
                    total_requests = total_requests.value(),
                    "progress: active VUs {}",
                    active
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioDefinition;
    use gauntlet_http::{HttpConfig, HttpManager, MockResponse};

    fn offline_client() -> Arc<dyn HttpClient> {
        let mut manager = HttpManager::with_config(HttpConfig::default()).unwrap();
        manager.set_offline();
        manager.add_mock("http://localhost:4000/login", MockResponse::status(200));
        manager.add_mock("http://localhost:8000/login", MockResponse::status(200));
        Arc::new(manager)
    }

    fn plan() -> TestPlan {
        let mut plan = TestPlan::from_config(&GauntletConfig::default()).unwrap();
        plan.scenarios = vec![ScenarioDefinition::constant("smoke", 2, Duration::from_secs(1))];
        plan.progress_interval = Duration::ZERO;
        plan.seed = Some(1);
        plan
    }

    #[test]
    fn test_plan_from_default_config() {
        let plan = TestPlan::from_config(&GauntletConfig::default()).unwrap();
        assert_eq!(plan.scenarios.len(), 2);
        assert_eq!(plan.fixtures.len(), 5);
        assert_eq!(plan.thresholds.len(), 4);
        assert_eq!(plan.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_configuration_errors_prevent_construction() {
        let mut empty_pool = plan();
        empty_pool.fixtures.clear();
        assert!(matches!(
            LoadTestEngine::new(empty_pool, offline_client()),
            Err(EngineError::Configuration(_))
        ));

        let mut bad_threshold = plan();
        bad_threshold
            .thresholds
            .insert("ruby_login_duration".to_string(), vec!["p(95)<500".to_string()]);
        assert!(matches!(
            LoadTestEngine::new(bad_threshold, offline_client()),
            Err(EngineError::Threshold(_))
        ));

        let mut no_scenarios = plan();
        no_scenarios.scenarios.clear();
        assert!(LoadTestEngine::new(no_scenarios, offline_client()).is_err());

        let mut duplicate = plan();
        duplicate.scenarios.push(duplicate.scenarios[0].clone());
        assert!(LoadTestEngine::new(duplicate, offline_client()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_workload_rejected_before_start() {
        let mut plan = plan();
        plan.scenarios[0] = plan.scenarios[0].clone().with_exec("browse");
        let mut engine = LoadTestEngine::new(plan, offline_client()).unwrap();

        assert!(matches!(
            engine.run().await,
            Err(EngineError::Configuration(_))
        ));
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.collect().counter("total_requests"), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_collect_reset_lifecycle() {
        let mut engine = LoadTestEngine::new(plan(), offline_client()).unwrap();

        let outcome = engine.run().await.unwrap();
        assert_eq!(engine.state(), EngineState::Completed);
        let total = outcome.snapshot.counter("total_requests").unwrap();
        assert!(total > 0);
        assert_eq!(outcome.summaries.len(), 1);
        assert_eq!(outcome.report.total_requests, total);

        assert!(matches!(
            engine.run().await,
            Err(EngineError::InvalidState(_))
        ));

        engine.reset();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.collect().counter("total_requests"), Some(0));
        assert!(engine.run().await.is_ok());
    }
}
