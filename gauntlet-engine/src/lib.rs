//! Load-generation and comparison engine for gauntlet
//!
//! The engine drives virtual users against two authentication backends,
//! books every probe into a shared metric sink, and once all workers have
//! drained evaluates thresholds and builds the comparison report.
//!
//! ```text
//! ScenarioRunner ─▶ VU loop ─▶ LoginWorkload ─▶ RequestExecutor ─▶ MetricRegistry
//!                                                                        │
//!               ThresholdSet / AggregatedReport ◀── snapshot ───────────┘
//! ```

pub mod engine;
pub mod error;
pub mod fixtures;
pub mod metrics;
pub mod probe;
pub mod report;
pub mod scenario;
pub mod scheduler;
pub mod target;
pub mod threshold;
pub mod workload;

pub use engine::{EngineState, LoadTestEngine, RunOutcome, TestPlan};
pub use error::{EngineError, EngineResult};
pub use fixtures::{FixtureProvider, TestIdentity};
pub use probe::{ProbeResult, RequestExecutor};
pub use report::{AggregatedReport, BackendReport, Comparison, ResponseTimes, TestInfo};
pub use scenario::{ScenarioDefinition, ScenarioKind, Stage};
pub use scheduler::{
    ScenarioMonitor, ScenarioRunner, ScenarioState, ScenarioSummary, VuContext, Workload,
};
pub use target::{Backend, FixedSelector, Target, TargetSelector, Targets, UniformSelector};
pub use threshold::{
    MetricVerdict, PredicateVerdict, ThresholdError, ThresholdSet, ThresholdVerdicts,
};
pub use workload::LoginWorkload;
