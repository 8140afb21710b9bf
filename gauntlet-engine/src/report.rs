//! Structured comparison report built from the final metric snapshot

use crate::metrics;
use crate::scheduler::ScenarioSummary;
use crate::target::{Backend, Targets};
use crate::threshold::{MetricVerdict, ThresholdVerdicts};
use chrono::{DateTime, Utc};
use gauntlet_config::IdentityCategory;
use gauntlet_metrics::{MetricsSnapshot, TrendSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Latency distribution, milliseconds rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseTimes {
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl ResponseTimes {
    /// `None` when the trend has no samples
    pub fn from_trend(trend: &TrendSnapshot) -> Option<Self> {
        let stats = trend.stats()?;
        Some(Self {
            count: stats.count,
            avg: round2(stats.avg),
            min: round2(stats.min),
            max: round2(stats.max),
            p50: round2(stats.med),
            p90: round2(stats.p90),
            p95: round2(stats.p95),
            p99: round2(stats.p99),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub iterations: u64,
    pub peak_vus: usize,
    pub forced_stops: usize,
}

impl From<&ScenarioSummary> for ScenarioInfo {
    fn from(summary: &ScenarioSummary) -> Self {
        Self {
            name: summary.name.clone(),
            iterations: summary.iterations,
            peak_vus: summary.peak_vus,
            forced_stops: summary.forced_stops,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestInfo {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub scenarios: Vec<ScenarioInfo>,
}

impl TestInfo {
    pub fn new(duration_secs: f64, scenarios: &[ScenarioSummary]) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            duration_secs,
            scenarios: scenarios.iter().map(ScenarioInfo::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendReport {
    pub label: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: String,
    pub error_rate: String,
    pub response_times: Option<ResponseTimes>,
    /// Verdicts of thresholds on this backend's metrics
    pub thresholds: Vec<MetricVerdict>,
}

/// Backend label that won each comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub winner_avg_response: String,
    pub winner_p95_response: String,
    pub winner_success_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksReport {
    pub passes: u64,
    pub fails: u64,
    pub pass_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub test_info: TestInfo,
    pub total_requests: u64,
    pub backend_a: BackendReport,
    pub backend_b: BackendReport,
    pub comparison: Comparison,
    /// Keyed by identity category
    pub user_type_metrics: BTreeMap<String, Option<ResponseTimes>>,
    pub checks: ChecksReport,
    pub thresholds: ThresholdVerdicts,
}

impl AggregatedReport {
    /// Assemble the report. Pure: reads only its arguments.
    pub fn build(
        test_info: TestInfo,
        snapshot: &MetricsSnapshot,
        targets: &Targets,
        verdicts: &ThresholdVerdicts,
    ) -> Self {
        let backend_a = backend_report(snapshot, targets.label(Backend::A), verdicts);
        let backend_b = backend_report(snapshot, targets.label(Backend::B), verdicts);

        let label_a = targets.label(Backend::A);
        let label_b = targets.label(Backend::B);
        let avg = |r: &BackendReport| r.response_times.map(|t| t.avg);
        let p95 = |r: &BackendReport| r.response_times.map(|t| t.p95);

        let comparison = Comparison {
            winner_avg_response: lower_latency_wins(avg(&backend_a), avg(&backend_b))
                .pick(label_a, label_b),
            winner_p95_response: lower_latency_wins(p95(&backend_a), p95(&backend_b))
                .pick(label_a, label_b),
            winner_success_rate: higher_rate_wins(
                success_ratio(snapshot, label_a),
                success_ratio(snapshot, label_b),
            )
            .pick(label_a, label_b),
        };

        let user_type_metrics = IdentityCategory::ALL
            .iter()
            .map(|category| {
                let times = snapshot
                    .trend(&metrics::category_duration(*category))
                    .and_then(ResponseTimes::from_trend);
                (category.as_str().to_string(), times)
            })
            .collect();

        let checks = snapshot.rate(metrics::CHECKS).unwrap_or_default();

        Self {
            test_info,
            total_requests: snapshot.counter(metrics::TOTAL_REQUESTS).unwrap_or(0),
            backend_a,
            backend_b,
            comparison,
            user_type_metrics,
            checks: ChecksReport {
                passes: checks.trues,
                fails: checks.falses(),
                pass_rate: percent(checks.rate()),
            },
            thresholds: verdicts.clone(),
        }
    }

    pub fn backend(&self, backend: Backend) -> &BackendReport {
        match backend {
            Backend::A => &self.backend_a,
            Backend::B => &self.backend_b,
        }
    }

    pub fn passed(&self) -> bool {
        self.thresholds.all_passed()
    }
}

fn backend_report(
    snapshot: &MetricsSnapshot,
    label: &str,
    verdicts: &ThresholdVerdicts,
) -> BackendReport {
    let successful = snapshot.counter(&metrics::success_count(label)).unwrap_or(0);
    let failed = snapshot.counter(&metrics::error_count(label)).unwrap_or(0);
    let error_rate = snapshot
        .rate(&metrics::error_rate(label))
        .map(|r| r.rate())
        .unwrap_or(0.0);
    let owned = metrics::backend_metric_names(label);

    BackendReport {
        label: label.to_string(),
        total_requests: successful + failed,
        successful_requests: successful,
        failed_requests: failed,
        success_rate: percent(ratio(successful, successful + failed)),
        error_rate: percent(error_rate),
        response_times: snapshot
            .trend(&metrics::login_duration(label))
            .and_then(ResponseTimes::from_trend),
        thresholds: verdicts
            .metrics
            .values()
            .filter(|v| owned.contains(&v.metric))
            .cloned()
            .collect(),
    }
}

fn success_ratio(snapshot: &MetricsSnapshot, label: &str) -> f64 {
    let successful = snapshot.counter(&metrics::success_count(label)).unwrap_or(0);
    let failed = snapshot.counter(&metrics::error_count(label)).unwrap_or(0);
    ratio(successful, successful + failed)
}

/// 0.0 when `total` is zero
fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// `0.0523` -> `"5.23%"`
pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

enum Winner {
    A,
    B,
}

impl Winner {
    fn pick(self, a: &str, b: &str) -> String {
        match self {
            Winner::A => a.to_string(),
            Winner::B => b.to_string(),
        }
    }
}

/// Strictly lower wins; ties go to B. A backend without samples only wins
/// when neither has any.
fn lower_latency_wins(a: Option<f64>, b: Option<f64>) -> Winner {
    match (a, b) {
        (Some(a), Some(b)) if a < b => Winner::A,
        (Some(_), None) => Winner::A,
        _ => Winner::B,
    }
}

/// Strictly higher wins; ties go to B
fn higher_rate_wins(a: f64, b: f64) -> Winner {
    if a > b {
        Winner::A
    } else {
        Winner::B
    }
}
