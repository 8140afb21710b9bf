//! Post-run pass/fail rules over aggregated metrics
//!
//! A predicate reads `<aggregation> <op> <number>`, e.g. `p(95)<500` or
//! `rate < 0.05`. When a metric has no data, rate aggregations pass, trend
//! aggregations other than `count` fail, and `count` is compared as usual.

use gauntlet_metrics::{MetricKind, MetricSummary, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Cannot parse threshold '{predicate}': {reason}")]
    Parse { predicate: String, reason: String },

    #[error("Unknown aggregation '{0}'")]
    UnknownAggregation(String),

    #[error("Threshold references unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Aggregation '{aggregation}' does not apply to {kind} metric '{metric}'")]
    NotApplicable {
        metric: String,
        aggregation: String,
        kind: MetricKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Avg,
    Min,
    Max,
    Med,
    Percentile(f64),
    Rate,
    Count,
}

impl Aggregation {
    fn applies_to(&self, kind: MetricKind) -> bool {
        match self {
            Aggregation::Count => true,
            Aggregation::Rate => kind == MetricKind::Rate,
            _ => kind == MetricKind::Trend,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Percentile(p) => write!(f, "p({})", p),
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Count => f.write_str("count"),
        }
    }
}

impl FromStr for Aggregation {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => return Ok(Aggregation::Avg),
            "min" => return Ok(Aggregation::Min),
            "max" => return Ok(Aggregation::Max),
            "med" => return Ok(Aggregation::Med),
            "rate" => return Ok(Aggregation::Rate),
            "count" => return Ok(Aggregation::Count),
            _ => {}
        }

        let number = s
            .strip_prefix("p(")
            .and_then(|rest| rest.strip_suffix(')'))
            .or_else(|| s.strip_prefix('p'))
            .ok_or_else(|| ThresholdError::UnknownAggregation(s.to_string()))?;
        let p: f64 = number
            .trim()
            .parse()
            .map_err(|_| ThresholdError::UnknownAggregation(s.to_string()))?;
        if !(p > 0.0 && p <= 100.0) {
            return Err(ThresholdError::UnknownAggregation(s.to_string()));
        }
        Ok(Aggregation::Percentile(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    fn holds(&self, observed: f64, bound: f64) -> bool {
        match self {
            Comparison::Lt => observed < bound,
            Comparison::Le => observed <= bound,
            Comparison::Gt => observed > bound,
            Comparison::Ge => observed >= bound,
            Comparison::Eq => observed == bound,
            Comparison::Ne => observed != bound,
        }
    }
}

/// One parsed predicate
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPredicate {
    pub source: String,
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub bound: f64,
}

impl FromStr for ThresholdPredicate {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_error = |reason: &str| ThresholdError::Parse {
            predicate: s.to_string(),
            reason: reason.to_string(),
        };

        let op_start = s
            .find(['<', '>', '=', '!'])
            .ok_or_else(|| parse_error("missing comparison operator"))?;
        let (left, rest) = s.split_at(op_start);

        let (comparison, right) = if let Some(r) = rest.strip_prefix("<=") {
            (Comparison::Le, r)
        } else if let Some(r) = rest.strip_prefix(">=") {
            (Comparison::Ge, r)
        } else if let Some(r) = rest.strip_prefix("==") {
            (Comparison::Eq, r)
        } else if let Some(r) = rest.strip_prefix("!=") {
            (Comparison::Ne, r)
        } else if let Some(r) = rest.strip_prefix('<') {
            (Comparison::Lt, r)
        } else if let Some(r) = rest.strip_prefix('>') {
            (Comparison::Gt, r)
        } else {
            return Err(parse_error("unknown comparison operator"));
        };

        let left = left.trim();
        if left.is_empty() {
            return Err(parse_error("missing aggregation"));
        }
        let aggregation: Aggregation = left.parse()?;

        let bound: f64 = right
            .trim()
            .parse()
            .map_err(|_| parse_error("bound is not a number"))?;
        if !bound.is_finite() {
            return Err(parse_error("bound must be finite"));
        }

        Ok(Self {
            source: s.trim().to_string(),
            aggregation,
            comparison,
            bound,
        })
    }
}

impl ThresholdPredicate {
    /// Observed value and verdict against `summary`
    fn evaluate(&self, summary: &MetricSummary) -> (Option<f64>, bool) {
        let observed = match (self.aggregation, summary) {
            (Aggregation::Count, MetricSummary::Counter(value)) => Some(*value as f64),
            (Aggregation::Count, MetricSummary::Rate(rate)) => Some(rate.total as f64),
            (Aggregation::Count, MetricSummary::Trend(trend)) => Some(trend.len() as f64),
            (Aggregation::Rate, MetricSummary::Rate(rate)) => {
                if rate.total == 0 {
                    return (None, true);
                }
                Some(rate.rate())
            }
            (aggregation, MetricSummary::Trend(trend)) => match trend.stats() {
                None => None,
                Some(stats) => match aggregation {
                    Aggregation::Avg => Some(stats.avg),
                    Aggregation::Min => Some(stats.min),
                    Aggregation::Max => Some(stats.max),
                    Aggregation::Med => Some(stats.med),
                    Aggregation::Percentile(p) => trend.percentile(p),
                    Aggregation::Rate | Aggregation::Count => None,
                },
            },
            _ => None,
        };

        match observed {
            Some(value) => (Some(value), self.comparison.holds(value, self.bound)),
            None => (None, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateVerdict {
    pub predicate: String,
    pub observed: Option<f64>,
    pub passed: bool,
}

/// All predicates of one metric; passes only if every predicate passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricVerdict {
    pub metric: String,
    pub passed: bool,
    pub predicates: Vec<PredicateVerdict>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdVerdicts {
    pub metrics: BTreeMap<String, MetricVerdict>,
}

impl ThresholdVerdicts {
    pub fn all_passed(&self) -> bool {
        self.metrics.values().all(|v| v.passed)
    }

    pub fn get(&self, metric: &str) -> Option<&MetricVerdict> {
        self.metrics.get(metric)
    }

    pub fn passed(&self, metric: &str) -> Option<bool> {
        self.metrics.get(metric).map(|v| v.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &MetricVerdict> {
        self.metrics.values().filter(|v| !v.passed)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Parsed, checked thresholds ready for evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdSet {
    entries: BTreeMap<String, Vec<ThresholdPredicate>>,
}

impl ThresholdSet {
    /// Parse `thresholds` and check each against the declared metric kinds
    pub fn parse<F>(
        thresholds: &BTreeMap<String, Vec<String>>,
        kind_of: F,
    ) -> Result<Self, ThresholdError>
    where
        F: Fn(&str) -> Option<MetricKind>,
    {
        let mut entries = BTreeMap::new();
        for (metric, sources) in thresholds {
            let kind =
                kind_of(metric).ok_or_else(|| ThresholdError::UnknownMetric(metric.clone()))?;
            let mut predicates = Vec::with_capacity(sources.len());
            for source in sources {
                let predicate: ThresholdPredicate = source.parse()?;
                if !predicate.aggregation.applies_to(kind) {
                    return Err(ThresholdError::NotApplicable {
                        metric: metric.clone(),
                        aggregation: predicate.aggregation.to_string(),
                        kind,
                    });
                }
                predicates.push(predicate);
            }
            entries.insert(metric.clone(), predicates);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> ThresholdVerdicts {
        let mut metrics = BTreeMap::new();
        for (metric, predicates) in &self.entries {
            let verdicts: Vec<PredicateVerdict> = predicates
                .iter()
                .map(|predicate| {
                    let (observed, passed) = match snapshot.get(metric) {
                        Some(summary) => predicate.evaluate(summary),
                        None => (None, false),
                    };
                    PredicateVerdict {
                        predicate: predicate.source.clone(),
                        observed,
                        passed,
                    }
                })
                .collect();
            let passed = verdicts.iter().all(|v| v.passed);
            metrics.insert(
                metric.clone(),
                MetricVerdict {
                    metric: metric.clone(),
                    passed,
                    predicates: verdicts,
                },
            );
        }
        ThresholdVerdicts { metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_metrics::{MetricRegistry, MetricSample};

    fn registry() -> MetricRegistry {
        MetricRegistry::builder()
            .trend("elixir_login_duration")
            .trend("python_login_duration")
            .rate("elixir_error_rate")
            .counter("total_requests")
            .build()
            .unwrap()
    }

    fn set(
        entries: &[(&str, &[&str])],
        registry: &MetricRegistry,
    ) -> Result<ThresholdSet, ThresholdError> {
        let map = entries
            .iter()
            .map(|(m, ps)| (m.to_string(), ps.iter().map(|p| p.to_string()).collect()))
            .collect();
        ThresholdSet::parse(&map, |name| registry.kind_of(name))
    }

    #[test]
    fn test_parse_predicates() {
        let p: ThresholdPredicate = "p(95)<500".parse().unwrap();
        assert_eq!(p.aggregation, Aggregation::Percentile(95.0));
        assert_eq!(p.comparison, Comparison::Lt);
        assert_eq!(p.bound, 500.0);

        let p: ThresholdPredicate = " p99 >= 12.5 ".parse().unwrap();
        assert_eq!(p.aggregation, Aggregation::Percentile(99.0));
        assert_eq!(p.comparison, Comparison::Ge);

        let p: ThresholdPredicate = "rate != 0".parse().unwrap();
        assert_eq!(p.comparison, Comparison::Ne);

        assert!("p(95)".parse::<ThresholdPredicate>().is_err());
        assert!("p(0)<1".parse::<ThresholdPredicate>().is_err());
        assert!("p(101)<1".parse::<ThresholdPredicate>().is_err());
        assert!("median<1".parse::<ThresholdPredicate>().is_err());
        assert!("avg<fast".parse::<ThresholdPredicate>().is_err());
        assert!("<5".parse::<ThresholdPredicate>().is_err());
        assert!("avg=<5".parse::<ThresholdPredicate>().is_err());
    }

    #[test]
    fn test_unknown_metric_and_kind_checks() {
        let registry = registry();
        assert_eq!(
            set(&[("nope", &["rate<0.1"])], &registry).unwrap_err(),
            ThresholdError::UnknownMetric("nope".to_string())
        );
        assert!(matches!(
            set(&[("elixir_error_rate", &["p(95)<1"])], &registry),
            Err(ThresholdError::NotApplicable { .. })
        ));
        assert!(matches!(
            set(&[("total_requests", &["avg<1"])], &registry),
            Err(ThresholdError::NotApplicable { .. })
        ));
        assert!(set(&[("total_requests", &["count>0"])], &registry).is_ok());
    }

    #[test]
    fn test_p95_threshold_per_backend() {
        let registry = registry();
        // 100 samples each; nearest-rank p95 is the 95th value
        for i in 1..=100 {
            let a = match i {
                1..=94 => 4.0 * i as f64,
                95 => 480.0,
                _ => 580.0,
            };
            registry
                .record("elixir_login_duration", MetricSample::Value(a))
                .unwrap();
            let b = match i {
                1..=94 => 5.0 * i as f64,
                95 => 520.0,
                _ => 600.0,
            };
            registry
                .record("python_login_duration", MetricSample::Value(b))
                .unwrap();
        }

        let thresholds = set(
            &[
                ("elixir_login_duration", &["p(95)<500"]),
                ("python_login_duration", &["p(95)<500"]),
            ],
            &registry,
        )
        .unwrap();
        let verdicts = thresholds.evaluate(&registry.snapshot());

        assert_eq!(verdicts.passed("elixir_login_duration"), Some(true));
        assert_eq!(verdicts.passed("python_login_duration"), Some(false));
        assert_eq!(
            verdicts.get("python_login_duration").unwrap().predicates[0].observed,
            Some(520.0)
        );
        assert!(!verdicts.all_passed());
    }

    #[test]
    fn test_no_data_policy() {
        let registry = registry();
        let thresholds = set(
            &[
                ("elixir_error_rate", &["rate<0.05"]),
                ("elixir_login_duration", &["p(95)<500"]),
                ("python_login_duration", &["count==0"]),
            ],
            &registry,
        )
        .unwrap();
        let verdicts = thresholds.evaluate(&registry.snapshot());

        assert_eq!(verdicts.passed("elixir_error_rate"), Some(true));
        assert_eq!(verdicts.get("elixir_error_rate").unwrap().predicates[0].observed, None);
        assert_eq!(verdicts.passed("elixir_login_duration"), Some(false));
        assert_eq!(verdicts.passed("python_login_duration"), Some(true));
    }

    #[test]
    fn test_all_predicates_must_pass() {
        let registry = registry();
        for v in [100.0, 200.0, 300.0] {
            registry
                .record("elixir_login_duration", MetricSample::Value(v))
                .unwrap();
        }
        let thresholds = set(
            &[("elixir_login_duration", &["avg<250", "max<250"])],
            &registry,
        )
        .unwrap();
        let verdict = thresholds.evaluate(&registry.snapshot());
        let metric = verdict.get("elixir_login_duration").unwrap();
        assert!(!metric.passed);
        assert!(metric.predicates[0].passed);
        assert!(!metric.predicates[1].passed);
    }
}
