//! Frozen metric state taken after a run

use crate::error::{MetricsError, MetricsResult};
use crate::registry::MetricKind;
use crate::stats::{percentile, TrendStats};
use std::collections::BTreeMap;

/// Counts behind a rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateSnapshot {
    pub trues: u64,
    pub total: u64,
}

impl RateSnapshot {
    /// Exactly 0.0 when nothing was observed
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.trues as f64 / self.total as f64
        }
    }

    pub fn falses(&self) -> u64 {
        self.total - self.trues
    }
}

/// Sorted samples of a trend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendSnapshot {
    sorted: Vec<f64>,
}

impl TrendSnapshot {
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        samples.retain(|v| v.is_finite());
        samples.sort_by(|a, b| a.total_cmp(b));
        Self { sorted: samples }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.sorted
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        percentile(&self.sorted, p)
    }

    pub fn stats(&self) -> Option<TrendStats> {
        TrendStats::from_sorted(&self.sorted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricSummary {
    Counter(u64),
    Rate(RateSnapshot),
    Trend(TrendSnapshot),
}

impl MetricSummary {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricSummary::Counter(_) => MetricKind::Counter,
            MetricSummary::Rate(_) => MetricKind::Rate,
            MetricSummary::Trend(_) => MetricKind::Trend,
        }
    }

    fn merge(&self, name: &str, other: &MetricSummary) -> MetricsResult<MetricSummary> {
        match (self, other) {
            (MetricSummary::Counter(a), MetricSummary::Counter(b)) => {
                Ok(MetricSummary::Counter(a + b))
            }
            (MetricSummary::Rate(a), MetricSummary::Rate(b)) => {
                Ok(MetricSummary::Rate(RateSnapshot {
                    trues: a.trues + b.trues,
                    total: a.total + b.total,
                }))
            }
            (MetricSummary::Trend(a), MetricSummary::Trend(b)) => {
                let mut union = Vec::with_capacity(a.len() + b.len());
                union.extend_from_slice(a.samples());
                union.extend_from_slice(b.samples());
                Ok(MetricSummary::Trend(TrendSnapshot::from_samples(union)))
            }
            _ => Err(MetricsError::KindMismatch {
                name: name.to_string(),
                expected: self.kind(),
                actual: other.kind(),
            }),
        }
    }
}

/// Name to frozen value for every declared metric
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    metrics: BTreeMap<String, MetricSummary>,
}

impl MetricsSnapshot {
    pub fn new(metrics: BTreeMap<String, MetricSummary>) -> Self {
        Self { metrics }
    }

    pub fn get(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricSummary)> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        match self.metrics.get(name)? {
            MetricSummary::Counter(value) => Some(*value),
            _ => None,
        }
    }

    pub fn rate(&self, name: &str) -> Option<RateSnapshot> {
        match self.metrics.get(name)? {
            MetricSummary::Rate(rate) => Some(*rate),
            _ => None,
        }
    }

    pub fn trend(&self, name: &str) -> Option<&TrendSnapshot> {
        match self.metrics.get(name)? {
            MetricSummary::Trend(trend) => Some(trend),
            _ => None,
        }
    }

    /// Combine two snapshots. Counters sum, rates sum their counts and trends
    /// take the multiset union, so merging is commutative and associative.
    pub fn merge(&self, other: &MetricsSnapshot) -> MetricsResult<MetricsSnapshot> {
        let mut merged = self.metrics.clone();
        for (name, summary) in &other.metrics {
            let combined = match merged.get(name) {
                Some(existing) => existing.merge(name, summary)?,
                None => summary.clone(),
            };
            merged.insert(name.clone(), combined);
        }
        Ok(MetricsSnapshot { metrics: merged })
    }
}
