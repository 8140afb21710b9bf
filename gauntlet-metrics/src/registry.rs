//! Declaration and lookup of the closed set of metrics for a run

use crate::error::{MetricsError, MetricsResult};
use crate::kinds::{Counter, Rate, Trend};
use crate::snapshot::{MetricSummary, MetricsSnapshot, RateSnapshot, TrendSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Rate,
    Trend,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Counter => "counter",
            MetricKind::Rate => "rate",
            MetricKind::Trend => "trend",
        };
        f.write_str(name)
    }
}

/// One value written by name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricSample {
    Count(u64),
    Flag(bool),
    Value(f64),
}

impl MetricSample {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricSample::Count(_) => MetricKind::Counter,
            MetricSample::Flag(_) => MetricKind::Rate,
            MetricSample::Value(_) => MetricKind::Trend,
        }
    }
}

/// A declared metric and its shared accumulator
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Rate(Arc<Rate>),
    Trend(Arc<Trend>),
}

impl Metric {
    fn new(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => Metric::Counter(Arc::new(Counter::new())),
            MetricKind::Rate => Metric::Rate(Arc::new(Rate::new())),
            MetricKind::Trend => Metric::Trend(Arc::new(Trend::new())),
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Rate(_) => MetricKind::Rate,
            Metric::Trend(_) => MetricKind::Trend,
        }
    }

    fn summary(&self) -> MetricSummary {
        match self {
            Metric::Counter(counter) => MetricSummary::Counter(counter.value()),
            Metric::Rate(rate) => {
                let (trues, total) = rate.counts();
                MetricSummary::Rate(RateSnapshot { trues, total })
            }
            Metric::Trend(trend) => {
                MetricSummary::Trend(TrendSnapshot::from_samples(trend.samples()))
            }
        }
    }

    fn reset(&self) {
        match self {
            Metric::Counter(counter) => counter.reset(),
            Metric::Rate(rate) => rate.reset(),
            Metric::Trend(trend) => trend.reset(),
        }
    }
}

/// Collects metric declarations; [`build`](Self::build) checks them
#[derive(Debug, Default)]
pub struct MetricRegistryBuilder {
    declarations: Vec<(String, MetricKind)>,
}

impl MetricRegistryBuilder {
    pub fn counter(self, name: impl Into<String>) -> Self {
        self.declare(name, MetricKind::Counter)
    }

    pub fn rate(self, name: impl Into<String>) -> Self {
        self.declare(name, MetricKind::Rate)
    }

    pub fn trend(self, name: impl Into<String>) -> Self {
        self.declare(name, MetricKind::Trend)
    }

    pub fn declare(mut self, name: impl Into<String>, kind: MetricKind) -> Self {
        self.declarations.push((name.into(), kind));
        self
    }

    pub fn build(self) -> MetricsResult<MetricRegistry> {
        let mut metrics = BTreeMap::new();
        for (name, kind) in self.declarations {
            if !is_valid_name(&name) {
                return Err(MetricsError::InvalidName(name));
            }
            if metrics.contains_key(&name) {
                return Err(MetricsError::DuplicateMetric(name));
            }
            metrics.insert(name, Metric::new(kind));
        }
        debug!("Metric registry built with {} metrics", metrics.len());
        Ok(MetricRegistry { metrics })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Fixed set of named metrics.
///
/// The map is immutable after [`MetricRegistryBuilder::build`]; only the
/// accumulators behind it change, each under its own synchronisation.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, Metric>,
}

impl MetricRegistry {
    pub fn builder() -> MetricRegistryBuilder {
        MetricRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<MetricKind> {
        self.metrics.get(name).map(Metric::kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn counter(&self, name: &str) -> MetricsResult<Arc<Counter>> {
        match self.lookup(name)? {
            Metric::Counter(counter) => Ok(Arc::clone(counter)),
            other => Err(mismatch(name, MetricKind::Counter, other.kind())),
        }
    }

    pub fn rate(&self, name: &str) -> MetricsResult<Arc<Rate>> {
        match self.lookup(name)? {
            Metric::Rate(rate) => Ok(Arc::clone(rate)),
            other => Err(mismatch(name, MetricKind::Rate, other.kind())),
        }
    }

    pub fn trend(&self, name: &str) -> MetricsResult<Arc<Trend>> {
        match self.lookup(name)? {
            Metric::Trend(trend) => Ok(Arc::clone(trend)),
            other => Err(mismatch(name, MetricKind::Trend, other.kind())),
        }
    }

    /// Write one sample by name
    pub fn record(&self, name: &str, sample: MetricSample) -> MetricsResult<()> {
        match (self.lookup(name)?, sample) {
            (Metric::Counter(counter), MetricSample::Count(n)) => counter.add(n),
            (Metric::Rate(rate), MetricSample::Flag(flag)) => rate.observe(flag),
            (Metric::Trend(trend), MetricSample::Value(value)) => trend.add(value),
            (metric, sample) => return Err(mismatch(name, metric.kind(), sample.kind())),
        }
        Ok(())
    }

    /// Freeze every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::new(
            self.metrics
                .iter()
                .map(|(name, metric)| (name.clone(), metric.summary()))
                .collect(),
        )
    }

    /// Zero every accumulator, keeping declarations and outstanding handles
    pub fn reset(&self) {
        for metric in self.metrics.values() {
            metric.reset();
        }
    }

    fn lookup(&self, name: &str) -> MetricsResult<&Metric> {
        self.metrics
            .get(name)
            .ok_or_else(|| MetricsError::UnknownMetric(name.to_string()))
    }
}

fn mismatch(name: &str, expected: MetricKind, actual: MetricKind) -> MetricsError {
    MetricsError::KindMismatch {
        name: name.to_string(),
        expected,
        actual,
    }
}
