//! Concurrent metric sink for gauntlet
//!
//! Metrics are declared once through [`MetricRegistry::builder`] and then
//! written concurrently through typed handles. Each metric carries its own
//! synchronisation, so contention on one metric never blocks writers of
//! another. After a run, [`MetricRegistry::snapshot`] freezes everything into
//! a [`MetricsSnapshot`] from which statistics are derived.

pub mod error;
pub mod kinds;
pub mod registry;
pub mod snapshot;
pub mod stats;

pub use error::{MetricsError, MetricsResult};
pub use kinds::{Counter, Rate, Trend};
pub use registry::{Metric, MetricKind, MetricRegistry, MetricRegistryBuilder, MetricSample};
pub use snapshot::{MetricSummary, MetricsSnapshot, RateSnapshot, TrendSnapshot};
pub use stats::{percentile, TrendStats};
