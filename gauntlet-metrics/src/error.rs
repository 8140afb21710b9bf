//! Metric sink error types

use crate::registry::MetricKind;
use thiserror::Error;

pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Metric '{0}' declared more than once")]
    DuplicateMetric(String),

    #[error("Invalid metric name '{0}'")]
    InvalidName(String),

    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("Metric '{name}' is a {actual}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: MetricKind,
        actual: MetricKind,
    },
}
