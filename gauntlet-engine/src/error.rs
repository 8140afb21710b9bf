//! Error types for the load-test engine

use crate::threshold::ThresholdError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that stop a run from starting.
///
/// Probe failures never appear here; they are absorbed into the metrics.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] gauntlet_metrics::MetricsError),

    #[error("HTTP client error: {0}")]
    Http(#[from] gauntlet_http::HttpError),

    #[error("Invalid engine state: {0}")]
    InvalidState(String),
}

impl From<gauntlet_config::ConfigError> for EngineError {
    fn from(err: gauntlet_config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
