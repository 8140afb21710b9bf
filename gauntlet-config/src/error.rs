//! Errors raised while loading or checking a gauntlet configuration

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {}: {error}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("config file is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `<PREFIX>_*` environment override holds an unusable value
    #[error("invalid value for {var}: {message}")]
    EnvOverride { var: String, message: String },

    /// Targets, http, probe, fixtures, logging or output rejected
    #[error("invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },

    #[error("scenario '{name}' is malformed: {message}")]
    Scenario { name: String, message: String },

    #[error("threshold on '{metric}' is malformed: {message}")]
    Threshold { metric: String, message: String },
}

impl ConfigError {
    /// The bare reason, without the domain or item prefix
    pub fn message(&self) -> String {
        match self {
            ConfigError::EnvOverride { message, .. }
            | ConfigError::DomainError { message, .. }
            | ConfigError::Scenario { message, .. }
            | ConfigError::Threshold { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
