//! Per-iteration probe configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How each virtual-user iteration probes a backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Path appended to each target's base URL
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Upper bound for the "reasonable response time" check
    #[serde(with = "humantime_serde", default = "default_latency_check")]
    pub latency_check: Duration,

    /// Upper bound of the random pause between iterations
    #[serde(with = "humantime_serde", default = "default_max_think_time")]
    pub max_think_time: Duration,

    /// Seed for reproducible identity and target sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Live progress cadence; zero disables progress lines
    #[serde(with = "humantime_serde", default = "default_progress_interval")]
    pub progress_interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            latency_check: default_latency_check(),
            max_think_time: default_max_think_time(),
            seed: None,
            progress_interval: default_progress_interval(),
        }
    }
}

impl Validatable for ProbeConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.login_path.starts_with('/') {
            return Err(self.validation_error(format!(
                "login_path must start with '/', got '{}'",
                self.login_path
            )));
        }

        validate_positive(
            self.latency_check.as_millis(),
            "latency_check",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "probe"
    }
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_latency_check() -> Duration {
    Duration::from_secs(3)
}

fn default_max_think_time() -> Duration {
    Duration::from_millis(500)
}

fn default_progress_interval() -> Duration {
    Duration::from_secs(10)
}
