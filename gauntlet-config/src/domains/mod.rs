//! Domain-specific configuration modules

pub mod fixtures;
pub mod http;
pub mod logging;
pub mod output;
pub mod probe;
pub mod scenarios;
pub mod targets;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main gauntlet configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GauntletConfig {
    /// The two backends under comparison
    pub targets: targets::TargetsConfig,

    /// HTTP client configuration
    pub http: http::HttpConfig,

    /// Per-iteration probe behaviour
    pub probe: probe::ProbeConfig,

    /// Fixed pool of test identities
    #[serde(default = "fixtures::default_pool")]
    pub fixtures: Vec<fixtures::FixtureConfig>,

    /// Named scenarios, run concurrently
    #[serde(default = "scenarios::default_scenarios")]
    pub scenarios: BTreeMap<String, scenarios::ScenarioConfig>,

    /// Metric name to predicate list. When absent, the defaults are derived
    /// from the configured target labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<BTreeMap<String, Vec<String>>>,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Report output configuration
    pub output: output::OutputConfig,
}

impl Default for GauntletConfig {
    fn default() -> Self {
        Self {
            targets: targets::TargetsConfig::default(),
            http: http::HttpConfig::default(),
            probe: probe::ProbeConfig::default(),
            fixtures: fixtures::default_pool(),
            scenarios: scenarios::default_scenarios(),
            thresholds: None,
            logging: logging::LoggingConfig::default(),
            output: output::OutputConfig::default(),
        }
    }
}

impl GauntletConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.targets.validate()?;
        self.http.validate()?;
        self.probe.validate()?;
        fixtures::validate_pool(&self.fixtures)?;
        scenarios::validate_scenarios(&self.scenarios)?;
        self.validate_thresholds()?;
        self.logging.validate()?;
        self.output.validate()?;
        Ok(())
    }

    /// Thresholds in effect: the configured ones, or the defaults for the
    /// configured backend labels.
    pub fn effective_thresholds(&self) -> BTreeMap<String, Vec<String>> {
        match &self.thresholds {
            Some(thresholds) => thresholds.clone(),
            None => default_thresholds(&self.targets),
        }
    }

    fn validate_thresholds(&self) -> ConfigResult<()> {
        let Some(thresholds) = &self.thresholds else {
            return Ok(());
        };

        for (metric, predicates) in thresholds {
            validate_required_string(metric, "threshold metric name", "thresholds")?;
            let malformed = |message: &str| crate::ConfigError::Threshold {
                metric: metric.clone(),
                message: message.to_string(),
            };
            if predicates.is_empty() {
                return Err(malformed("no predicates given"));
            }
            if predicates.iter().any(|p| p.trim().is_empty()) {
                return Err(malformed("predicate cannot be empty"));
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let mut config = GauntletConfig::default();
        config.thresholds = Some(config.effective_thresholds());
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

/// p95 under 500ms and error rate under 5% for each backend
pub fn default_thresholds(targets: &targets::TargetsConfig) -> BTreeMap<String, Vec<String>> {
    let mut thresholds = BTreeMap::new();
    for target in [&targets.backend_a, &targets.backend_b] {
        thresholds.insert(
            format!("{}_login_duration", target.label),
            vec!["p(95)<500".to_string()],
        );
        thresholds.insert(
            format!("{}_error_rate", target.label),
            vec!["rate<0.05".to_string()],
        );
    }
    thresholds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GauntletConfig::default();
        assert!(config.validate_all().is_ok());
    }

    #[test]
    fn test_default_thresholds_follow_labels() {
        let mut config = GauntletConfig::default();
        config.targets.backend_a.label = "rust".to_string();

        let thresholds = config.effective_thresholds();
        assert_eq!(
            thresholds.get("rust_login_duration"),
            Some(&vec!["p(95)<500".to_string()])
        );
        assert_eq!(
            thresholds.get("python_error_rate"),
            Some(&vec!["rate<0.05".to_string()])
        );
        assert!(!thresholds.contains_key("elixir_login_duration"));
    }

    #[test]
    fn test_empty_threshold_predicates_rejected() {
        let mut config = GauntletConfig::default();
        let mut thresholds = BTreeMap::new();
        thresholds.insert("elixir_login_duration".to_string(), Vec::new());
        config.thresholds = Some(thresholds);
        match config.validate_all() {
            Err(crate::ConfigError::Threshold { metric, .. }) => {
                assert_eq!(metric, "elixir_login_duration")
            }
            other => panic!("expected threshold error, got {:?}", other),
        }
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = GauntletConfig::generate_sample();
        let parsed: GauntletConfig = serde_yaml::from_str(&sample).unwrap();
        assert!(parsed.validate_all().is_ok());
        assert_eq!(parsed.scenarios.len(), 2);
        assert_eq!(parsed.effective_thresholds().len(), 4);
    }
}
