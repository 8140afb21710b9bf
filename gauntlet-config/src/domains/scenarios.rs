//! Scenario (virtual-user schedule) configuration

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A named concurrency profile, selected by its `executor` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum ScenarioConfig {
    /// A fixed number of virtual users for the whole duration
    ConstantVus {
        vus: u64,
        #[serde(with = "humantime_serde")]
        duration: Duration,
        #[serde(
            with = "humantime_serde",
            default = "default_graceful_stop",
            alias = "gracefulStop"
        )]
        graceful_stop: Duration,
        #[serde(default = "default_exec")]
        exec: String,
    },
    /// Virtual users interpolated linearly through a list of stages
    RampingVus {
        #[serde(default, alias = "startVUs")]
        start_vus: u64,
        stages: Vec<StageConfig>,
        #[serde(
            with = "humantime_serde",
            default = "default_graceful_ramp_down",
            alias = "gracefulRampDown"
        )]
        graceful_ramp_down: Duration,
        #[serde(
            with = "humantime_serde",
            default = "default_graceful_stop",
            alias = "gracefulStop"
        )]
        graceful_stop: Duration,
        #[serde(default = "default_exec")]
        exec: String,
    },
}

/// One ramping stage: reach `target` VUs over `duration`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub target: u64,
}

impl StageConfig {
    pub fn new(duration: Duration, target: u64) -> Self {
        Self { duration, target }
    }
}

impl ScenarioConfig {
    /// Name of the workload each iteration runs
    pub fn exec(&self) -> &str {
        match self {
            ScenarioConfig::ConstantVus { exec, .. } | ScenarioConfig::RampingVus { exec, .. } => {
                exec
            }
        }
    }
}

impl Validatable for ScenarioConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(self.exec(), "exec", self.domain_name())?;

        match self {
            ScenarioConfig::ConstantVus { vus, duration, .. } => {
                validate_positive(*vus, "vus", self.domain_name())?;
                validate_positive(duration.as_millis(), "duration", self.domain_name())?;
            }
            ScenarioConfig::RampingVus { stages, .. } => {
                if stages.is_empty() {
                    return Err(self.validation_error("ramping-vus requires at least one stage"));
                }
                let total = stages
                    .iter()
                    .try_fold(Duration::ZERO, |acc, s| acc.checked_add(s.duration))
                    .ok_or_else(|| self.validation_error("total stage duration is out of range"))?;
                validate_positive(total.as_millis(), "total stage duration", self.domain_name())?;
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenarios"
    }
}

/// At least one scenario, each valid
pub fn validate_scenarios(scenarios: &BTreeMap<String, ScenarioConfig>) -> ConfigResult<()> {
    if scenarios.is_empty() {
        return Err(ConfigError::DomainError {
            domain: "scenarios".to_string(),
            message: "at least one scenario must be configured".to_string(),
        });
    }

    for (name, scenario) in scenarios {
        validate_required_string(name, "scenario name", "scenarios")?;
        scenario.validate().map_err(|e| ConfigError::Scenario {
            name: name.clone(),
            message: e.message(),
        })?;
    }

    Ok(())
}

/// A steady 50-VU load plus a spike to 100 VUs
pub fn default_scenarios() -> BTreeMap<String, ScenarioConfig> {
    let mut scenarios = BTreeMap::new();
    scenarios.insert(
        "constant_load".to_string(),
        ScenarioConfig::ConstantVus {
            vus: 50,
            duration: Duration::from_secs(120),
            graceful_stop: default_graceful_stop(),
            exec: default_exec(),
        },
    );
    scenarios.insert(
        "spike_test".to_string(),
        ScenarioConfig::RampingVus {
            start_vus: 10,
            stages: vec![
                StageConfig::new(Duration::from_secs(30), 100),
                StageConfig::new(Duration::from_secs(60), 100),
                StageConfig::new(Duration::from_secs(30), 10),
            ],
            graceful_ramp_down: default_graceful_ramp_down(),
            graceful_stop: default_graceful_stop(),
            exec: default_exec(),
        },
    );
    scenarios
}

fn default_graceful_stop() -> Duration {
    Duration::from_secs(30)
}

fn default_graceful_ramp_down() -> Duration {
    Duration::from_secs(30)
}

fn default_exec() -> String {
    "login".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_constant_vus() {
        let yaml = r#"
executor: constant-vus
vus: 20
duration: 1m
"#;
        let scenario: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            scenario,
            ScenarioConfig::ConstantVus {
                vus: 20,
                duration: Duration::from_secs(60),
                graceful_stop: Duration::from_secs(30),
                exec: "login".to_string(),
            }
        );
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_parse_ramping_vus_with_camel_case_aliases() {
        let yaml = r#"
executor: ramping-vus
startVUs: 10
gracefulRampDown: 5s
stages:
  - duration: 10s
    target: 50
  - duration: 10s
    target: 10
"#;
        let scenario: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        match &scenario {
            ScenarioConfig::RampingVus {
                start_vus,
                stages,
                graceful_ramp_down,
                ..
            } => {
                assert_eq!(*start_vus, 10);
                assert_eq!(stages.len(), 2);
                assert_eq!(*graceful_ramp_down, Duration::from_secs(5));
            }
            other => panic!("expected ramping-vus, got {:?}", other),
        }
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_malformed_scenarios_rejected() {
        let no_stages = ScenarioConfig::RampingVus {
            start_vus: 1,
            stages: Vec::new(),
            graceful_ramp_down: Duration::from_secs(1),
            graceful_stop: Duration::from_secs(1),
            exec: "login".to_string(),
        };
        assert!(no_stages.validate().is_err());

        let zero_vus = ScenarioConfig::ConstantVus {
            vus: 0,
            duration: Duration::from_secs(1),
            graceful_stop: Duration::from_secs(1),
            exec: "login".to_string(),
        };
        assert!(zero_vus.validate().is_err());

        assert!(validate_scenarios(&BTreeMap::new()).is_err());
    }

    #[test]
    fn test_overflowing_stage_total_is_validation_error() {
        let yaml = r#"
executor: ramping-vus
stages:
  - duration: 500000000000years
    target: 5
  - duration: 500000000000years
    target: 5
"#;
        let scenario: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("out of range"), "{}", err);

        let mut scenarios = BTreeMap::new();
        scenarios.insert("forever".to_string(), scenario);
        match validate_scenarios(&scenarios) {
            Err(ConfigError::Scenario { name, message }) => {
                assert_eq!(name, "forever");
                assert_eq!(message, "total stage duration is out of range");
            }
            other => panic!("expected scenario error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_executor_is_parse_error() {
        let yaml = "executor: per-vu-iterations\nvus: 1\n";
        assert!(serde_yaml::from_str::<ScenarioConfig>(yaml).is_err());
    }
}
