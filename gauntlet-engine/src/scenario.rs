//! Scenario definitions and their concurrency envelope

use crate::error::{EngineError, EngineResult};
use gauntlet_config::ScenarioConfig;
use std::time::Duration;

/// Reach `target` live virtual users over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioKind {
    Constant {
        vus: u64,
        duration: Duration,
    },
    Ramping {
        start_vus: u64,
        stages: Vec<Stage>,
        graceful_ramp_down: Duration,
    },
}

/// An immutable, validated scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDefinition {
    pub name: String,
    pub kind: ScenarioKind,
    /// Workload each iteration runs
    pub exec: String,
    /// Time in-flight iterations get once the scenario window closes
    pub graceful_stop: Duration,
}

impl ScenarioDefinition {
    pub fn constant(name: impl Into<String>, vus: u64, duration: Duration) -> Self {
        Self {
            name: name.into(),
            kind: ScenarioKind::Constant { vus, duration },
            exec: "login".to_string(),
            graceful_stop: Duration::from_secs(30),
        }
    }

    pub fn ramping(name: impl Into<String>, start_vus: u64, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            kind: ScenarioKind::Ramping {
                start_vus,
                stages,
                graceful_ramp_down: Duration::from_secs(30),
            },
            exec: "login".to_string(),
            graceful_stop: Duration::from_secs(30),
        }
    }

    pub fn with_graceful_stop(mut self, graceful_stop: Duration) -> Self {
        self.graceful_stop = graceful_stop;
        self
    }

    pub fn with_graceful_ramp_down(mut self, grace: Duration) -> Self {
        if let ScenarioKind::Ramping {
            graceful_ramp_down, ..
        } = &mut self.kind
        {
            *graceful_ramp_down = grace;
        }
        self
    }

    pub fn with_exec(mut self, exec: impl Into<String>) -> Self {
        self.exec = exec.into();
        self
    }

    pub fn from_config(name: &str, config: &ScenarioConfig) -> EngineResult<Self> {
        let definition = match config {
            ScenarioConfig::ConstantVus {
                vus,
                duration,
                graceful_stop,
                exec,
            } => Self {
                name: name.to_string(),
                kind: ScenarioKind::Constant {
                    vus: *vus,
                    duration: *duration,
                },
                exec: exec.clone(),
                graceful_stop: *graceful_stop,
            },
            ScenarioConfig::RampingVus {
                start_vus,
                stages,
                graceful_ramp_down,
                graceful_stop,
                exec,
            } => Self {
                name: name.to_string(),
                kind: ScenarioKind::Ramping {
                    start_vus: *start_vus,
                    stages: stages
                        .iter()
                        .map(|s| Stage {
                            duration: s.duration,
                            target: s.target,
                        })
                        .collect(),
                    graceful_ramp_down: *graceful_ramp_down,
                },
                exec: exec.clone(),
                graceful_stop: *graceful_stop,
            },
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let invalid = |message: &str| {
            Err(EngineError::Configuration(format!(
                "scenario '{}': {}",
                self.name, message
            )))
        };

        if self.name.trim().is_empty() {
            return invalid("name cannot be empty");
        }
        if self.exec.trim().is_empty() {
            return invalid("exec cannot be empty");
        }
        match &self.kind {
            ScenarioKind::Constant { vus, duration } => {
                if *vus == 0 {
                    return invalid("vus must be greater than 0");
                }
                if duration.is_zero() {
                    return invalid("duration must be greater than 0");
                }
            }
            ScenarioKind::Ramping { stages, .. } => {
                if stages.is_empty() {
                    return invalid("at least one stage is required");
                }
                match self.checked_total_duration() {
                    None => return invalid("total stage duration is out of range"),
                    Some(total) if total.is_zero() => {
                        return invalid("stages must last longer than 0")
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Length of the active window, grace periods excluded (saturating)
    pub fn total_duration(&self) -> Duration {
        self.checked_total_duration().unwrap_or(Duration::MAX)
    }

    fn checked_total_duration(&self) -> Option<Duration> {
        match &self.kind {
            ScenarioKind::Constant { duration, .. } => Some(*duration),
            ScenarioKind::Ramping { stages, .. } => stages
                .iter()
                .try_fold(Duration::ZERO, |acc, s| acc.checked_add(s.duration)),
        }
    }

    /// Highest concurrency the scenario ever asks for
    pub fn max_vus(&self) -> u64 {
        match &self.kind {
            ScenarioKind::Constant { vus, .. } => *vus,
            ScenarioKind::Ramping {
                start_vus, stages, ..
            } => stages.iter().map(|s| s.target).fold(*start_vus, u64::max),
        }
    }

    /// Desired live VUs `elapsed` into the scenario.
    ///
    /// Ramping stages interpolate linearly from the previous stage's target
    /// (or `start_vus`) and round to the nearest VU. Past the end the last
    /// target holds.
    pub fn target_at(&self, elapsed: Duration) -> u64 {
        match &self.kind {
            ScenarioKind::Constant { vus, .. } => *vus,
            ScenarioKind::Ramping {
                start_vus, stages, ..
            } => {
                let mut from = *start_vus;
                let mut stage_start = Duration::ZERO;
                for stage in stages {
                    let stage_end = stage_start.saturating_add(stage.duration);
                    if elapsed < stage_end {
                        let progress = (elapsed - stage_start).as_secs_f64()
                            / stage.duration.as_secs_f64();
                        let from_f = from as f64;
                        let value = from_f + (stage.target as f64 - from_f) * progress;
                        return value.round().max(0.0) as u64;
                    }
                    from = stage.target;
                    stage_start = stage_end;
                }
                from
            }
        }
    }
}
