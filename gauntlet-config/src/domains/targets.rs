//! Backend target configuration

use crate::error::ConfigResult;
use crate::validation::{validate_metric_label, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// The two backends under comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    #[serde(default = "default_backend_a")]
    pub backend_a: TargetConfig,

    #[serde(default = "default_backend_b")]
    pub backend_b: TargetConfig,
}

/// A single backend under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Short label, used in reports and as metric name prefix
    pub label: String,

    /// Base URL; the login path is appended to it
    pub base_url: String,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            backend_a: default_backend_a(),
            backend_b: default_backend_b(),
        }
    }
}

impl Validatable for TargetsConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.backend_a.validate()?;
        self.backend_b.validate()?;

        if self.backend_a.label == self.backend_b.label {
            return Err(self.validation_error(format!(
                "backend labels must differ, both are '{}'",
                self.backend_a.label
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "targets"
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_metric_label(&self.label, "label", self.domain_name())?;
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "targets.backend"
    }
}

fn default_backend_a() -> TargetConfig {
    TargetConfig {
        label: "elixir".to_string(),
        base_url: "http://localhost:4000".to_string(),
    }
}

fn default_backend_b() -> TargetConfig {
    TargetConfig {
        label: "python".to_string(),
        base_url: "http://localhost:8000".to_string(),
    }
}
