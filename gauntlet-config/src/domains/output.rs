//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where and how run reports are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving report artifacts
    pub results_dir: String,

    /// Formats written to `results_dir`
    pub formats: Vec<ReportFormat>,

    /// Whether to print the console summary to stdout
    #[serde(default = "crate::domains::utils::default_true")]
    pub stdout_summary: bool,

    /// Whether to create `results_dir` when missing
    #[serde(default = "crate::domains::utils::default_true")]
    pub create_dirs: bool,

    /// Whether an existing artifact with the same name may be replaced
    #[serde(default = "crate::domains::utils::default_false")]
    pub overwrite: bool,
}

/// Artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
    Text,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: "test_results".to_string(),
            formats: vec![ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Html],
            stdout_summary: true,
            create_dirs: true,
            overwrite: false,
        }
    }
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
            ReportFormat::Html => "html",
            ReportFormat::Text => "text",
        }
    }

    /// File extension used for artifacts of this format
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
            ReportFormat::Text => "txt",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "text" | "txt" => Ok(ReportFormat::Text),
            _ => Err(format!("Invalid report format: {}", s)),
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.results_dir, "results_dir", self.domain_name())?;

        if self.formats.is_empty() && !self.stdout_summary {
            return Err(self.validation_error(
                "no report would be produced: enable stdout_summary or list at least one format",
            ));
        }

        for (i, format) in self.formats.iter().enumerate() {
            if self.formats[..i].contains(format) {
                return Err(self.validation_error(format!("format '{}' listed twice", format)));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}
