//! Named artifacts produced from a report

use chrono::{DateTime, Utc};
use gauntlet_config::ReportFormat;
use std::time::Duration;

/// Artifact name routed to the console instead of the results directory
pub const STDOUT_ARTIFACT: &str = "stdout";

/// A named piece of rendered content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub format: ReportFormat,
    pub content: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, format: ReportFormat, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format,
            content: content.into(),
        }
    }

    pub fn is_stdout(&self) -> bool {
        self.name == STDOUT_ARTIFACT
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}

/// `summary_<timestamp>.<ext>`, with `:` and `.` of the RFC 3339 timestamp replaced by `-`
pub fn artifact_name(timestamp: &DateTime<Utc>, format: ReportFormat) -> String {
    format!("summary_{}.{}", file_timestamp(timestamp), format.extension())
}

fn file_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
}

/// Outcome of a successful delivery
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub artifact: String,
    pub sink: &'static str,
    /// File path or stream name the artifact ended up in
    pub location: String,
    pub size_bytes: u64,
    pub delivery_time: Duration,
}
