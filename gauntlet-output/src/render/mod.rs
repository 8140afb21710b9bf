//! Renderers turning an [`AggregatedReport`] into artifact content

pub mod html;
pub mod json;
pub mod markdown;
pub mod text;

use crate::artifact::{artifact_name, Artifact, STDOUT_ARTIFACT};
use crate::errors::RenderResult;
use crate::template::TemplateEngine;
use gauntlet_config::{OutputConfig, ReportFormat};
use gauntlet_engine::AggregatedReport;
use tracing::debug;

/// Renders reports in every supported format
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    templates: TemplateEngine,
}

impl ReportRenderer {
    pub fn new() -> RenderResult<Self> {
        Ok(Self {
            templates: TemplateEngine::new()?,
        })
    }

    /// Render one file format. Text is rendered without colors.
    pub fn render(&self, report: &AggregatedReport, format: ReportFormat) -> RenderResult<String> {
        match format {
            ReportFormat::Json => json::render(report),
            ReportFormat::Markdown => Ok(markdown::render(report)),
            ReportFormat::Html => html::render(report, &self.templates),
            ReportFormat::Text => Ok(text::render(report, false)),
        }
    }

    /// Colored summary for the console
    pub fn render_console(&self, report: &AggregatedReport) -> String {
        text::render(report, true)
    }

    /// Every artifact the output configuration asks for
    pub fn artifacts(
        &self,
        report: &AggregatedReport,
        config: &OutputConfig,
    ) -> RenderResult<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(config.formats.len() + 1);

        for format in &config.formats {
            let name = artifact_name(&report.test_info.timestamp, *format);
            let content = self.render(report, *format)?;
            debug!("Rendered {} ({} bytes)", name, content.len());
            artifacts.push(Artifact::new(name, *format, content));
        }

        if config.stdout_summary {
            artifacts.push(Artifact::new(
                STDOUT_ARTIFACT,
                ReportFormat::Text,
                self.render_console(report),
            ));
        }

        Ok(artifacts)
    }
}

/// Milliseconds with two decimals, or `-` when there are no samples
pub(crate) fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub(crate) fn verdict_label(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifacts_follow_config() {
        let renderer = ReportRenderer::new().unwrap();
        let report = sample::report();

        let config = OutputConfig::default();
        let artifacts = renderer.artifacts(&report, &config).unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "summary_2024-01-06T14-30-00-000Z.json",
                "summary_2024-01-06T14-30-00-000Z.md",
                "summary_2024-01-06T14-30-00-000Z.html",
                "stdout",
            ]
        );

        let config = OutputConfig {
            formats: vec![ReportFormat::Text],
            stdout_summary: false,
            ..OutputConfig::default()
        };
        let artifacts = renderer.artifacts(&report, &config).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "summary_2024-01-06T14-30-00-000Z.txt");
        assert!(!artifacts[0].content.contains('\u{1b}'));
    }

    #[test]
    fn test_fmt_ms() {
        assert_eq!(fmt_ms(Some(480.0)), "480.00");
        assert_eq!(fmt_ms(Some(1.005)), "1.00");
        assert_eq!(fmt_ms(None), "-");
    }
}
