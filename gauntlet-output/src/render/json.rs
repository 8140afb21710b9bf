//! Pretty JSON rendering of the structured report

use crate::errors::{RenderError, RenderResult};
use gauntlet_engine::AggregatedReport;

pub fn render(report: &AggregatedReport) -> RenderResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| RenderError::Serialization {
        format: "json".to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sample;

    #[test]
    fn test_json_is_the_structured_report() {
        let report = sample::report();
        let rendered = render(&report).unwrap();

        let parsed: AggregatedReport = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, report);

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["backend_a"]["success_rate"], "95.00%");
        assert_eq!(value["comparison"]["winner_p95_response"], "elixir");
        assert!(value["user_type_metrics"]["migrated"].is_null());
        assert!(rendered.contains("\n  \"test_info\""));
    }
}
