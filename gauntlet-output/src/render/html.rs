//! Visual HTML rendering through the handlebars summary template

use super::{fmt_ms, verdict_label};
use crate::errors::RenderResult;
use crate::template::{TemplateEngine, HTML_SUMMARY_TEMPLATE};
use gauntlet_engine::{AggregatedReport, BackendReport, ResponseTimes};
use serde_json::{json, Value};

pub fn render(report: &AggregatedReport, templates: &TemplateEngine) -> RenderResult<String> {
    templates.render(HTML_SUMMARY_TEMPLATE, &view_model(report))
}

/// Flattens the report into template data. Every field the template reads
/// is present, since the engine runs in strict mode.
fn view_model(report: &AggregatedReport) -> Value {
    let a = &report.backend_a;
    let b = &report.backend_b;
    let info = &report.test_info;

    let bars = vec![
        bar(
            "Average response time",
            "ms",
            a,
            b,
            |r| r.response_times.map(|t| t.avg),
            &report.comparison.winner_avg_response,
        ),
        bar(
            "P95 response time",
            "ms",
            a,
            b,
            |r| r.response_times.map(|t| t.p95),
            &report.comparison.winner_p95_response,
        ),
        bar(
            "Success rate",
            "%",
            a,
            b,
            |r| Some(success_percent(r)),
            &report.comparison.winner_success_rate,
        ),
    ];

    let categories: Vec<Value> = report
        .user_type_metrics
        .iter()
        .map(|(name, times)| {
            json!({
                "name": name,
                "count": times.map_or(0, |t| t.count),
                "avg": fmt_ms(times.map(|t| t.avg)),
                "p95": fmt_ms(times.map(|t| t.p95)),
            })
        })
        .collect();

    let thresholds: Vec<Value> = report
        .thresholds
        .metrics
        .values()
        .flat_map(|verdict| {
            verdict.predicates.iter().map(move |p| {
                json!({
                    "metric": verdict.metric,
                    "predicate": p.predicate,
                    "observed": fmt_ms(p.observed),
                    "passed": p.passed,
                    "result": verdict_label(p.passed),
                })
            })
        })
        .collect();

    let scenario_rows: Vec<Value> = info
        .scenarios
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "iterations": s.iterations,
                "peak_vus": s.peak_vus,
                "forced_stops": s.forced_stops,
            })
        })
        .collect();

    let scenario_names: Vec<&str> = info.scenarios.iter().map(|s| s.name.as_str()).collect();
    let passed = report.passed();

    json!({
        "title": format!("Load test: {} vs {}", a.label, b.label),
        "run_id": info.run_id.to_string(),
        "timestamp": info.timestamp.to_rfc3339(),
        "duration": format!("{:.2}", info.duration_secs),
        "scenarios": scenario_names.join(", "),
        "total_requests": report.total_requests,
        "overall_passed": passed,
        "overall_label": if passed { "ALL THRESHOLDS PASSED" } else { "THRESHOLDS FAILED" },
        "backends": [backend_card(a, "backend A"), backend_card(b, "backend B")],
        "bars": bars,
        "categories": categories,
        "checks": {
            "passes": report.checks.passes,
            "fails": report.checks.fails,
            "pass_rate": report.checks.pass_rate,
        },
        "scenario_rows": scenario_rows,
        "thresholds": thresholds,
    })
}

fn backend_card(backend: &BackendReport, role: &str) -> Value {
    json!({
        "label": backend.label,
        "role": role,
        "total": backend.total_requests,
        "successful": backend.successful_requests,
        "failed": backend.failed_requests,
        "success_rate": backend.success_rate,
        "error_rate": backend.error_rate,
        "has_latency": backend.response_times.is_some(),
        "latency": backend.response_times.as_ref().map(latency_rows).unwrap_or_default(),
    })
}

fn latency_rows(t: &ResponseTimes) -> Vec<Value> {
    [
        ("Average", t.avg),
        ("Minimum", t.min),
        ("Maximum", t.max),
        ("P50", t.p50),
        ("P90", t.p90),
        ("P95", t.p95),
        ("P99", t.p99),
    ]
    .into_iter()
    .map(|(name, value)| json!({ "name": name, "value": format!("{:.2}", value) }))
    .collect()
}

/// One pair of comparison bars, widths relative to the larger value
fn bar<F>(
    metric: &str,
    unit: &str,
    a: &BackendReport,
    b: &BackendReport,
    value: F,
    winner: &str,
) -> Value
where
    F: Fn(&BackendReport) -> Option<f64>,
{
    let (va, vb) = (value(a), value(b));
    let scale = va.unwrap_or(0.0).max(vb.unwrap_or(0.0));

    json!({
        "metric": metric,
        "unit": unit,
        "winner": winner,
        "a_label": a.label,
        "a_value": fmt_ms(va),
        "a_width": bar_width(va, scale),
        "b_label": b.label,
        "b_value": fmt_ms(vb),
        "b_width": bar_width(vb, scale),
    })
}

fn bar_width(value: Option<f64>, scale: f64) -> String {
    let width = match value {
        Some(v) if scale > 0.0 => v / scale * 100.0,
        _ => 0.0,
    };
    format!("{:.1}", width)
}

fn success_percent(backend: &BackendReport) -> f64 {
    if backend.total_requests == 0 {
        0.0
    } else {
        backend.successful_requests as f64 / backend.total_requests as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::sample;

    #[test]
    fn test_html_contains_comparison_bars() {
        let engine = TemplateEngine::new().unwrap();
        let html = render(&sample::report(), &engine).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Load test: elixir vs python</title>"));
        // python p95 is the larger value, so it spans the full width
        assert!(html.contains("style=\"width: 100.0%\"></span> 520.00ms"));
        assert!(html.contains("style=\"width: 92.3%\"></span> 480.00ms"));
        assert!(html.contains("THRESHOLDS FAILED"));
        assert!(html.contains("<td class=\"fail\">FAIL</td>"));
    }

    #[test]
    fn test_html_without_latency_samples() {
        let engine = TemplateEngine::new().unwrap();
        let html = render(&sample::report_without_b_traffic(), &engine).unwrap();

        assert!(html.contains("No latency samples recorded."));
        assert!(html.contains("style=\"width: 0.0%\"></span> -ms"));
        assert!(html.contains("<tr><td>migrated</td><td>0</td><td>-</td><td>-</td></tr>"));
    }

    #[test]
    fn test_bar_width() {
        assert_eq!(bar_width(Some(50.0), 200.0), "25.0");
        assert_eq!(bar_width(Some(0.0), 0.0), "0.0");
        assert_eq!(bar_width(None, 100.0), "0.0");
    }
}
