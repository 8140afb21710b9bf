//! Tabular Markdown rendering

use super::{fmt_ms, verdict_label};
use gauntlet_engine::{AggregatedReport, BackendReport, MetricVerdict};
use std::fmt::Write;

pub fn render(report: &AggregatedReport) -> String {
    let mut out = String::new();
    let info = &report.test_info;
    let scenarios: Vec<&str> = info.scenarios.iter().map(|s| s.name.as_str()).collect();

    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "# Load Test Report: {} vs {}\n",
        report.backend_a.label, report.backend_b.label
    );
    let _ = writeln!(out, "**Run ID:** {}  ", info.run_id);
    let _ = writeln!(out, "**Timestamp:** {}  ", info.timestamp.to_rfc3339());
    let _ = writeln!(out, "**Duration:** {:.2}s  ", info.duration_secs);
    let _ = writeln!(out, "**Scenarios:** {}  ", scenarios.join(", "));
    let _ = writeln!(out, "**Total Requests:** {}\n", report.total_requests);
    out.push_str("---\n\n");

    backend_section(&mut out, &report.backend_a);
    backend_section(&mut out, &report.backend_b);

    out.push_str("## Comparison\n\n");
    out.push_str("| Criterion | Winner |\n|-----------|--------|\n");
    let _ = writeln!(
        out,
        "| Average Response Time | **{}** |",
        report.comparison.winner_avg_response
    );
    let _ = writeln!(out, "| P95 Response Time | **{}** |", report.comparison.winner_p95_response);
    let _ = writeln!(out, "| Success Rate | **{}** |\n", report.comparison.winner_success_rate);
    out.push_str("---\n\n");

    out.push_str("## Response Times by User Type\n\n");
    for (category, times) in &report.user_type_metrics {
        let _ = writeln!(out, "### {}", category);
        match times {
            Some(t) => {
                let _ = writeln!(out, "- Requests: {}", t.count);
                let _ = writeln!(out, "- Average: {:.2}ms", t.avg);
                let _ = writeln!(out, "- P95: {:.2}ms\n", t.p95);
            }
            None => out.push_str("- No samples recorded\n\n"),
        }
    }

    out.push_str("## Checks\n\n");
    let _ = writeln!(
        out,
        "{} passed, {} failed ({})\n",
        report.checks.passes, report.checks.fails, report.checks.pass_rate
    );

    out.push_str("## Scenarios\n\n");
    out.push_str("| Scenario | Iterations | Peak VUs | Forced Stops |\n");
    out.push_str("|----------|------------|----------|--------------|\n");
    for s in &info.scenarios {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            s.name, s.iterations, s.peak_vus, s.forced_stops
        );
    }
    out.push('\n');

    out.push_str("## Thresholds\n\n");
    if report.thresholds.metrics.is_empty() {
        out.push_str("_No thresholds configured._\n\n");
    } else {
        out.push_str("| Metric | Predicate | Observed | Result |\n");
        out.push_str("|--------|-----------|----------|--------|\n");
        for verdict in report.thresholds.metrics.values() {
            threshold_rows(&mut out, verdict);
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "**Overall:** {}\n",
        if report.passed() { "PASSED" } else { "FAILED" }
    );

    out.push_str("---\n\n*Generated by gauntlet*\n");
    out
}

fn backend_section(out: &mut String, backend: &BackendReport) {
    let _ = writeln!(out, "## {} Performance\n", backend.label);
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    let _ = writeln!(out, "| **Total Requests** | {} |", backend.total_requests);
    let _ = writeln!(out, "| **Successful Requests** | {} |", backend.successful_requests);
    let _ = writeln!(out, "| **Failed Requests** | {} |", backend.failed_requests);
    let _ = writeln!(out, "| **Success Rate** | {} |", backend.success_rate);
    let _ = writeln!(out, "| **Error Rate** | {} |\n", backend.error_rate);

    out.push_str("### Response Times (ms)\n\n");
    match &backend.response_times {
        Some(t) => {
            out.push_str("| Statistic | Value |\n|-----------|-------|\n");
            let rows = [
                ("Average", t.avg),
                ("Minimum", t.min),
                ("Maximum", t.max),
                ("P50 (Median)", t.p50),
                ("P90", t.p90),
                ("P95", t.p95),
                ("P99", t.p99),
            ];
            for (name, value) in rows {
                let _ = writeln!(out, "| {} | {:.2} |", name, value);
            }
            out.push('\n');
        }
        None => out.push_str("_No latency samples recorded._\n\n"),
    }

    out.push_str("### Thresholds\n\n");
    if backend.thresholds.is_empty() {
        out.push_str("_No thresholds on this backend._\n\n");
    } else {
        for verdict in &backend.thresholds {
            for predicate in &verdict.predicates {
                let _ = writeln!(
                    out,
                    "- `{}` {}: **{}**",
                    verdict.metric,
                    predicate.predicate,
                    verdict_label(predicate.passed)
                );
            }
        }
        out.push('\n');
    }
    out.push_str("---\n\n");
}

fn threshold_rows(out: &mut String, verdict: &MetricVerdict) {
    for predicate in &verdict.predicates {
        let _ = writeln!(
            out,
            "| {} | `{}` | {} | {} |",
            verdict.metric,
            predicate.predicate,
            fmt_ms(predicate.observed),
            verdict_label(predicate.passed)
        );
    }
}
