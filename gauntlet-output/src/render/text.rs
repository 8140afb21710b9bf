//! Console summary, optionally colored

use super::{fmt_ms, verdict_label};
use colored::{Color, Colorize};
use gauntlet_engine::{AggregatedReport, BackendReport};
use std::fmt::Write;

const INDENT: &str = " ";

pub fn render(report: &AggregatedReport, colors: bool) -> String {
    let paint = Painter { enabled: colors };
    let mut out = String::new();
    let info = &report.test_info;

    let _ = writeln!(
        out,
        "\n{}{}",
        INDENT,
        paint.bold(&format!(
            "gauntlet: {} vs {}",
            report.backend_a.label, report.backend_b.label
        ))
    );
    let _ = writeln!(
        out,
        "{}run {} | {:.2}s | {} requests\n",
        INDENT, info.run_id, info.duration_secs, report.total_requests
    );

    for s in &info.scenarios {
        let _ = writeln!(
            out,
            "{}scenario {:<20} iterations={:<8} peak_vus={:<5} forced_stops={}",
            INDENT, s.name, s.iterations, s.peak_vus, s.forced_stops
        );
    }
    out.push('\n');

    backend_block(&mut out, &report.backend_a, &paint);
    backend_block(&mut out, &report.backend_b, &paint);

    let _ = writeln!(out, "{}{}", INDENT, paint.bold("comparison"));
    let rows = [
        ("avg response", &report.comparison.winner_avg_response),
        ("p95 response", &report.comparison.winner_p95_response),
        ("success rate", &report.comparison.winner_success_rate),
    ];
    for (criterion, winner) in rows {
        let _ = writeln!(
            out,
            "{0}{0}{1:.<24} {2}",
            INDENT,
            criterion,
            paint.color(winner, Color::Cyan)
        );
    }
    out.push('\n');

    let _ = writeln!(out, "{}{}", INDENT, paint.bold("user types"));
    for (category, times) in &report.user_type_metrics {
        let _ = writeln!(
            out,
            "{0}{0}{1:.<24} avg={2} p95={3}",
            INDENT,
            category,
            fmt_ms(times.map(|t| t.avg)),
            fmt_ms(times.map(|t| t.p95))
        );
    }
    let _ = writeln!(
        out,
        "{0}{0}{1:.<24} {2} ({3} passed, {4} failed)\n",
        INDENT, "checks", report.checks.pass_rate, report.checks.passes, report.checks.fails
    );

    let _ = writeln!(out, "{}{}", INDENT, paint.bold("thresholds"));
    for verdict in report.thresholds.metrics.values() {
        for predicate in &verdict.predicates {
            let mark = if predicate.passed {
                paint.color("✓", Color::Green)
            } else {
                paint.color("✗", Color::Red)
            };
            let _ = writeln!(
                out,
                "{0}{0}{1} {2} {3} observed={4}",
                INDENT,
                mark,
                verdict.metric,
                predicate.predicate,
                fmt_ms(predicate.observed)
            );
        }
    }

    let overall = if report.passed() {
        paint.color("all thresholds passed", Color::Green)
    } else {
        paint.color("some thresholds failed", Color::Red)
    };
    let _ = writeln!(out, "\n{}{}", INDENT, overall);
    out
}

fn backend_block(out: &mut String, backend: &BackendReport, paint: &Painter) {
    let _ = writeln!(out, "{}{}", INDENT, paint.bold(&backend.label));
    let _ = writeln!(
        out,
        "{0}{0}{1:.<24} {2} ({3} ok, {4} failed)",
        INDENT,
        "requests",
        backend.total_requests,
        backend.successful_requests,
        backend.failed_requests
    );
    let _ = writeln!(out, "{0}{0}{1:.<24} {2}", INDENT, "success rate", backend.success_rate);
    let _ = writeln!(out, "{0}{0}{1:.<24} {2}", INDENT, "error rate", backend.error_rate);

    match &backend.response_times {
        Some(t) => {
            let _ = writeln!(
                out,
                concat!(
                    "{0}{0}{1:.<24} avg={2:.2} min={3:.2} med={4:.2} max={5:.2} ",
                    "p(90)={6:.2} p(95)={7:.2} p(99)={8:.2}"
                ),
                INDENT, "login duration", t.avg, t.min, t.p50, t.max, t.p90, t.p95, t.p99
            );
        }
        None => {
            let _ = writeln!(out, "{0}{0}{1:.<24} no samples", INDENT, "login duration");
        }
    }

    for verdict in &backend.thresholds {
        let label = verdict_label(verdict.passed);
        let label = if verdict.passed {
            paint.color(label, Color::Green)
        } else {
            paint.color(label, Color::Red)
        };
        let _ = writeln!(out, "{0}{0}{1:.<24} {2}", INDENT, verdict.metric, label);
    }
    out.push('\n');
}

struct Painter {
    enabled: bool,
}

impl Painter {
    fn color(&self, text: &str, color: Color) -> String {
        if self.enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.enabled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}
