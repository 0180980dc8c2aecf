//! Markdown table rendering for comparison reports.

use crate::impact::ImpactRecord;
use loadcmp_monitor::ResourceSummary;
use loadcmp_runner::ComparisonResult;

/// One rendered metric row: baseline value, instrumented value, impact.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub metric: &'static str,
    pub baseline: String,
    pub instrumented: String,
    pub impact: String,
}

/// Render an impact as a signed percentage. Infinity renders as `+inf%`.
pub fn format_impact(value: f64) -> String {
    if value.is_infinite() {
        "+inf%".to_string()
    } else {
        format!("{:+.1}%", value)
    }
}

fn format_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => "n/a".to_string(),
    }
}

fn format_opt_impact(value: Option<f64>) -> String {
    value.map(format_impact).unwrap_or_else(|| "n/a".to_string())
}

/// Build the metric rows. Missing data renders as `n/a`; a comparison with a
/// failed phase still produces a complete table.
pub fn summary_rows(
    comparison: &ComparisonResult,
    impact: Option<&ImpactRecord>,
) -> Vec<SummaryRow> {
    let baseline = comparison.without_instrumentation.resource_summary.as_ref();
    let instrumented = comparison.with_instrumentation.resource_summary.as_ref();

    let system = |summary: Option<&ResourceSummary>,
                  pick: fn(&ResourceSummary) -> f64,
                  unit: &str| format_opt(summary.map(pick), unit);
    let process = |summary: Option<&ResourceSummary>,
                   pick: fn(&loadcmp_monitor::ProcessSummary) -> f64,
                   unit: &str| {
        format_opt(
            summary
                .and_then(|s| s.process_summary.values().max_by_key(|p| p.samples))
                .map(pick),
            unit,
        )
    };

    vec![
        SummaryRow {
            metric: "System CPU (avg)",
            baseline: system(baseline, |s| s.system_summary.avg_cpu_percent, "%"),
            instrumented: system(instrumented, |s| s.system_summary.avg_cpu_percent, "%"),
            impact: format_opt_impact(impact.map(|i| i.system_cpu)),
        },
        SummaryRow {
            metric: "System memory (avg)",
            baseline: system(baseline, |s| s.system_summary.avg_memory_percent, "%"),
            instrumented: system(instrumented, |s| s.system_summary.avg_memory_percent, "%"),
            impact: format_opt_impact(impact.map(|i| i.system_memory)),
        },
        SummaryRow {
            metric: "Process CPU (avg)",
            baseline: process(baseline, |p| p.avg_cpu_percent, "%"),
            instrumented: process(instrumented, |p| p.avg_cpu_percent, "%"),
            impact: format_opt_impact(impact.and_then(|i| i.process_cpu)),
        },
        SummaryRow {
            metric: "Process memory (avg)",
            baseline: process(baseline, |p| p.avg_memory_mb, " MB"),
            instrumented: process(instrumented, |p| p.avg_memory_mb, " MB"),
            impact: format_opt_impact(impact.and_then(|i| i.process_memory)),
        },
        SummaryRow {
            metric: "Process threads (avg)",
            baseline: process(baseline, |p| p.avg_threads, ""),
            instrumented: process(instrumented, |p| p.avg_threads, ""),
            impact: format_opt_impact(impact.and_then(|i| i.threads)),
        },
    ]
}

/// Render rows as a Markdown pipe table.
pub fn markdown_table(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    out.push_str("| Metric | Without Instrumentation | With Instrumentation | Impact |\n");
    out.push_str("|--------|-------------------------|----------------------|--------|\n");
    for row in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.metric, row.baseline, row.instrumented, row.impact
        ));
    }
    out
}
