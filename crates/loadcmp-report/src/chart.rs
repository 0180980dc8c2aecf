//! Comparison chart rendered as a standalone SVG.
//!
//! Hand-rolled on purpose: the chart is four pairs of bars with labels, and
//! an SVG string keeps the artifact self-contained and diffable.

use loadcmp_monitor::ResourceSummary;

const CHART_WIDTH: u32 = 640;
const CHART_HEIGHT: u32 = 320;
const GROUP_WIDTH: u32 = 150;
const BAR_WIDTH: u32 = 48;
const BAR_AREA_HEIGHT: f64 = 220.0;
const BASELINE_Y: u32 = 260;

const BASELINE_COLOR: &str = "#4c78a8";
const INSTRUMENTED_COLOR: &str = "#e45756";

struct MetricPair {
    label: &'static str,
    baseline: f64,
    instrumented: f64,
}

fn pairs(baseline: &ResourceSummary, instrumented: &ResourceSummary) -> Vec<MetricPair> {
    let process = |s: &ResourceSummary, pick: fn(&loadcmp_monitor::ProcessSummary) -> f64| {
        s.process_summary
            .values()
            .max_by_key(|p| p.samples)
            .map(pick)
            .unwrap_or(0.0)
    };
    vec![
        MetricPair {
            label: "System CPU %",
            baseline: baseline.system_summary.avg_cpu_percent,
            instrumented: instrumented.system_summary.avg_cpu_percent,
        },
        MetricPair {
            label: "System Mem %",
            baseline: baseline.system_summary.avg_memory_percent,
            instrumented: instrumented.system_summary.avg_memory_percent,
        },
        MetricPair {
            label: "Process CPU %",
            baseline: process(baseline, |p| p.avg_cpu_percent),
            instrumented: process(instrumented, |p| p.avg_cpu_percent),
        },
        MetricPair {
            label: "Process Mem MB",
            baseline: process(baseline, |p| p.avg_memory_mb),
            instrumented: process(instrumented, |p| p.avg_memory_mb),
        },
    ]
}

fn bar(x: u32, value: f64, scale_max: f64, color: &str) -> String {
    let height = if scale_max > 0.0 {
        (value / scale_max * BAR_AREA_HEIGHT).round() as u32
    } else {
        0
    };
    let y = BASELINE_Y - height;
    format!(
        r#"  <rect x="{x}" y="{y}" width="{BAR_WIDTH}" height="{height}" fill="{color}"/>
  <text x="{tx}" y="{ty}" font-size="11" text-anchor="middle">{value:.1}</text>
"#,
        tx = x + BAR_WIDTH / 2,
        ty = y.saturating_sub(4),
    )
}

/// Render the baseline/instrumented comparison as an SVG document. Each
/// metric pair is scaled by its own maximum so units never compete.
pub fn render_chart(baseline: &ResourceSummary, instrumented: &ResourceSummary) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CHART_WIDTH}" height="{CHART_HEIGHT}" font-family="sans-serif">
  <text x="{cx}" y="24" font-size="16" text-anchor="middle">Resource Usage Comparison</text>
  <rect x="20" y="36" width="12" height="12" fill="{BASELINE_COLOR}"/>
  <text x="38" y="46" font-size="12">without instrumentation</text>
  <rect x="220" y="36" width="12" height="12" fill="{INSTRUMENTED_COLOR}"/>
  <text x="238" y="46" font-size="12">with instrumentation</text>
  <line x1="10" y1="{BASELINE_Y}" x2="{lx}" y2="{BASELINE_Y}" stroke="gray"/>
"#,
        cx = CHART_WIDTH / 2,
        lx = CHART_WIDTH - 10,
    );

    for (i, pair) in pairs(baseline, instrumented).iter().enumerate() {
        let group_x = 20 + i as u32 * GROUP_WIDTH;
        let scale_max = pair.baseline.max(pair.instrumented);
        svg.push_str(&bar(group_x, pair.baseline, scale_max, BASELINE_COLOR));
        svg.push_str(&bar(
            group_x + BAR_WIDTH + 8,
            pair.instrumented,
            scale_max,
            INSTRUMENTED_COLOR,
        ));
        svg.push_str(&format!(
            r#"  <text x="{x}" y="{y}" font-size="12" text-anchor="middle">{label}</text>
"#,
            x = group_x + BAR_WIDTH + 4,
            y = BASELINE_Y + 18,
            label = pair.label,
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadcmp_monitor::{ProcessSummary, SystemSummary};
    use std::collections::BTreeMap;

    fn summary(cpu: f64, proc_mem: f64) -> ResourceSummary {
        let mut process_summary = BTreeMap::new();
        process_summary.insert(
            "port_8000".to_string(),
            ProcessSummary {
                avg_cpu_percent: cpu / 2.0,
                max_cpu_percent: cpu,
                avg_memory_mb: proc_mem,
                max_memory_mb: proc_mem,
                avg_threads: 4.0,
                max_threads: 4,
                samples: 10,
            },
        );
        ResourceSummary {
            duration_seconds: 10.0,
            total_samples: 10,
            system_summary: SystemSummary {
                avg_cpu_percent: cpu,
                max_cpu_percent: cpu,
                avg_memory_percent: 40.0,
                max_memory_percent: 45.0,
            },
            process_summary,
        }
    }

    #[test]
    fn test_chart_is_valid_svg_with_both_series() {
        let svg = render_chart(&summary(10.0, 100.0), &summary(12.0, 110.0));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert!(svg.contains(r#"stroke="gray""#));
        assert!(svg.contains("without instrumentation"));
        assert!(svg.contains("with instrumentation"));
        assert!(svg.contains("Process Mem MB"));
        assert!(svg.contains("110.0"));
    }

    #[test]
    fn test_all_zero_metrics_do_not_divide_by_zero() {
        let empty = ResourceSummary::default();
        let svg = render_chart(&empty, &empty);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("0.0"));
    }
}
