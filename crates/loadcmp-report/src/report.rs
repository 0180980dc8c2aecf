//! Markdown report generation from a persisted comparison record.

use crate::chart::render_chart;
use crate::impact::{compute_impact, Verdict};
use crate::table::{markdown_table, summary_rows};
use chrono::Utc;
use loadcmp_common::{HarnessResult, InstrumentationState};
use loadcmp_runner::{ComparisonResult, ExecutionResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of the artifacts one report run produced.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub markdown: PathBuf,
    /// Absent when either phase lacks monitoring data to chart.
    pub chart: Option<PathBuf>,
}

/// Renders comparison records into human-readable reports.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Load a persisted comparison and render its report.
    pub fn generate_from_file(&self, path: &Path) -> HarnessResult<ReportArtifacts> {
        let comparison = ComparisonResult::load(path)?;
        self.generate(&comparison)
    }

    /// Render the Markdown report (and SVG chart when both phases carry
    /// monitoring data). Degraded comparisons still get a report; missing
    /// pieces render as `n/a`.
    pub fn generate(&self, comparison: &ComparisonResult) -> HarnessResult<ReportArtifacts> {
        std::fs::create_dir_all(&self.output_dir)?;

        let stem = format!(
            "{}_{}_report_{}",
            comparison.app,
            comparison.profile,
            Utc::now().format("%Y%m%d_%H%M%S")
        );

        let chart = self.write_chart(comparison, &stem)?;
        let markdown_path = self.output_dir.join(format!("{}.md", stem));
        let chart_name = chart
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());

        std::fs::write(&markdown_path, render_markdown(comparison, chart_name))?;
        info!("Report written to {}", markdown_path.display());

        Ok(ReportArtifacts {
            markdown: markdown_path,
            chart,
        })
    }

    fn write_chart(
        &self,
        comparison: &ComparisonResult,
        stem: &str,
    ) -> HarnessResult<Option<PathBuf>> {
        if !comparison.is_complete() {
            return Ok(None);
        }
        let (Some(baseline), Some(instrumented)) = (
            comparison.without_instrumentation.resource_summary.as_ref(),
            comparison.with_instrumentation.resource_summary.as_ref(),
        ) else {
            return Ok(None);
        };
        if baseline.total_samples == 0 || instrumented.total_samples == 0 {
            return Ok(None);
        }

        let path = self.output_dir.join(format!("{}.svg", stem));
        std::fs::write(&path, render_chart(baseline, instrumented))?;
        Ok(Some(path))
    }
}

fn phase_section(state: InstrumentationState, result: &ExecutionResult) -> String {
    let mut out = format!("### {}\n\n", state.title());
    out.push_str(&format!(
        "- Status: {}\n",
        if result.success { "success" } else { "FAILED" }
    ));
    if let Some(error) = &result.error {
        out.push_str(&format!("- Error: {}\n", error));
    }
    if let Some(summary) = &result.resource_summary {
        out.push_str(&format!(
            "- Samples: {} over {:.1}s\n",
            summary.total_samples, summary.duration_seconds
        ));
    }
    if let Some(load) = &result.load_test {
        if let Some(html) = &load.html_report {
            out.push_str(&format!("- Load report: {}\n", html.display()));
        }
    }
    if let Some(path) = &result.monitoring_file {
        out.push_str(&format!("- Monitoring data: {}\n", path.display()));
    }
    out.push('\n');
    out
}

fn render_markdown(comparison: &ComparisonResult, chart_name: Option<String>) -> String {
    let impact = compute_impact(comparison);

    let mut out = format!(
        "# Instrumentation Overhead Report: {}\n\n\
         - Profile: {}\n\
         - Generated: {}\n\n",
        comparison.app,
        comparison.profile,
        comparison.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );

    out.push_str("## Verdict\n\n");
    match &impact {
        Some(record) => {
            let verdict = Verdict::from_impacts(record);
            out.push_str(&format!(
                "**{}** — {}\n\n",
                verdict.label(),
                verdict.assessment()
            ));
        }
        None => {
            out.push_str(
                "**INCOMPLETE** — at least one phase failed or produced no monitoring \
                 data; no impact could be computed.\n\n",
            );
        }
    }

    out.push_str("## Metrics\n\n");
    out.push_str(&markdown_table(&summary_rows(comparison, impact.as_ref())));
    out.push('\n');

    if let Some(name) = chart_name {
        out.push_str(&format!("![Resource usage comparison]({})\n\n", name));
    }

    out.push_str("## Phases\n\n");
    for state in InstrumentationState::BOTH {
        out.push_str(&phase_section(state, comparison.result_for(state)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadcmp_monitor::{ResourceSummary, SystemSummary};

    fn summary(cpu: f64) -> ResourceSummary {
        ResourceSummary {
            duration_seconds: 10.0,
            total_samples: 5,
            system_summary: SystemSummary {
                avg_cpu_percent: cpu,
                max_cpu_percent: cpu,
                avg_memory_percent: 40.0,
                max_memory_percent: 45.0,
            },
            process_summary: Default::default(),
        }
    }

    fn phase(summary: Option<ResourceSummary>) -> ExecutionResult {
        match summary {
            Some(s) => ExecutionResult {
                success: true,
                load_test: None,
                resource_summary: Some(s),
                monitoring_file: None,
                error: None,
            },
            None => ExecutionResult::failed("server never became responsive"),
        }
    }

    fn comparison(instrumented: Option<ResourceSummary>) -> ComparisonResult {
        ComparisonResult {
            app: "django".to_string(),
            profile: "light_load".to_string(),
            generated_at: Utc::now(),
            without_instrumentation: phase(Some(summary(10.0))),
            with_instrumentation: phase(instrumented),
        }
    }

    #[test]
    fn test_complete_comparison_produces_report_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let artifacts = generator.generate(&comparison(Some(summary(11.0)))).unwrap();

        let markdown = std::fs::read_to_string(&artifacts.markdown).unwrap();
        assert!(markdown.contains("# Instrumentation Overhead Report: django"));
        assert!(markdown.contains("IMPACT**"));
        assert!(markdown.contains("| System CPU (avg) |"));

        let chart_path = artifacts.chart.unwrap();
        let svg = std::fs::read_to_string(&chart_path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(markdown.contains(chart_path.file_name().unwrap().to_str().unwrap()));
    }

    #[test]
    fn test_failed_phase_produces_incomplete_report_without_chart() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let artifacts = generator.generate(&comparison(None)).unwrap();

        assert!(artifacts.chart.is_none());
        let markdown = std::fs::read_to_string(&artifacts.markdown).unwrap();
        assert!(markdown.contains("**INCOMPLETE**"));
        assert!(markdown.contains("server never became responsive"));
        assert!(markdown.contains("- Status: FAILED"));
    }

    #[test]
    fn test_generate_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let record_path = dir.path().join("comparison.json");
        comparison(Some(summary(12.0))).save(&record_path).unwrap();

        let generator = ReportGenerator::new(dir.path());
        let artifacts = generator.generate_from_file(&record_path).unwrap();
        assert!(artifacts.markdown.is_file());
    }
}
