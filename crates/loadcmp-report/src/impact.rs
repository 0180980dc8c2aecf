//! Impact computation: relative change between the two phases.

use loadcmp_monitor::{ProcessSummary, ResourceSummary};
use loadcmp_runner::ComparisonResult;

/// Relative change in percent from `baseline` to `instrumented`.
///
/// A zero baseline cannot anchor a ratio: if the instrumented value is also
/// zero the change is zero, otherwise it is positive infinity. Infinity is
/// preserved here and rendered as `+inf%` downstream; it deliberately trips
/// the worst verdict tier rather than being clamped to some large number.
pub fn percent_change(baseline: f64, instrumented: f64) -> f64 {
    if baseline == 0.0 {
        if instrumented == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (instrumented - baseline) / baseline * 100.0
    }
}

/// Relative changes across the tracked metrics. Process-level fields are
/// absent when either phase never discovered the app process.
///
/// Not serialized: infinity has no JSON representation, and the record is
/// recomputable from the persisted comparison anyway.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactRecord {
    pub system_cpu: f64,
    pub system_memory: f64,
    pub process_cpu: Option<f64>,
    pub process_memory: Option<f64>,
    pub threads: Option<f64>,
}

/// Overall assessment derived from the process-level impacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Low,
    Moderate,
    High,
}

impl Verdict {
    const LOW_THRESHOLD: f64 = 5.0;
    const MODERATE_THRESHOLD: f64 = 15.0;

    /// Tier from the CPU and memory impacts, preferring process-level values
    /// and falling back to system-level when the process was not discovered.
    pub fn from_impacts(impact: &ImpactRecord) -> Self {
        let cpu = impact.process_cpu.unwrap_or(impact.system_cpu);
        let memory = impact.process_memory.unwrap_or(impact.system_memory);
        if cpu < Self::LOW_THRESHOLD && memory < Self::LOW_THRESHOLD {
            Verdict::Low
        } else if cpu < Self::MODERATE_THRESHOLD && memory < Self::MODERATE_THRESHOLD {
            Verdict::Moderate
        } else {
            Verdict::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Low => "LOW IMPACT",
            Verdict::Moderate => "MODERATE IMPACT",
            Verdict::High => "HIGH IMPACT",
        }
    }

    pub fn assessment(&self) -> &'static str {
        match self {
            Verdict::Low => "Instrumentation overhead is negligible under this load.",
            Verdict::Moderate => {
                "Instrumentation overhead is noticeable; acceptable for most deployments."
            }
            Verdict::High => {
                "Instrumentation overhead is significant; investigate before enabling in production."
            }
        }
    }
}

/// The process entry observed most often during a session. Comparisons with
/// one app process listen on one port, but a process may still be absent
/// from every sample of a degraded phase.
fn dominant_process(summary: &ResourceSummary) -> Option<&ProcessSummary> {
    summary.process_summary.values().max_by_key(|p| p.samples)
}

/// Compute the impact record for a comparison.
///
/// Defined only when both phases succeeded: a failed phase may still carry
/// monitoring data (the load generator can fail mid-run), but that data does
/// not describe the intended load and must not anchor a verdict. Returns
/// `None` for incomplete comparisons or phases without samples.
pub fn compute_impact(comparison: &ComparisonResult) -> Option<ImpactRecord> {
    if !comparison.is_complete() {
        return None;
    }
    let baseline = comparison.without_instrumentation.resource_summary.as_ref()?;
    let instrumented = comparison.with_instrumentation.resource_summary.as_ref()?;
    if baseline.total_samples == 0 || instrumented.total_samples == 0 {
        return None;
    }

    let system_cpu = percent_change(
        baseline.system_summary.avg_cpu_percent,
        instrumented.system_summary.avg_cpu_percent,
    );
    let system_memory = percent_change(
        baseline.system_summary.avg_memory_percent,
        instrumented.system_summary.avg_memory_percent,
    );

    let (process_cpu, process_memory, threads) =
        match (dominant_process(baseline), dominant_process(instrumented)) {
            (Some(base), Some(inst)) => (
                Some(percent_change(base.avg_cpu_percent, inst.avg_cpu_percent)),
                Some(percent_change(base.avg_memory_mb, inst.avg_memory_mb)),
                Some(percent_change(base.avg_threads, inst.avg_threads)),
            ),
            _ => (None, None, None),
        };

    Some(ImpactRecord {
        system_cpu,
        system_memory,
        process_cpu,
        process_memory,
        threads,
    })
}
