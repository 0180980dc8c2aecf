//! Aggregated avg/max statistics derived from a sample sequence.

use crate::sampler::MetricSample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// System-wide aggregate over a monitoring session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemSummary {
    pub avg_cpu_percent: f64,
    pub max_cpu_percent: f64,
    pub avg_memory_percent: f64,
    pub max_memory_percent: f64,
}

/// Per-process aggregate over a monitoring session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub avg_cpu_percent: f64,
    pub max_cpu_percent: f64,
    pub avg_memory_mb: f64,
    pub max_memory_mb: f64,
    pub avg_threads: f64,
    pub max_threads: u32,
    /// Samples in which this process was present (it may appear late or vanish).
    pub samples: usize,
}

/// Read-only aggregate computed from a frozen sample sequence.
///
/// An empty sequence yields the default summary with `total_samples = 0`;
/// aggregation never divides by zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub duration_seconds: f64,
    pub total_samples: usize,
    pub system_summary: SystemSummary,
    pub process_summary: BTreeMap<String, ProcessSummary>,
}

/// Compute summary statistics from a sample sequence.
pub fn summarize(samples: &[MetricSample], duration_seconds: f64) -> ResourceSummary {
    if samples.is_empty() {
        return ResourceSummary::default();
    }

    let count = samples.len() as f64;
    let mut system = SystemSummary::default();
    for sample in samples {
        let cpu = f64::from(sample.system.cpu_percent);
        let mem = f64::from(sample.system.memory_percent);
        system.avg_cpu_percent += cpu / count;
        system.max_cpu_percent = system.max_cpu_percent.max(cpu);
        system.avg_memory_percent += mem / count;
        system.max_memory_percent = system.max_memory_percent.max(mem);
    }

    // Group per-process observations by port key first; a process may be
    // absent from some samples.
    let mut grouped: BTreeMap<&str, Vec<&crate::sampler::ProcessMetrics>> = BTreeMap::new();
    for sample in samples {
        for (key, metrics) in &sample.processes {
            grouped.entry(key).or_default().push(metrics);
        }
    }

    let mut process_summary = BTreeMap::new();
    for (key, observations) in grouped {
        let n = observations.len() as f64;
        let mut agg = ProcessSummary {
            samples: observations.len(),
            ..Default::default()
        };
        for obs in observations {
            let cpu = f64::from(obs.cpu_percent);
            agg.avg_cpu_percent += cpu / n;
            agg.max_cpu_percent = agg.max_cpu_percent.max(cpu);
            agg.avg_memory_mb += obs.memory_mb / n;
            agg.max_memory_mb = agg.max_memory_mb.max(obs.memory_mb);
            agg.avg_threads += f64::from(obs.thread_count) / n;
            agg.max_threads = agg.max_threads.max(obs.thread_count);
        }
        process_summary.insert(key.to_string(), agg);
    }

    ResourceSummary {
        duration_seconds,
        total_samples: samples.len(),
        system_summary: system,
        process_summary,
    }
}
