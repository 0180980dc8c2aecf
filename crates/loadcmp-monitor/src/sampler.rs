//! Point-in-time system and process metrics snapshots.

use chrono::{DateTime, Utc};
use loadcmp_process::{fd_count, find_pid_by_port, thread_count};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysinfo::{Pid, ProcessRefreshKind, System};
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// System-wide metrics at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_used_mb: f64,
    pub memory_available_mb: f64,
}

/// Per-process metrics at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
    pub thread_count: u32,
    pub fd_count: u32,
    pub status: String,
}

/// One immutable metrics snapshot. Created by `Sampler`, owned by the
/// monitoring session's sample sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub system: SystemMetrics,
    /// Keyed `"port_<port>"`; ports with no discoverable owner are absent.
    pub processes: BTreeMap<String, ProcessMetrics>,
}

/// Takes metrics snapshots. Holds the `sysinfo` state between captures so
/// CPU percentages are computed against the previous refresh.
pub struct Sampler {
    system: System,
}

impl Sampler {
    pub fn new() -> Self {
        Self {
            system: System::new_all(),
        }
    }

    /// Capture one snapshot covering the whole system plus every process
    /// found listening on a target port.
    ///
    /// Port lookups that fail (permission denied, process vanished) simply
    /// produce no entry for that port in this sample.
    pub fn capture(&mut self, target_ports: &[u16]) -> MetricSample {
        self.system.refresh_cpu();
        self.system.refresh_memory();

        let total = self.system.total_memory() as f64;
        let used = self.system.used_memory() as f64;
        let available = self.system.available_memory() as f64;
        let memory_percent = if total > 0.0 {
            (used / total * 100.0) as f32
        } else {
            0.0
        };

        let system = SystemMetrics {
            cpu_percent: self.system.global_cpu_info().cpu_usage(),
            memory_percent,
            memory_used_mb: used / BYTES_PER_MB,
            memory_available_mb: available / BYTES_PER_MB,
        };

        let mut processes = BTreeMap::new();
        for &port in target_ports {
            let Some(pid) = find_pid_by_port(port) else {
                debug!("No process found listening on port {}", port);
                continue;
            };
            if let Some(metrics) = self.capture_process(pid) {
                processes.insert(format!("port_{}", port), metrics);
            }
        }

        MetricSample {
            timestamp: Utc::now(),
            system,
            processes,
        }
    }

    /// Metrics for one PID, or `None` if it vanished between discovery and refresh.
    fn capture_process(&mut self, pid: u32) -> Option<ProcessMetrics> {
        let sysinfo_pid = Pid::from_u32(pid);
        self.system.refresh_process_specifics(
            sysinfo_pid,
            ProcessRefreshKind::new().with_memory().with_cpu(),
        );

        let process = self.system.process(sysinfo_pid)?;
        Some(ProcessMetrics {
            cpu_percent: process.cpu_usage(),
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            thread_count: thread_count(pid).unwrap_or(0),
            fd_count: fd_count(pid).unwrap_or(0),
            status: process.status().to_string(),
        })
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}
