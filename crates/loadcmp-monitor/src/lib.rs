//! # loadcmp-monitor
//!
//! Resource monitoring for the harness:
//! - `Sampler` takes one point-in-time system + process metrics snapshot
//! - `ResourceMonitor` runs a cancellable background sampling loop and
//!   aggregates samples into a `ResourceSummary`
//! - `probe` checks HTTP responsiveness of a spawned application

pub mod monitor;
pub mod probe;
pub mod sampler;
pub mod summary;

pub use monitor::ResourceMonitor;
pub use probe::{probe_endpoint, wait_until_ready, ProbeResult};
pub use sampler::{MetricSample, ProcessMetrics, Sampler, SystemMetrics};
pub use summary::{summarize, ProcessSummary, ResourceSummary, SystemSummary};
