//! Monitoring session: a cancellable background sampling loop.

use crate::probe::{probe_endpoint, ProbeResult};
use crate::sampler::{MetricSample, Sampler};
use crate::summary::{summarize, ResourceSummary};
use loadcmp_common::{HarnessError, HarnessResult};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bounded grace period for joining the sampling loop on `stop`.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Default timeout for a single responsiveness probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns one monitoring session at a time: a background task that captures a
/// `MetricSample` per interval and appends it to the sample sequence.
///
/// The background task is the sole writer to the sequence; the foreground
/// only reads the full sequence after `stop` has joined the task, so no
/// fine-grained locking discipline is needed beyond the mutex itself.
pub struct ResourceMonitor {
    target_ports: Vec<u16>,
    samples: Arc<Mutex<Vec<MetricSample>>>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    started_at: Option<Instant>,
}

impl ResourceMonitor {
    pub fn new(target_ports: Vec<u16>) -> Self {
        Self {
            target_ports,
            samples: Arc::new(Mutex::new(Vec::new())),
            cancel: None,
            task: None,
            started_at: None,
        }
    }

    /// Whether a sampling loop is currently active.
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Number of samples captured so far. Safe to call while sampling runs.
    pub fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    /// Start the background sampling loop.
    ///
    /// A no-op if already running. Otherwise resets the sample sequence,
    /// records the start time, and spawns a single loop that captures one
    /// sample then waits `interval` (or cancellation) before the next.
    pub fn start(&mut self, interval: Duration) {
        if self.task.is_some() {
            warn!("Resource monitor already running, ignoring start");
            return;
        }

        self.samples.lock().unwrap().clear();
        self.started_at = Some(Instant::now());

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let samples = Arc::clone(&self.samples);
        let ports = self.target_ports.clone();

        info!(
            "Starting resource monitoring for ports {:?} (interval {:?})",
            ports, interval
        );

        let task = tokio::spawn(async move {
            let mut sampler = Sampler::new();
            loop {
                let sample = sampler.capture(&ports);
                samples.lock().unwrap().push(sample);

                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = sleep(interval) => {}
                }
            }
            debug!("Sampling loop exited");
        });

        self.cancel = Some(token);
        self.task = Some(task);
    }

    /// Stop the sampling loop and return the computed summary.
    ///
    /// Signals the loop, then waits up to a bounded grace period for it to
    /// finish; if the join times out the monitor proceeds anyway rather than
    /// blocking indefinitely. On a session with zero samples this returns an
    /// empty summary, never a division error.
    pub async fn stop(&mut self) -> ResourceSummary {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(task) = self.task.take() {
            if timeout(STOP_GRACE, task).await.is_err() {
                warn!(
                    "Sampling loop did not finish within {:?}, proceeding with collected samples",
                    STOP_GRACE
                );
            }
        }
        self.summary()
    }

    /// Compute the summary from the samples collected so far.
    pub fn summary(&self) -> ResourceSummary {
        let duration = self
            .started_at
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let samples = self.samples.lock().unwrap();
        summarize(&samples, duration)
    }

    /// Persist the summary plus the raw sample sequence as JSON.
    pub fn save_results(&self, path: &Path) -> HarnessResult<()> {
        #[derive(Serialize)]
        struct MonitoringArtifact<'a> {
            summary: ResourceSummary,
            samples: &'a [MetricSample],
        }

        let samples = self.samples.lock().unwrap();
        let artifact = MonitoringArtifact {
            summary: summarize(
                &samples,
                self.started_at
                    .map(|t| t.elapsed().as_secs_f64())
                    .unwrap_or(0.0),
            ),
            samples: &samples,
        };

        let json = serde_json::to_string_pretty(&artifact)
            .map_err(|e| HarnessError::monitoring(format!("failed to encode samples: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| HarnessError::monitoring(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Bounded-timeout responsiveness check against a target port.
    /// Never returns an error; failures are reported in the result.
    pub async fn check_responsiveness(&self, port: u16, path: &str) -> ProbeResult {
        probe_endpoint(port, path, PROBE_TIMEOUT).await
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
