//! Process registry: spawn external processes and shut them all down.
//!
//! Every spawned process is tracked here and released exactly once by
//! `shutdown_all`, which the orchestrator runs on every exit path. Shutdown
//! is best-effort: failures are logged, escalated to SIGKILL, and finally
//! backed by a port sweep for processes a shell wrapper may have reparented.

use crate::ports::find_pid_by_port;
use crate::terminate::{force_kill, terminate_gracefully};
use loadcmp_common::{HarnessError, HarnessResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Launch specification for one external process.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    /// Name used in logs and error messages.
    pub name: String,
    /// Program followed by its arguments.
    pub command: Vec<String>,
    /// Working directory for the process.
    pub working_dir: PathBuf,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Where to redirect stdout/stderr; `None` discards output.
    pub log_path: Option<PathBuf>,
}

/// One tracked external process. Owned exclusively by the registry.
struct ProcessHandle {
    name: String,
    child: Child,
}

/// Registry of externally spawned processes for uniform shutdown.
///
/// Owned by the orchestrator instance so that concurrent or repeated runs
/// cannot cross-talk through shared state.
pub struct ProcessRegistry {
    handles: Vec<ProcessHandle>,
    graceful_timeout: Duration,
}

impl ProcessRegistry {
    pub fn new(graceful_timeout: Duration) -> Self {
        Self {
            handles: Vec::new(),
            graceful_timeout,
        }
    }

    /// Number of currently tracked processes.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Spawn an external process with redirected output and register it.
    ///
    /// Returns the OS process id. `kill_on_drop` backs up the explicit
    /// shutdown path if the registry is dropped mid-run.
    pub fn spawn(&mut self, spec: &ProcessSpec) -> HarnessResult<u32> {
        let (program, args) = spec.command.split_first().ok_or_else(|| {
            HarnessError::configuration(format!("empty command for process '{}'", spec.name))
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&spec.working_dir)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match &spec.log_path {
            Some(path) => {
                let log_file = std::fs::File::create(path)?;
                let log_file_clone = log_file.try_clone()?;
                cmd.stdout(Stdio::from(log_file))
                    .stderr(Stdio::from(log_file_clone));
            }
            None => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = cmd.spawn().map_err(|e| {
            HarnessError::startup(&spec.name, format!("failed to spawn '{}': {}", program, e))
        })?;
        let pid = child
            .id()
            .ok_or_else(|| HarnessError::startup(&spec.name, "process exited before tracking"))?;

        info!("Spawned {} (pid {}): {}", spec.name, pid, spec.command.join(" "));
        self.handles.push(ProcessHandle {
            name: spec.name.clone(),
            child,
        });
        Ok(pid)
    }

    /// Check whether a tracked process is still running, reaping it if not.
    pub fn is_running(&mut self, name: &str) -> bool {
        self.handles
            .iter_mut()
            .filter(|h| h.name == name)
            .any(|h| matches!(h.child.try_wait(), Ok(None)))
    }

    /// Shut down every registered process: graceful signal, bounded wait,
    /// SIGKILL escalation. Clears the registry regardless of individual
    /// failures and never returns an error.
    pub async fn shutdown_all(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        info!("Shutting down {} tracked process(es)", self.handles.len());

        let grace = self.graceful_timeout;
        for handle in self.handles.drain(..) {
            shutdown_handle(handle, grace).await;
        }
    }

    /// Last-resort sweep: SIGKILL anything still listening on a known port.
    ///
    /// Graceful signals may not reach processes spawned through a shell
    /// wrapper, so this catches strays after `shutdown_all`. The harness's
    /// own PID is never a sweep target.
    pub async fn sweep_ports(&self, ports: &[u16]) {
        for &port in ports {
            let Some(pid) = find_pid_by_port(port) else {
                continue;
            };
            if pid == std::process::id() {
                continue;
            }
            warn!("Port {} still bound by stray pid {}, force killing", port, pid);
            if let Err(e) = force_kill(pid) {
                warn!("Port sweep failed for pid {}: {}", pid, e);
            }
        }
    }
}

/// Release one handle: graceful first, forceful after the grace period.
async fn shutdown_handle(mut handle: ProcessHandle, grace: Duration) {
    // Already exited?
    if let Ok(Some(status)) = handle.child.try_wait() {
        debug!("Process {} already exited: {}", handle.name, status);
        return;
    }

    if let Some(pid) = handle.child.id() {
        if let Err(e) = terminate_gracefully(pid) {
            warn!("Graceful signal to {} (pid {}) failed: {}", handle.name, pid, e);
        }
    }

    match timeout(grace, handle.child.wait()).await {
        Ok(Ok(status)) => {
            debug!("Process {} exited: {}", handle.name, status);
        }
        Ok(Err(e)) => {
            warn!("Error waiting for {}: {}", handle.name, e);
        }
        Err(_) => {
            warn!(
                "Process {} did not exit within {:?}, escalating to kill",
                handle.name, grace
            );
            if let Err(e) = handle.child.start_kill() {
                warn!("Force kill of {} failed: {}", handle.name, e);
            }
            let _ = handle.child.wait().await;
        }
    }
}
