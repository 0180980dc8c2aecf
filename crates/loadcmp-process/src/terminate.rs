//! Process termination and existence primitives.

use loadcmp_common::{HarnessError, HarnessResult};

/// Terminate a process gracefully (SIGTERM).
pub fn terminate_gracefully(pid: u32) -> HarnessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let nix_pid = Pid::from_raw(pid as i32);
        kill(nix_pid, Signal::SIGTERM)
            .map_err(|e| HarnessError::cleanup(pid.to_string(), e.to_string()))
    }

    #[cfg(not(unix))]
    {
        Err(HarnessError::cleanup(
            pid.to_string(),
            "graceful termination by pid is unsupported on this platform",
        ))
    }
}

/// Force kill a process (SIGKILL).
pub fn force_kill(pid: u32) -> HarnessResult<()> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let nix_pid = Pid::from_raw(pid as i32);
        kill(nix_pid, Signal::SIGKILL)
            .map_err(|e| HarnessError::cleanup(pid.to_string(), e.to_string()))
    }

    #[cfg(not(unix))]
    {
        Err(HarnessError::cleanup(
            pid.to_string(),
            "forceful termination by pid is unsupported on this platform",
        ))
    }
}

/// Check if a process with the given PID exists and is running.
///
/// Non-destructive: sends signal 0, which checks existence without signaling.
/// EPERM counts as alive (the process exists but belongs to another user).
pub fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let nix_pid = Pid::from_raw(pid as i32);
        match kill(nix_pid, None) {
            Ok(_) => true,
            Err(nix::errno::Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}
