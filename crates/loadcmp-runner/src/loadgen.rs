//! Load generator invocation.
//!
//! The generator runs in the foreground of the phase: the sampling loop is
//! already active in the background, and the phase does not advance until
//! the generator exits or hits its wall-clock limit.

use crate::config::LoadGeneratorConfig;
use crate::results::LoadTestOutcome;
use loadcmp_common::{format_duration, HarnessError, HarnessResult, LoadProfile};
use std::path::Path;
use std::process::Stdio;
use tokio::time::sleep;
use tracing::{info, warn};

/// How much of the generator's output to keep in the result record.
const OUTPUT_TAIL_BYTES: usize = 4096;

/// Run the load generator against `host` with the profile's parameters.
///
/// CSV stats, an HTML report, and the combined output log all land under
/// `run_dir`. A nonzero exit or a wall-clock timeout (profile duration plus
/// the configured margin) yields a failed outcome, not an error; only setup
/// problems (creating artifacts, spawning the program) return `Err`.
pub async fn run_load_generator(
    config: &LoadGeneratorConfig,
    profile: &LoadProfile,
    host: &str,
    run_dir: &Path,
) -> HarnessResult<LoadTestOutcome> {
    std::fs::create_dir_all(run_dir)?;
    let stats_prefix = run_dir.join("stats");
    let html_report = run_dir.join("report.html");
    let output_log = run_dir.join("output.log");

    let mut args = config.args.clone();
    args.extend([
        format!("--users={}", profile.users),
        format!("--spawn-rate={}", profile.spawn_rate),
        format!("--run-time={}", format_duration(profile.duration)),
        format!("--host={}", host),
        "--headless".to_string(),
        "--csv".to_string(),
        stats_prefix.display().to_string(),
        "--html".to_string(),
        html_report.display().to_string(),
    ]);

    info!(
        "Running {} ({} users, spawn rate {}, {})",
        config.program,
        profile.users,
        profile.spawn_rate,
        format_duration(profile.duration)
    );

    let log = std::fs::File::create(&output_log)?;
    let log_err = log.try_clone()?;
    let mut child = tokio::process::Command::new(&config.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        // The generator binds no listening port, so the teardown port sweep
        // cannot reach it; killing on drop covers a cancelled run.
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            HarnessError::execution(format!("failed to spawn {}: {}", config.program, e))
        })?;

    let hard_timeout = profile.duration + config.timeout_margin;
    let outcome = tokio::select! {
        status = child.wait() => {
            let status = status?;
            let exit_code = status.code();
            if status.success() {
                info!("Load generator finished successfully");
            } else {
                warn!("Load generator exited with {:?}", exit_code);
            }
            LoadTestOutcome {
                success: status.success(),
                exit_code,
                output_tail: read_tail(&output_log),
                stats_prefix: Some(stats_prefix),
                html_report: Some(html_report),
                error: if status.success() {
                    None
                } else {
                    Some(format!("{} exited with {:?}", config.program, exit_code))
                },
            }
        }
        _ = sleep(hard_timeout) => {
            warn!(
                "Load generator still running after {:?}, killing it",
                hard_timeout
            );
            let _ = child.start_kill();
            let _ = child.wait().await;
            LoadTestOutcome {
                success: false,
                exit_code: None,
                output_tail: read_tail(&output_log),
                stats_prefix: Some(stats_prefix),
                html_report: Some(html_report),
                error: Some(format!(
                    "{} timed out after {:?}",
                    config.program, hard_timeout
                )),
            }
        }
    };

    Ok(outcome)
}

/// Last `OUTPUT_TAIL_BYTES` of the output log, lossily decoded.
fn read_tail(path: &Path) -> String {
    let Ok(bytes) = std::fs::read(path) else {
        return String::new();
    };
    let start = bytes.len().saturating_sub(OUTPUT_TAIL_BYTES);
    String::from_utf8_lossy(&bytes[start..]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn profile(duration: Duration) -> LoadProfile {
        LoadProfile {
            users: 10,
            spawn_rate: 2,
            duration,
            description: String::new(),
        }
    }

    // `sh -c '<script>' --` runs the script with $0 = "--" and ignores the
    // locust-style flags appended after it.
    fn sh(script: &str, margin: Duration) -> LoadGeneratorConfig {
        LoadGeneratorConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "--".to_string()],
            timeout_margin: margin,
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run_load_generator(
            &sh("echo generating load", Duration::from_secs(5)),
            &profile(Duration::from_secs(1)),
            "http://localhost:1",
            dir.path(),
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.output_tail.contains("generating load"));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run_load_generator(
            &sh("exit 3", Duration::from_secs(5)),
            &profile(Duration::from_secs(1)),
            "http://localhost:1",
            dir.path(),
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        assert!(outcome.error.as_deref().unwrap().contains("exited"));
    }

    #[tokio::test]
    async fn test_hung_generator_is_killed_at_hard_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run_load_generator(
            &sh("sleep 30", Duration::from_millis(300)),
            &profile(Duration::from_millis(100)),
            "http://localhost:1",
            dir.path(),
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert!(outcome.exit_code.is_none());
        assert!(outcome.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[cfg(target_os = "linux")]
    async fn test_cancelled_run_kills_the_generator() {
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("pid");
        let script = format!("echo $$ > {}; sleep 30", pidfile.display());
        let config = sh(&script, Duration::from_secs(60));
        let quick = profile(Duration::from_secs(60));
        let run_dir = dir.path().join("run");

        let task = tokio::spawn(async move {
            let _ = run_load_generator(&config, &quick, "http://localhost:1", &run_dir).await;
        });

        // Wait for the generator to report its pid, then cancel the run.
        let mut pid = None;
        for _ in 0..250 {
            if let Ok(content) = std::fs::read_to_string(&pidfile) {
                if let Ok(p) = content.trim().parse::<u32>() {
                    pid = Some(p);
                    break;
                }
            }
            sleep(Duration::from_millis(20)).await;
        }
        let pid = pid.expect("generator never started");
        task.abort();
        let _ = task.await;

        // The child must be dead (possibly an unreaped zombie briefly).
        let mut killed = false;
        for _ in 0..100 {
            match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
                Err(_) => {
                    killed = true;
                    break;
                }
                Ok(stat) if stat.contains(") Z ") => {
                    killed = true;
                    break;
                }
                Ok(_) => sleep(Duration::from_millis(20)).await,
            }
        }
        assert!(killed, "load generator pid {} survived cancellation", pid);
    }

    #[tokio::test]
    async fn test_missing_program_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoadGeneratorConfig {
            program: "definitely-not-a-real-load-generator".to_string(),
            args: vec![],
            timeout_margin: Duration::from_secs(1),
        };
        let err = run_load_generator(
            &config,
            &profile(Duration::from_secs(1)),
            "http://localhost:1",
            dir.path(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, HarnessError::Execution { .. }));
    }
}
