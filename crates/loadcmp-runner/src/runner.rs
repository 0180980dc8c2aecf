//! Comparison orchestration.
//!
//! A comparison runs two phases in a fixed order, baseline first, and every
//! phase walks the same sequence: stage the env file, start the server,
//! probe until responsive, optionally start the worker, sample resources
//! while the load generator runs, collect, tear down. Phase failures become
//! result records; only the teardown path is unconditional.

use crate::config::{AppConfig, HarnessConfig};
use crate::envfile::configure_environment;
use crate::loadgen::run_load_generator;
use crate::results::{ComparisonResult, ExecutionResult};
use chrono::Utc;
use loadcmp_common::{
    format_duration, HarnessError, HarnessResult, InstrumentationState, LoadProfile,
};
use loadcmp_monitor::{wait_until_ready, ResourceMonitor};
use loadcmp_process::{ProcessRegistry, ProcessSpec};
use std::path::PathBuf;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Orchestrates comparison runs for one config.
pub struct TestRunner {
    config: HarnessConfig,
    registry: ProcessRegistry,
}

impl TestRunner {
    pub fn new(config: HarnessConfig) -> Self {
        let registry = ProcessRegistry::new(config.timing.shutdown_grace);
        Self { config, registry }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run a full comparison for one app and profile. Returns the paired
    /// record and the path it was persisted to.
    ///
    /// A failed phase never aborts its sibling; only config resolution or an
    /// unwritable results directory abort the run as a whole.
    pub async fn run_comparison(
        &mut self,
        app_name: &str,
        profile_name: &str,
    ) -> HarnessResult<(ComparisonResult, PathBuf)> {
        let app = self.config.app(app_name)?.clone();
        let profile = self.config.profile(profile_name)?;
        std::fs::create_dir_all(&self.config.results_dir)?;

        info!(
            "Comparison run: app={} profile={} ({} users, {})",
            app.name,
            profile_name,
            profile.users,
            format_duration(profile.duration)
        );

        let without_instrumentation = self
            .run_phase(
                &app,
                &profile,
                profile_name,
                InstrumentationState::WithoutInstrumentation,
            )
            .await;
        let with_instrumentation = self
            .run_phase(
                &app,
                &profile,
                profile_name,
                InstrumentationState::WithInstrumentation,
            )
            .await;

        let comparison = ComparisonResult {
            app: app.name.clone(),
            profile: profile_name.to_string(),
            generated_at: Utc::now(),
            without_instrumentation,
            with_instrumentation,
        };

        let path = self.config.results_dir.join(format!(
            "{}_{}_comparison_{}.json",
            app.name,
            profile_name,
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        comparison.save(&path)?;
        info!("Comparison saved to {}", path.display());

        Ok((comparison, path))
    }

    /// One phase plus its unconditional teardown.
    async fn run_phase(
        &mut self,
        app: &AppConfig,
        profile: &LoadProfile,
        profile_name: &str,
        state: InstrumentationState,
    ) -> ExecutionResult {
        info!("=== {} {} ===", app.name, state.title());

        let result = match self.execute_phase(app, profile, profile_name, state).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Phase {} failed: {}", state.key(), e);
                ExecutionResult::failed(e.to_string())
            }
        };

        // Teardown runs on every exit path of a phase.
        self.registry.shutdown_all().await;
        self.registry.sweep_ports(&[app.port]).await;

        debug!(
            "Waiting {:?} for the system to quiesce",
            self.config.timing.inter_phase_delay
        );
        sleep(self.config.timing.inter_phase_delay).await;

        result
    }

    async fn execute_phase(
        &mut self,
        app: &AppConfig,
        profile: &LoadProfile,
        profile_name: &str,
        state: InstrumentationState,
    ) -> HarnessResult<ExecutionResult> {
        let timing = self.config.timing.clone();

        // Configure: stage the env variant before anything starts.
        let staged = configure_environment(&self.config.env_config_dir, app, state)?;
        debug!("Staged environment at {}", staged.display());

        let run_prefix = format!(
            "{}_{}_{}_{}",
            app.name,
            profile_name,
            state.env_suffix(),
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let run_dir = self.config.results_dir.join(&run_prefix);
        std::fs::create_dir_all(&run_dir)?;

        // Start the server and wait until it answers HTTP.
        let server_name = format!("{}-server", app.name);
        self.registry.spawn(&ProcessSpec {
            name: server_name.clone(),
            command: app.server_command.clone(),
            working_dir: app.directory.clone(),
            env: Vec::new(),
            log_path: Some(run_dir.join("server.log")),
        })?;
        sleep(timing.startup_grace).await;

        let probe = wait_until_ready(
            app.port,
            "/",
            timing.probe_attempts,
            timing.probe_delay,
            timing.probe_timeout,
        )
        .await;
        if !probe.responsive {
            return Err(HarnessError::startup(
                &server_name,
                probe
                    .error
                    .unwrap_or_else(|| "not responding on its port".to_string()),
            ));
        }
        info!(
            "{} responding on port {} (status {:?})",
            server_name, app.port, probe.status_code
        );

        // Start the worker, if the app has one. There is no readiness
        // endpoint for a worker; not crashing within the settle delay is
        // the only available signal.
        if let Some(worker_command) = &app.worker_command {
            let worker_name = format!("{}-worker", app.name);
            self.registry.spawn(&ProcessSpec {
                name: worker_name.clone(),
                command: worker_command.clone(),
                working_dir: app.directory.clone(),
                env: Vec::new(),
                log_path: Some(run_dir.join("worker.log")),
            })?;
            sleep(timing.worker_settle).await;
            if !self.registry.is_running(&worker_name) {
                return Err(HarnessError::startup(
                    worker_name,
                    "exited during the settle delay",
                ));
            }
        }

        // Sample in the background while the load runs in the foreground.
        let mut monitor = ResourceMonitor::new(vec![app.port]);
        monitor.start(timing.sample_interval);

        let host = format!("http://localhost:{}", app.port);
        let load_test =
            run_load_generator(&self.config.load_generator, profile, &host, &run_dir).await?;

        // Collect. A monitoring artifact that fails to write degrades the
        // record instead of failing the phase.
        let resource_summary = monitor.stop().await;
        let monitoring_path = self
            .config
            .results_dir
            .join(format!("{}_monitoring.json", run_prefix));
        let monitoring_file = match monitor.save_results(&monitoring_path) {
            Ok(()) => Some(monitoring_path),
            Err(e) => {
                warn!("Could not write monitoring artifact: {}", e);
                None
            }
        };

        let success = load_test.success;
        let error = if success {
            None
        } else {
            Some(
                load_test
                    .error
                    .clone()
                    .unwrap_or_else(|| "load generator reported failure".to_string()),
            )
        };

        Ok(ExecutionResult {
            success,
            load_test: Some(load_test),
            resource_summary: Some(resource_summary),
            monitoring_file,
            error,
        })
    }

    /// Release everything the runner may still hold. Used on the interrupt
    /// path; safe to call at any time.
    pub async fn cleanup(&mut self) {
        self.registry.shutdown_all().await;
        let ports: Vec<u16> = self.config.apps.iter().map(|a| a.port).collect();
        self.registry.sweep_ports(&ports).await;
    }
}
