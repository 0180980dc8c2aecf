//! Harness configuration loaded from a YAML file.
//!
//! The config names the applications under test, the load generator
//! invocation, the timing knobs of a phase, and any profile overrides. All
//! timing fields have defaults so a minimal config only lists apps.

use loadcmp_common::duration_serde;
use loadcmp_common::{builtin_profiles, HarnessError, HarnessResult, LoadProfile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One application under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    /// Port the server is expected to listen on once started.
    pub port: u16,
    /// Working directory for the server and worker processes. The staged
    /// `.env` file is written here too.
    pub directory: PathBuf,
    pub server_command: Vec<String>,
    /// Optional background worker started after the server is responsive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_command: Option<Vec<String>>,
}

/// How to invoke the load generator. The harness appends the standard
/// locust-style flags (users, spawn rate, run time, host, headless, csv,
/// html) after `args`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadGeneratorConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Extra margin on top of the profile duration before the generator is
    /// killed as hung.
    #[serde(with = "duration_serde")]
    pub timeout_margin: Duration,
}

impl Default for LoadGeneratorConfig {
    fn default() -> Self {
        Self {
            program: "locust".to_string(),
            args: vec!["-f".to_string(), "locustfile.py".to_string()],
            timeout_margin: Duration::from_secs(60),
        }
    }
}

/// Timing knobs for one phase of a comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed delay after spawning the server, before the first probe.
    #[serde(with = "duration_serde")]
    pub startup_grace: Duration,
    /// How long the worker gets to crash before it is considered settled.
    #[serde(with = "duration_serde")]
    pub worker_settle: Duration,
    pub probe_attempts: u32,
    #[serde(with = "duration_serde")]
    pub probe_delay: Duration,
    #[serde(with = "duration_serde")]
    pub probe_timeout: Duration,
    #[serde(with = "duration_serde")]
    pub sample_interval: Duration,
    /// Pause between the two phases so the system quiesces.
    #[serde(with = "duration_serde")]
    pub inter_phase_delay: Duration,
    /// SIGTERM-to-SIGKILL escalation window during teardown.
    #[serde(with = "duration_serde")]
    pub shutdown_grace: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_secs(5),
            worker_settle: Duration::from_secs(3),
            probe_attempts: 5,
            probe_delay: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(5),
            sample_interval: Duration::from_secs(1),
            inter_phase_delay: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Top-level harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub apps: Vec<AppConfig>,
    /// Where comparison, monitoring, and load artifacts land.
    pub results_dir: PathBuf,
    /// Directory holding the per-app `.env.<app>.<variant>` files.
    pub env_config_dir: PathBuf,
    #[serde(default)]
    pub load_generator: LoadGeneratorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Overrides or extends the built-in profile table.
    #[serde(default)]
    pub profiles: BTreeMap<String, LoadProfile>,
}

impl HarnessConfig {
    pub fn load_from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| HarnessError::configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.apps.is_empty() {
            return Err(HarnessError::configuration("no apps configured"));
        }
        let mut seen_names = BTreeSet::new();
        let mut seen_ports = BTreeSet::new();
        for app in &self.apps {
            if app.name.is_empty() {
                return Err(HarnessError::configuration("app with empty name"));
            }
            if app.server_command.is_empty() {
                return Err(HarnessError::configuration(format!(
                    "app '{}' has an empty server_command",
                    app.name
                )));
            }
            if let Some(worker) = &app.worker_command {
                if worker.is_empty() {
                    return Err(HarnessError::configuration(format!(
                        "app '{}' has an empty worker_command",
                        app.name
                    )));
                }
            }
            if !seen_names.insert(app.name.as_str()) {
                return Err(HarnessError::configuration(format!(
                    "duplicate app name '{}'",
                    app.name
                )));
            }
            if !seen_ports.insert(app.port) {
                return Err(HarnessError::configuration(format!(
                    "duplicate port {} (app '{}')",
                    app.port, app.name
                )));
            }
        }
        for (name, profile) in &self.profiles {
            if profile.users == 0 || profile.spawn_rate == 0 {
                return Err(HarnessError::configuration(format!(
                    "profile '{}' must have nonzero users and spawn_rate",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Look up an app by name.
    pub fn app(&self, name: &str) -> HarnessResult<&AppConfig> {
        self.apps.iter().find(|a| a.name == name).ok_or_else(|| {
            let known: Vec<&str> = self.apps.iter().map(|a| a.name.as_str()).collect();
            HarnessError::configuration(format!(
                "unknown app '{}' (configured: {})",
                name,
                known.join(", ")
            ))
        })
    }

    /// Resolve a profile name: config-file overrides win over the built-in table.
    pub fn profile(&self, name: &str) -> HarnessResult<LoadProfile> {
        if let Some(profile) = self.profiles.get(name) {
            return Ok(profile.clone());
        }
        builtin_profiles().remove(name).ok_or_else(|| {
            HarnessError::configuration(format!("unknown load profile '{}'", name))
        })
    }

    /// Every profile name this config can resolve, built-ins included.
    pub fn profile_table(&self) -> BTreeMap<String, LoadProfile> {
        let mut table = builtin_profiles();
        for (name, profile) in &self.profiles {
            table.insert(name.clone(), profile.clone());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
apps:
  - name: django
    port: 8000
    directory: /srv/django
    server_command: ["python", "manage.py", "runserver"]
results_dir: /tmp/results
env_config_dir: /tmp/envs
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = HarnessConfig::load_from_str(MINIMAL).unwrap();
        assert_eq!(config.apps.len(), 1);
        assert_eq!(config.load_generator.program, "locust");
        assert_eq!(config.timing.startup_grace, Duration::from_secs(5));
        assert_eq!(config.timing.sample_interval, Duration::from_secs(1));
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_builtin_profile_resolution() {
        let config = HarnessConfig::load_from_str(MINIMAL).unwrap();
        let profile = config.profile("medium_load").unwrap();
        assert_eq!(profile.users, 50);
        assert!(config.profile("nonexistent").is_err());
    }

    #[test]
    fn test_config_profile_overrides_builtin() {
        let yaml = format!(
            "{}\nprofiles:\n  medium_load:\n    users: 7\n    spawn_rate: 1\n    duration: 30s\n",
            MINIMAL
        );
        let config = HarnessConfig::load_from_str(&yaml).unwrap();
        let profile = config.profile("medium_load").unwrap();
        assert_eq!(profile.users, 7);
        assert_eq!(profile.duration, Duration::from_secs(30));
        // The table view reflects the override and keeps the other built-ins.
        let table = config.profile_table();
        assert_eq!(table["medium_load"].users, 7);
        assert!(table.contains_key("light_load"));
    }

    #[test]
    fn test_timing_overrides_parse_durations() {
        let yaml = format!("{}\ntiming:\n  startup_grace: 500ms\n  probe_attempts: 10\n", MINIMAL);
        let config = HarnessConfig::load_from_str(&yaml).unwrap();
        assert_eq!(config.timing.startup_grace, Duration::from_millis(500));
        assert_eq!(config.timing.probe_attempts, 10);
        // Unspecified fields keep their defaults.
        assert_eq!(config.timing.inter_phase_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_bad_configs() {
        let no_apps = "apps: []\nresults_dir: /tmp/r\nenv_config_dir: /tmp/e\n";
        assert!(HarnessConfig::load_from_str(no_apps).is_err());

        let dup_port = r#"
apps:
  - name: a
    port: 8000
    directory: /srv/a
    server_command: ["run-a"]
  - name: b
    port: 8000
    directory: /srv/b
    server_command: ["run-b"]
results_dir: /tmp/r
env_config_dir: /tmp/e
"#;
        assert!(HarnessConfig::load_from_str(dup_port).is_err());

        let empty_command = r#"
apps:
  - name: a
    port: 8000
    directory: /srv/a
    server_command: []
results_dir: /tmp/r
env_config_dir: /tmp/e
"#;
        assert!(HarnessConfig::load_from_str(empty_command).is_err());
    }

    #[test]
    fn test_app_lookup_error_lists_known_apps() {
        let config = HarnessConfig::load_from_str(MINIMAL).unwrap();
        let err = config.app("flask").unwrap_err();
        assert!(err.to_string().contains("django"));
    }
}
