//! Environment staging: select which `.env` variant the app boots with.
//!
//! The instrumentation toggle lives entirely in the app's `.env` file. Each
//! app ships two prepared variants in the env config directory, named
//! `.env.<app>.<variant>`, and the configuring step copies the requested one
//! to `<app directory>/.env` before the server starts.

use crate::config::AppConfig;
use loadcmp_common::{HarnessError, HarnessResult, InstrumentationState};
use std::path::{Path, PathBuf};
use tracing::info;

/// Copy the env variant for `state` into the app directory as `.env`.
/// Returns the path of the staged file. A missing variant is a configuration
/// error; the caller fails the phase before anything is spawned.
pub fn configure_environment(
    env_config_dir: &Path,
    app: &AppConfig,
    state: InstrumentationState,
) -> HarnessResult<PathBuf> {
    let source = env_config_dir.join(format!(".env.{}.{}", app.name, state.env_suffix()));
    if !source.is_file() {
        return Err(HarnessError::configuration(format!(
            "environment file {} not found",
            source.display()
        )));
    }

    let target = app.directory.join(".env");
    std::fs::copy(&source, &target).map_err(|e| {
        HarnessError::configuration(format!(
            "cannot stage {} as {}: {}",
            source.display(),
            target.display(),
            e
        ))
    })?;

    info!("Configured {} for {}", app.name, state.title());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_in(dir: &Path) -> AppConfig {
        AppConfig {
            name: "django".to_string(),
            port: 8000,
            directory: dir.to_path_buf(),
            server_command: vec!["true".to_string()],
            worker_command: None,
        }
    }

    #[test]
    fn test_stages_requested_variant() {
        let envs = tempfile::tempdir().unwrap();
        let appdir = tempfile::tempdir().unwrap();
        std::fs::write(
            envs.path().join(".env.django.without_insights"),
            "INSIGHTS_ENABLED=false\n",
        )
        .unwrap();
        std::fs::write(
            envs.path().join(".env.django.with_insights"),
            "INSIGHTS_ENABLED=true\n",
        )
        .unwrap();

        let app = app_in(appdir.path());
        let staged = configure_environment(
            envs.path(),
            &app,
            InstrumentationState::WithInstrumentation,
        )
        .unwrap();

        assert_eq!(staged, appdir.path().join(".env"));
        let content = std::fs::read_to_string(&staged).unwrap();
        assert!(content.contains("INSIGHTS_ENABLED=true"));

        // Switching variants overwrites the staged file.
        configure_environment(
            envs.path(),
            &app,
            InstrumentationState::WithoutInstrumentation,
        )
        .unwrap();
        let content = std::fs::read_to_string(&staged).unwrap();
        assert!(content.contains("INSIGHTS_ENABLED=false"));
    }

    #[test]
    fn test_missing_variant_is_configuration_error() {
        let envs = tempfile::tempdir().unwrap();
        let appdir = tempfile::tempdir().unwrap();
        let app = app_in(appdir.path());

        let err = configure_environment(
            envs.path(),
            &app,
            InstrumentationState::WithInstrumentation,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::Configuration { .. }));
        assert!(err.to_string().contains(".env.django.with_insights"));
    }
}
