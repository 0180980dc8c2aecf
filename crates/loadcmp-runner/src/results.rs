//! Result records persisted by a comparison run.

use chrono::{DateTime, Utc};
use loadcmp_common::{HarnessResult, InstrumentationState};
use loadcmp_monitor::ResourceSummary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What the load generator reported for one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadTestOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Tail of the generator's combined output, for quick triage.
    #[serde(default)]
    pub output_tail: String,
    /// Prefix under which the generator wrote its CSV stats, if any.
    pub stats_prefix: Option<PathBuf>,
    pub html_report: Option<PathBuf>,
    pub error: Option<String>,
}

/// Everything recorded for one phase of a comparison.
///
/// A phase that failed before the load ran still produces a record; the
/// absent pieces are simply `None`. Downstream reporting never assumes a
/// phase succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub load_test: Option<LoadTestOutcome>,
    pub resource_summary: Option<ResourceSummary>,
    /// Path of the monitoring artifact, when it was written.
    pub monitoring_file: Option<PathBuf>,
    pub error: Option<String>,
}

impl ExecutionResult {
    /// A record for a phase that failed before producing any data.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            load_test: None,
            resource_summary: None,
            monitoring_file: None,
            error: Some(error.into()),
        }
    }
}

/// The paired record of one full comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub app: String,
    pub profile: String,
    pub generated_at: DateTime<Utc>,
    pub without_instrumentation: ExecutionResult,
    pub with_instrumentation: ExecutionResult,
}

impl ComparisonResult {
    pub fn result_for(&self, state: InstrumentationState) -> &ExecutionResult {
        match state {
            InstrumentationState::WithoutInstrumentation => &self.without_instrumentation,
            InstrumentationState::WithInstrumentation => &self.with_instrumentation,
        }
    }

    /// Both phases produced a successful load run.
    pub fn is_complete(&self) -> bool {
        self.without_instrumentation.success && self.with_instrumentation.success
    }

    pub fn save(&self, path: &Path) -> HarnessResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison() -> ComparisonResult {
        ComparisonResult {
            app: "django".to_string(),
            profile: "light_load".to_string(),
            generated_at: Utc::now(),
            without_instrumentation: ExecutionResult {
                success: true,
                load_test: Some(LoadTestOutcome {
                    success: true,
                    exit_code: Some(0),
                    output_tail: String::new(),
                    stats_prefix: None,
                    html_report: None,
                    error: None,
                }),
                resource_summary: Some(ResourceSummary::default()),
                monitoring_file: None,
                error: None,
            },
            with_instrumentation: ExecutionResult::failed("server never became responsive"),
        }
    }

    #[test]
    fn test_result_for_matches_state_key() {
        let c = comparison();
        assert!(c.result_for(InstrumentationState::WithoutInstrumentation).success);
        assert!(!c.result_for(InstrumentationState::WithInstrumentation).success);
        assert!(!c.is_complete());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comparison.json");
        let original = comparison();
        original.save(&path).unwrap();

        let loaded = ComparisonResult::load(&path).unwrap();
        assert_eq!(loaded.app, "django");
        assert!(loaded.without_instrumentation.success);
        assert_eq!(
            loaded.with_instrumentation.error.as_deref(),
            Some("server never became responsive")
        );
    }

    #[test]
    fn test_json_uses_state_keys() {
        let json = serde_json::to_value(comparison()).unwrap();
        assert!(json.get("without_instrumentation").is_some());
        assert!(json.get("with_instrumentation").is_some());
    }
}
