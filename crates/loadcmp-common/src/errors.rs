//! Error types for the loadcmp harness.
//!
//! Every phase-level failure is converted into a result record at the phase
//! boundary; these variants carry the context needed for that record.

use thiserror::Error;

/// Result type alias for harness operations.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Main error type for harness operations.
///
/// The variants mirror the failure taxonomy of a comparison run:
/// configuration problems abort only the current phase, startup problems
/// trigger cleanup, execution and monitoring problems are recorded without
/// aborting the sibling phase, and cleanup problems are logged but never
/// propagated past the teardown path.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Missing or invalid configuration (e.g. absent environment file).
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// A spawned application did not become responsive within the grace period.
    #[error("Startup failed for {target}: {reason}")]
    Startup { target: String, reason: String },

    /// Load generator exited nonzero or hit the wall-clock timeout.
    #[error("Load execution failed: {reason}")]
    Execution { reason: String },

    /// A sample capture or monitoring artifact write failed.
    #[error("Monitoring error: {reason}")]
    Monitoring { reason: String },

    /// A process failed to terminate; the port sweep is the fallback.
    #[error("Cleanup error for {target}: {reason}")]
    Cleanup { target: String, reason: String },

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Creates a Configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Creates a Startup error.
    pub fn startup(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Startup {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates an Execution error.
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates a Monitoring error.
    pub fn monitoring(reason: impl Into<String>) -> Self {
        Self::Monitoring {
            reason: reason.into(),
        }
    }

    /// Creates a Cleanup error.
    pub fn cleanup(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cleanup {
            target: target.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let err = HarnessError::configuration("env file missing");
        assert!(matches!(err, HarnessError::Configuration { .. }));
        assert_eq!(err.to_string(), "Configuration error: env file missing");

        let err = HarnessError::startup("django", "connection refused");
        assert!(matches!(err, HarnessError::Startup { .. }));
        assert!(err.to_string().contains("django"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: HarnessError = io.into();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
