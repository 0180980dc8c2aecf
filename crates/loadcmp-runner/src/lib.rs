//! # loadcmp-runner
//!
//! Comparison orchestration for the harness:
//! - `HarnessConfig` loads and validates the YAML configuration
//! - `configure_environment` stages the `.env` variant for a phase
//! - `run_load_generator` drives the locust-style load program
//! - `TestRunner` executes the two-phase comparison and persists the record

pub mod config;
pub mod envfile;
pub mod loadgen;
pub mod results;
pub mod runner;

pub use config::{AppConfig, HarnessConfig, LoadGeneratorConfig, TimingConfig};
pub use envfile::configure_environment;
pub use loadgen::run_load_generator;
pub use results::{ComparisonResult, ExecutionResult, LoadTestOutcome};
pub use runner::TestRunner;
