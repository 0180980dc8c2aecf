//! # loadcmp-common
//!
//! Shared foundation for the loadcmp harness:
//! - Error taxonomy (`HarnessError`) and `HarnessResult` alias
//! - Instrumentation state and load profile types
//! - String duration (de)serialization used in config files and artifacts

pub mod duration;
pub mod errors;
pub mod types;

pub use duration::{duration_serde, format_duration, parse_duration};
pub use errors::{HarnessError, HarnessResult};
pub use types::{builtin_profiles, InstrumentationState, LoadProfile};
