//! # loadcmp-process
//!
//! Low-level process primitives for the harness:
//! - Spawn registry with uniform graceful/forceful shutdown
//! - Cross-process termination and existence checks
//! - Port-based process discovery via `/proc`

pub mod ports;
pub mod registry;
pub mod terminate;

pub use ports::{fd_count, find_pid_by_port, thread_count};
pub use registry::{ProcessRegistry, ProcessSpec};
pub use terminate::{force_kill, process_exists, terminate_gracefully};
