//! Berm CLI library components.
//!
//! The binary in `main.rs` parses arguments and installs logging; the
//! commands here do the work and return the process exit status.

pub mod commands;
pub mod formatters;

pub use commands::RunContext;

/// No blocking violations
pub const EXIT_SUCCESS: i32 = 0;

/// Blocking violations, invalid rules, or an unknown rule id
pub const EXIT_BLOCKING: i32 = 1;

/// Berm itself failed (configuration, security checks, unreadable inputs)
pub const EXIT_FAILURE: i32 = 2;
