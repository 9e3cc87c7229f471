//! Berm Core - Data model, limits and the input sanitization boundary.
//!
//! Everything that reaches the rule evaluator first passes through this
//! crate. It defines:
//!
//! - [`Limits`]: the immutable bounds (file size, path length, JSON depth,
//!   property path shape, output length) built once per process
//! - [`validate_safe_path`], [`validate_safe_directory`], [`validate_file_size`],
//!   [`validate_json_text_depth`], [`validate_json_depth`]: the checks run
//!   before and right after any untrusted byte is parsed
//! - [`PropertyPath`]: a validated dot-notation path into a resource tree
//! - [`sanitize_for_output`]: the last step before a string reaches a reporter
//! - [`Resource`], [`Violation`], [`EvaluationReport`]: the shared data model
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    berm-cli     │  (commands, reporters)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │berm-rule-engine │     │    berm-plan    │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌─────────────────────────────────────────┐
//! │      berm-fs  (scoped, checked reads)   │
//! └────────────────────┬────────────────────┘
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │      berm-core  (this crate)            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use berm_core::{validate_safe_path, Limits};
//! use std::path::Path;
//!
//! let limits = Limits::default();
//! let safe = validate_safe_path(Path::new("plan.json"), Path::new("."), &limits)?;
//! println!("reading {safe}");
//! # Ok::<(), berm_core::Error>(())
//! ```

pub mod error;
pub mod limits;
pub mod property_path;
pub mod sanitize;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
pub use limits::{
    Limits, DANGEROUS_FILENAME_CHARS, MAX_ARRAY_INDEX, MAX_DIRECTORY_DEPTH, MAX_FILE_SIZE,
    MAX_JSON_DEPTH, MAX_OUTPUT_LENGTH, MAX_PATH_LENGTH, MAX_PROPERTY_DEPTH,
    MAX_PROPERTY_PATH_LENGTH, PARSER_MAX_JSON_DEPTH,
};
pub use property_path::{validate_property_path, PropertyPath, Segment};
pub use sanitize::{sanitize_for_output, OutputContext, TRUNCATION_MARKER};
pub use types::{EvaluationReport, Resource, Severity, Violation};
pub use validation::{
    validate_extension, validate_file_size, validate_json_depth, validate_json_text_depth,
    validate_safe_directory, validate_safe_path, SafeDir, SafePath,
};
