//! Berm Rule Engine - JSON policy rules evaluated against plan resources
//!
//! This crate turns rule files into validated [`Rule`]s and applies them to
//! normalized plan [`Resource`](berm_core::Resource)s.
//!
//! # Architecture
//!
//! - **Schema** ([`rule`]): explicit validation of each rule object into a
//!   closed [`Operator`]; regexes compiled once at load time
//! - **Loading** ([`loader`]): recursive, sorted discovery through the scoped
//!   filesystem; any bad file aborts the load
//! - **Resolution** ([`resolver`]): dot-notation lookup returning `None` for
//!   absent properties
//! - **Comparison** ([`matcher`]): operator semantics with string coercion
//! - **Accumulation** ([`engine`]): every rule against every resource, in order
//!
//! # Example
//!
//! ```json
//! {
//!   "id": "s3-versioning",
//!   "name": "S3 buckets must have versioning enabled",
//!   "resource_type": "aws_s3_bucket",
//!   "severity": "error",
//!   "property": "versioning_configuration.0.status",
//!   "equals": "Enabled",
//!   "message": "Bucket {{resource_name}} must have versioning enabled"
//! }
//! ```

pub mod constants;
pub mod engine;
pub mod loader;
pub mod matcher;
pub mod resolver;
pub mod rule;

// Re-export core types
pub use constants::*;
pub use engine::RuleEngine;
pub use loader::RuleLoader;
pub use matcher::{evaluate, values_equal};
pub use resolver::resolve;
pub use rule::{parse_rule, Operator, ResourceTypes, Rule, RuleCheck, OPERATOR_FIELDS};

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Error types for rule engine
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Invalid rule: {reason}")]
    InvalidRule { reason: String },

    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to load rules from {path}: {source}")]
    LoadError {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No rule files (*.json) found in {path}")]
    NoRuleFiles { path: String },

    #[error("Duplicate rule id '{id}' in {first} and {second}")]
    DuplicateRuleId {
        id: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Security(#[from] berm_core::Error),
}
