//! Regex compilation limits for the rule engine
//!
//! The regex crate matches in linear time, so these limits only bound the
//! memory a single `regex_match` pattern can claim while compiling and
//! matching.

/// Maximum regex pattern length (500 characters)
///
/// Longer patterns are rejected at rule load time.
pub const MAX_REGEX_LENGTH: usize = 500;

/// Compiled regex size limit (10MB)
pub const REGEX_SIZE_LIMIT: usize = 10_000_000;

/// Regex DFA size limit (2MB)
pub const REGEX_DFA_SIZE_LIMIT: usize = 2_000_000;

/// Extension of rule files, without the dot
pub const RULE_FILE_EXTENSION: &str = "json";
