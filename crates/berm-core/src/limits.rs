//! Sanitization limits
//!
//! These limits bound everything the evaluator will ever see:
//! - Memory exhaustion via oversized rule or plan files
//! - Path traversal and shell metacharacters in filenames
//! - Excessive nesting in JSON documents and property paths
//! - Unbounded output toward reporters

use serde::{Deserialize, Serialize};

/// Maximum size for rule and plan files (50MB)
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Maximum length of a filesystem path, before and after resolution
pub const MAX_PATH_LENGTH: usize = 4096;

/// Maximum number of segments in a property path
pub const MAX_PROPERTY_DEPTH: usize = 20;

/// Maximum length of a property path in characters
pub const MAX_PROPERTY_PATH_LENGTH: usize = 1000;

/// Largest array index a property path may address
pub const MAX_ARRAY_INDEX: usize = 100;

/// Maximum container nesting in parsed JSON documents
pub const MAX_JSON_DEPTH: usize = 50;

/// Deepest container nesting serde_json accepts before its recursion limit.
pub const PARSER_MAX_JSON_DEPTH: usize = 127;

/// Maximum length of any string handed to a reporter, in characters
pub const MAX_OUTPUT_LENGTH: usize = 10_000;

/// Maximum directory depth when discovering rule files
pub const MAX_DIRECTORY_DEPTH: usize = 10;

/// Characters rejected in filenames (shell metacharacters, quotes, control characters)
pub const DANGEROUS_FILENAME_CHARS: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '{', '}', '[', ']', '"', '\'', '\\', '\n', '\r',
    '\t', '\0',
];

/// Process-wide limits, built once at startup and passed explicitly.
///
/// Every field can be overridden from the `[limits]` table of `berm.toml`;
/// omitted fields keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_file_size: u64,
    pub max_path_length: usize,
    pub max_property_depth: usize,
    pub max_property_path_length: usize,
    pub max_array_index: usize,
    pub max_json_depth: usize,
    pub max_output_length: usize,
    pub max_directory_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            max_path_length: MAX_PATH_LENGTH,
            max_property_depth: MAX_PROPERTY_DEPTH,
            max_property_path_length: MAX_PROPERTY_PATH_LENGTH,
            max_array_index: MAX_ARRAY_INDEX,
            max_json_depth: MAX_JSON_DEPTH,
            max_output_length: MAX_OUTPUT_LENGTH,
            max_directory_depth: MAX_DIRECTORY_DEPTH,
        }
    }
}

impl Limits {
    /// Names of limits set to zero, which would reject every input.
    pub fn zero_fields(&self) -> Vec<&'static str> {
        let fields = [
            ("max_file_size", self.max_file_size == 0),
            ("max_path_length", self.max_path_length == 0),
            ("max_property_depth", self.max_property_depth == 0),
            ("max_property_path_length", self.max_property_path_length == 0),
            ("max_json_depth", self.max_json_depth == 0),
            ("max_output_length", self.max_output_length == 0),
            ("max_directory_depth", self.max_directory_depth == 0),
        ];
        fields
            .into_iter()
            .filter_map(|(name, is_zero)| is_zero.then_some(name))
            .collect()
    }
}
