//! Error types for the sanitization boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for boundary operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised when externally supplied input crosses the trust boundary.
///
/// Every variant is terminal for the current invocation: the input is static,
/// so retrying cannot succeed.
#[derive(Debug, Error)]
pub enum Error {
    /// Path escapes its base directory or is otherwise unsafe to open.
    #[error("Path traversal: {path:?} rejected: {reason}")]
    PathTraversal {
        /// Path as supplied by the caller.
        path: PathBuf,
        /// Why the path was rejected.
        reason: String,
    },

    /// Path is not an existing, readable directory.
    #[error("Invalid directory {path:?}: {reason}")]
    InvalidDirectory {
        /// Path as supplied by the caller.
        path: PathBuf,
        /// Why the directory was rejected.
        reason: String,
    },

    /// File is larger than the configured limit.
    #[error("File {path:?} is {size} bytes, max allowed is {max_allowed}")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_allowed: u64,
    },

    /// Parsed JSON nests deeper than the configured limit.
    #[error("JSON nesting depth {depth} exceeds max {max_allowed}")]
    JsonTooDeep { depth: usize, max_allowed: usize },

    /// Discovery found entries nested deeper than the configured limit.
    #[error("{path:?} is {depth} levels below the discovery root, max allowed is {max_allowed}")]
    DirectoryTooDeep {
        path: PathBuf,
        depth: usize,
        max_allowed: usize,
    },

    /// Discovery met a symbolic link it will not follow.
    #[error("Symbolic link {path:?} is not followed; replace it with its target")]
    SymlinkNotFollowed { path: PathBuf },

    /// Dot-notation property path is malformed or out of bounds.
    #[error("Invalid property path {path:?}: {reason}")]
    InvalidPropertyPath { path: String, reason: String },

    /// File extension is not one of the accepted ones.
    #[error("Invalid file extension for {path:?}, expected one of: {}", allowed.join(", "))]
    InvalidExtension {
        path: PathBuf,
        allowed: Vec<String>,
    },

    /// I/O error while reading an already validated path.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error.
    #[error("JSON parse error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn traversal(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::PathTraversal {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn property(path: &str, reason: impl Into<String>) -> Self {
        Error::InvalidPropertyPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
