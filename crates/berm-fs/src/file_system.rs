//! Value types shared by filesystem operations.

use berm_core::Limits;

/// File metadata for a validated (symlink-resolved) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Whether the path exists.
    pub exists: bool,
    /// Whether the path is a file (false if directory or doesn't exist).
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// File size in bytes (0 for directories or non-existent files).
    pub size: u64,
}

impl FileMetadata {
    pub(crate) fn missing() -> Self {
        Self {
            exists: false,
            is_file: false,
            is_dir: false,
            size: 0,
        }
    }
}

/// Options for file discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum directory depth below the discovery root.
    pub max_depth: usize,

    /// Follow symbolic links (default: false). Unfollowed links that would
    /// have been discovered are reported as errors.
    pub follow_symlinks: bool,

    /// Include hidden files and directories (default: true).
    pub include_hidden: bool,

    /// Honour .gitignore/.ignore files (default: false, so no rule file is
    /// skipped without the user noticing).
    pub respect_ignore_files: bool,
}

impl DiscoveryOptions {
    /// Defaults bounded by `limits.max_directory_depth`.
    pub fn from_limits(limits: &Limits) -> Self {
        Self {
            max_depth: limits.max_directory_depth,
            ..Default::default()
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: berm_core::MAX_DIRECTORY_DEPTH,
            follow_symlinks: false,
            include_hidden: true,
            respect_ignore_files: false,
        }
    }
}
