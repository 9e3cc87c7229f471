//! Native filesystem implementation using std::fs.

use crate::{DiscoveryOptions, FileMetadata};
use berm_core::{
    validate_file_size, validate_json_depth, validate_json_text_depth, validate_safe_directory,
    validate_safe_path, Error, Limits, Result, SafeDir, SafePath,
};
use ignore::WalkBuilder;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const UTF8_BOM: char = '\u{feff}';

/// Filesystem reader scoped to a validated root directory.
///
/// Relative paths are resolved against the root; anything resolving outside
/// it is rejected with [`Error::PathTraversal`].
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    root: SafeDir,
    limits: Limits,
}

impl NativeFileSystem {
    /// Create a filesystem scoped to `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDirectory`] if the root doesn't exist or isn't
    /// a directory.
    pub fn new(root: impl AsRef<Path>, limits: Limits) -> Result<Self> {
        let root = root.as_ref();
        let root = validate_safe_directory(root, root, &limits)?;
        Ok(Self { root, limits })
    }

    /// Create a filesystem for `dir`, which must lie inside this one's root.
    pub fn scoped(&self, dir: &Path) -> Result<Self> {
        let root = validate_safe_directory(dir, self.root.as_path(), &self.limits)?;
        Ok(Self {
            root,
            limits: self.limits,
        })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate that a path is within the root.
    pub fn validate_path(&self, path: &Path) -> Result<SafePath> {
        validate_safe_path(path, self.root.as_path(), &self.limits)
    }

    /// Get file/directory metadata.
    ///
    /// Returns metadata even if the file doesn't exist (exists=false).
    pub fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let validated = self.validate_path(path)?;
        match std::fs::metadata(validated.as_path()) {
            Ok(meta) => Ok(FileMetadata {
                exists: true,
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                size: meta.len(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileMetadata::missing()),
            Err(source) => Err(Error::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Read file contents as a string.
    ///
    /// Validates the path and the file size before reading, and strips a
    /// leading UTF-8 byte order mark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] with `InvalidData` if the file is not valid UTF-8.
    pub fn read_to_string(&self, path: &Path) -> Result<String> {
        let validated = self.validate_path(path)?;
        let size = validate_file_size(validated.as_path(), &self.limits)?;
        debug!(path = %validated, size, "reading file");

        let bytes = std::fs::read(validated.as_path()).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut contents = String::from_utf8(bytes).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        if contents.starts_with(UTF8_BOM) {
            contents.drain(..UTF8_BOM.len_utf8());
        }

        Ok(contents)
    }

    /// Read and parse a JSON document.
    ///
    /// Nesting depth is checked on the raw text before parsing and again on
    /// the parsed value, so deep input always fails with
    /// [`Error::JsonTooDeep`].
    pub fn read_json(&self, path: &Path) -> Result<Value> {
        let contents = self.read_to_string(path)?;
        validate_json_text_depth(&contents, &self.limits)?;
        let value: Value = serde_json::from_str(&contents).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        validate_json_depth(&value, &self.limits)?;
        Ok(value)
    }

    /// Recursively discover files under `dir` with one of `extensions`
    /// (case-insensitive, without the dot).
    ///
    /// Every result is canonical and inside the root. Results are sorted.
    ///
    /// # Errors
    ///
    /// Discovery never drops a candidate silently. It fails with
    /// [`Error::DirectoryTooDeep`] when a directory or matching file lies
    /// below `options.max_depth`, with [`Error::SymlinkNotFollowed`] for a
    /// symlinked directory or matching file when links are not followed, and
    /// with [`Error::PathTraversal`] when a followed link leaves the root.
    pub fn discover_files(
        &self,
        dir: &Path,
        extensions: &[&str],
        options: &DiscoveryOptions,
    ) -> Result<Vec<PathBuf>> {
        let start = validate_safe_directory(dir, self.root.as_path(), &self.limits)?;
        discover_files_sync(start.as_path(), extensions, options, self.root.as_path())
    }
}

fn discover_files_sync(
    start: &Path,
    extensions: &[&str],
    options: &DiscoveryOptions,
    root: &Path,
) -> Result<Vec<PathBuf>> {
    let mut discovered = BTreeSet::new();

    // One level past the limit, so anything beyond it is seen and reported.
    let mut walker = WalkBuilder::new(start);
    walker
        .follow_links(options.follow_symlinks)
        .hidden(!options.include_hidden)
        .ignore(options.respect_ignore_files)
        .git_ignore(options.respect_ignore_files)
        .git_global(options.respect_ignore_files)
        .git_exclude(options.respect_ignore_files)
        .parents(options.respect_ignore_files)
        .max_depth(Some(options.max_depth.saturating_add(1)));

    for result in walker.build() {
        let entry = result.map_err(|e| Error::Io {
            path: start.to_path_buf(),
            source: io::Error::other(e),
        })?;
        if entry.depth() == 0 {
            continue;
        }

        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)));

        if !options.follow_symlinks && entry.path_is_symlink() {
            let points_to_dir = std::fs::metadata(path).is_ok_and(|meta| meta.is_dir());
            if matches_extension || points_to_dir {
                return Err(Error::SymlinkNotFollowed {
                    path: path.to_path_buf(),
                });
            }
            continue;
        }

        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if entry.depth() > options.max_depth && (is_dir || (is_file && matches_extension)) {
            return Err(Error::DirectoryTooDeep {
                path: path.to_path_buf(),
                depth: entry.depth(),
                max_allowed: options.max_depth,
            });
        }
        if !is_file || !matches_extension {
            continue;
        }

        let canonical = path.canonicalize().map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !canonical.starts_with(root) {
            return Err(Error::PathTraversal {
                path: path.to_path_buf(),
                reason: format!("resolves to {} outside the root", canonical.display()),
            });
        }
        discovered.insert(canonical);
    }

    debug!(dir = %start.display(), count = discovered.len(), "discovered files");
    Ok(discovered.into_iter().collect())
}
