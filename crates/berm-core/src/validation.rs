//! Input validation and security checks.
//!
//! Every path that will be opened and every directory that will be scanned
//! goes through these checks before any byte is read. JSON text goes
//! through [`validate_json_text_depth`] before it is parsed and through
//! [`validate_json_depth`] before anything else looks at the value.
//!
//! The window between validating a path and reading it (TOCTOU) is an
//! accepted residual risk.

use crate::error::{Error, Result};
use crate::limits::{Limits, DANGEROUS_FILENAME_CHARS, PARSER_MAX_JSON_DEPTH};
use serde_json::Value;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A canonical path proven to lie inside its base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SafePath(PathBuf);

impl SafePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SafePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// A canonical path to an existing directory inside its base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeDir(PathBuf);

impl SafeDir {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafeDir {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SafeDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// Validates that `path` resolves to a location inside `base_dir`.
///
/// Relative paths are resolved against `base_dir`. Symlinks are resolved for
/// every existing prefix of the path, so neither `..` nor a symlink can be
/// used to escape. The file itself does not need to exist.
///
/// # Errors
///
/// - [`Error::PathTraversal`] for empty paths, NUL bytes, over-long paths,
///   dangerous filename characters, or a resolved path outside `base_dir`
/// - [`Error::InvalidDirectory`] if `base_dir` cannot be canonicalized
pub fn validate_safe_path(path: &Path, base_dir: &Path, limits: &Limits) -> Result<SafePath> {
    check_raw_path(path, limits)?;
    check_filename(path)?;

    let base = canonical_base(base_dir)?;
    let resolved = resolve_within(path, &base, limits)?;

    Ok(SafePath(resolved))
}

/// Validates that `path` is an existing directory inside `base_dir`.
pub fn validate_safe_directory(path: &Path, base_dir: &Path, limits: &Limits) -> Result<SafeDir> {
    check_raw_path(path, limits)?;
    check_filename(path)?;

    let base = canonical_base(base_dir)?;
    let resolved = resolve_within(path, &base, limits)?;

    match std::fs::metadata(&resolved) {
        Ok(meta) if meta.is_dir() => Ok(SafeDir(resolved)),
        Ok(_) => Err(Error::InvalidDirectory {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(Error::InvalidDirectory {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Checks the file size before its content is read. Returns the size.
pub fn validate_file_size(path: &Path, limits: &Limits) -> Result<u64> {
    let meta = std::fs::metadata(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let size = meta.len();
    if size > limits.max_file_size {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size,
            max_allowed: limits.max_file_size,
        });
    }

    Ok(size)
}

/// Checks the extension against an allow-list (case-insensitive, without dot).
pub fn validate_extension(path: &Path, allowed: &[&str]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
        _ => Err(Error::InvalidExtension {
            path: path.to_path_buf(),
            allowed: allowed.iter().map(|a| format!(".{a}")).collect(),
        }),
    }
}

/// Fails if `value` nests containers deeper than `limits.max_json_depth`.
///
/// A scalar has depth 0, `[]` and `{}` depth 1, `[[1]]` depth 2. Walks with
/// an explicit stack, so adversarial nesting cannot overflow the call stack.
pub fn validate_json_depth(value: &Value, limits: &Limits) -> Result<()> {
    let max = limits.max_json_depth;
    let mut stack: Vec<(&Value, usize)> = vec![(value, 0)];

    while let Some((node, parent_depth)) = stack.pop() {
        let depth = parent_depth + 1;
        match node {
            Value::Array(items) => {
                if depth > max {
                    return Err(Error::JsonTooDeep {
                        depth,
                        max_allowed: max,
                    });
                }
                stack.extend(items.iter().map(|item| (item, depth)));
            }
            Value::Object(map) => {
                if depth > max {
                    return Err(Error::JsonTooDeep {
                        depth,
                        max_allowed: max,
                    });
                }
                stack.extend(map.values().map(|item| (item, depth)));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Fails if raw JSON `text` opens containers deeper than the depth limit.
///
/// Runs before parsing so deep input is reported as [`Error::JsonTooDeep`]
/// instead of a parser error. Brackets inside string literals do not count.
/// The bound is `limits.max_json_depth`, capped at [`PARSER_MAX_JSON_DEPTH`].
pub fn validate_json_text_depth(text: &str, limits: &Limits) -> Result<()> {
    let max_allowed = limits.max_json_depth.min(PARSER_MAX_JSON_DEPTH);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > max_allowed {
                    return Err(Error::JsonTooDeep { depth, max_allowed });
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    Ok(())
}

fn check_raw_path(path: &Path, limits: &Limits) -> Result<()> {
    let raw = path.as_os_str().to_string_lossy();

    if raw.is_empty() {
        return Err(Error::traversal(path, "path is empty"));
    }
    if raw.contains('\0') {
        return Err(Error::traversal(path, "null bytes are not allowed"));
    }
    let len = raw.chars().count();
    if len > limits.max_path_length {
        return Err(Error::traversal(
            path,
            format!("path length {} exceeds max {}", len, limits.max_path_length),
        ));
    }

    Ok(())
}

fn check_filename(path: &Path) -> Result<()> {
    let Some(name) = path.file_name() else {
        return Ok(());
    };
    let name = name.to_string_lossy();

    let found: Vec<char> = name
        .chars()
        .filter(|c| DANGEROUS_FILENAME_CHARS.contains(c))
        .collect();
    if !found.is_empty() {
        return Err(Error::traversal(
            path,
            format!("filename contains dangerous characters: {found:?}"),
        ));
    }

    Ok(())
}

fn canonical_base(base_dir: &Path) -> Result<PathBuf> {
    base_dir
        .canonicalize()
        .map_err(|e| Error::InvalidDirectory {
            path: base_dir.to_path_buf(),
            reason: format!("cannot canonicalize base directory: {e}"),
        })
}

fn resolve_within(path: &Path, base: &Path, limits: &Limits) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let resolved = resolve_path(&absolute);

    let len = resolved.as_os_str().to_string_lossy().chars().count();
    if len > limits.max_path_length {
        return Err(Error::traversal(
            path,
            format!(
                "resolved path length {} exceeds max {}",
                len, limits.max_path_length
            ),
        ));
    }

    if !resolved.starts_with(base) {
        return Err(Error::traversal(
            path,
            format!(
                "resolves to {} which is outside base directory {}",
                resolved.display(),
                base.display()
            ),
        ));
    }

    Ok(resolved)
}

/// Canonicalizes the deepest existing ancestor, then applies the remaining
/// components lexically.
fn resolve_path(absolute: &Path) -> PathBuf {
    let mut pending: Vec<Component<'_>> = Vec::new();
    let mut current = absolute;

    let mut resolved = loop {
        if let Ok(canonical) = current.canonicalize() {
            break canonical;
        }
        match (current.parent(), current.components().next_back()) {
            (Some(parent), Some(last)) => {
                pending.push(last);
                current = parent;
            }
            _ => break current.to_path_buf(),
        }
    };

    for component in pending.into_iter().rev() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            Component::Normal(name) => resolved.push(name),
            Component::RootDir | Component::Prefix(_) => resolved.push(component.as_os_str()),
        }
    }

    resolved
}
