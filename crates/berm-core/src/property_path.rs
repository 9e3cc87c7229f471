//! Dot-notation property paths.

use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fmt;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key lookup.
    Key(String),
    /// Array index, for segments made entirely of ASCII digits.
    Index(usize),
}

/// A validated property path such as `versioning_configuration.0.status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<Segment>,
}

impl PropertyPath {
    /// Parses and validates a dot-notation path.
    ///
    /// Rejects empty paths, paths longer than `max_property_path_length`,
    /// more than `max_property_depth` segments, empty segments, segments with
    /// NUL/CR/LF, and indices above `max_array_index`.
    pub fn parse(path: &str, limits: &Limits) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::property(path, "path is empty"));
        }

        let len = path.chars().count();
        if len > limits.max_property_path_length {
            return Err(Error::property(
                path,
                format!(
                    "path length {} exceeds max {}",
                    len, limits.max_property_path_length
                ),
            ));
        }

        let parts: Vec<&str> = path.split('.').collect();
        if parts.len() > limits.max_property_depth {
            return Err(Error::property(
                path,
                format!(
                    "path depth {} exceeds max {}",
                    parts.len(),
                    limits.max_property_depth
                ),
            ));
        }

        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() {
                return Err(Error::property(path, "path contains an empty segment"));
            }
            if part.contains(['\0', '\n', '\r']) {
                return Err(Error::property(path, "path contains invalid characters"));
            }

            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index: usize = part.parse().map_err(|_| {
                    Error::property(path, format!("array index {part} is out of range"))
                })?;
                if index > limits.max_array_index {
                    return Err(Error::property(
                        path,
                        format!(
                            "array index {} exceeds max {}",
                            index, limits.max_array_index
                        ),
                    ));
                }
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Key(part.to_string()));
            }
        }

        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validates a property path. Alias for [`PropertyPath::parse`].
pub fn validate_property_path(path: &str, limits: &Limits) -> Result<PropertyPath> {
    PropertyPath::parse(path, limits)
}
