//! Property resolution over resource data trees.

use berm_core::{Limits, PropertyPath, Segment};
use serde_json::Value;

/// Returns the value at `path` inside `tree`, or `None` when absent.
///
/// A key segment needs an object containing that key; an index segment needs
/// an array long enough. Anything else is absent, never an error. Paths over
/// `max_property_depth` segments or indexing past `max_array_index` resolve
/// to absent as well.
pub fn resolve<'a>(tree: &'a Value, path: &PropertyPath, limits: &Limits) -> Option<&'a Value> {
    let segments = path.segments();
    if segments.len() > limits.max_property_depth {
        return None;
    }

    let mut current = tree;
    for segment in segments {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(index) => {
                if *index > limits.max_array_index {
                    return None;
                }
                current.as_array()?.get(*index)?
            }
        };
    }

    Some(current)
}
