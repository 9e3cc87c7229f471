//! Terraform plan extraction.

use crate::{PlanError, Result};
use berm_core::{validate_extension, Resource};
use berm_fs::NativeFileSystem;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Extension of plan files, without the dot
pub const PLAN_FILE_EXTENSION: &str = "json";

/// Load a plan file and extract its resources.
///
/// # Errors
///
/// - [`PlanError::Security`] if the path, size or nesting checks fail, or the
///   file is not JSON
/// - [`PlanError::InvalidPlan`] if the document doesn't have a plan's shape
pub fn load_plan(fs: &NativeFileSystem, path: &Path) -> Result<Vec<Resource>> {
    validate_extension(path, &[PLAN_FILE_EXTENSION])?;
    let plan = fs.read_json(path)?;

    let resources = resources_from_plan(&plan).map_err(|reason| PlanError::InvalidPlan {
        path: path.display().to_string(),
        reason,
    })?;

    info!(path = %path.display(), count = resources.len(), "loaded plan");
    Ok(resources)
}

/// Extracts resources from a parsed plan document.
///
/// Entries that are not objects, have no actions, or only delete or no-op
/// are skipped. `values` is `change.after`, else `change.before`, else `{}`.
/// Returns the reason when the document itself is malformed.
pub fn resources_from_plan(plan: &Value) -> std::result::Result<Vec<Resource>, String> {
    let root = plan
        .as_object()
        .ok_or_else(|| "plan must be a JSON object".to_string())?;

    let changes = match root.get("resource_changes") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(changes)) => changes,
        Some(_) => return Err("'resource_changes' must be a list".to_string()),
    };

    let mut resources = Vec::with_capacity(changes.len());
    for (index, entry) in changes.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            debug!(index, "skipping non-object resource change");
            continue;
        };
        let change = entry.get("change").and_then(Value::as_object);

        if !is_create_or_update(change) {
            debug!(index, address = string_field(entry, "address"), "skipping resource change");
            continue;
        }

        let values = change
            .and_then(|c| non_null(c, "after").or_else(|| non_null(c, "before")))
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        resources.push(Resource::new(
            string_field(entry, "address"),
            string_field(entry, "type"),
            string_field(entry, "name"),
            values,
        ));
    }

    Ok(resources)
}

fn is_create_or_update(change: Option<&Map<String, Value>>) -> bool {
    let actions: Vec<&str> = change
        .and_then(|c| c.get("actions"))
        .and_then(Value::as_array)
        .map(|actions| actions.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    !matches!(actions.as_slice(), [] | ["delete"] | ["no-op"])
}

fn non_null<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or_default()
}
