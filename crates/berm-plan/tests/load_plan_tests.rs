//! Plan loading through the scoped filesystem.

use berm_core::{Error, Limits};
use berm_fs::NativeFileSystem;
use berm_plan::{load_plan, PlanError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLAN: &str = r#"{
  "format_version": "1.2",
  "terraform_version": "1.7.0",
  "resource_changes": [
    {
      "address": "aws_s3_bucket.logs",
      "mode": "managed",
      "type": "aws_s3_bucket",
      "name": "logs",
      "change": {
        "actions": ["create"],
        "before": null,
        "after": {
          "bucket": "logs",
          "versioning_configuration": [{ "status": "Disabled" }]
        }
      }
    },
    {
      "address": "aws_instance.old",
      "type": "aws_instance",
      "name": "old",
      "change": { "actions": ["delete"], "before": { "ami": "x" }, "after": null }
    }
  ]
}"#;

fn fs_with(files: &[(&str, &str)]) -> (TempDir, NativeFileSystem) {
    let temp_dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(temp_dir.path().join(name), contents).unwrap();
    }
    let fs = NativeFileSystem::new(temp_dir.path(), Limits::default()).unwrap();
    (temp_dir, fs)
}

#[test]
fn test_load_plan() {
    let (_dir, fs) = fs_with(&[("plan.json", PLAN)]);
    let resources = load_plan(&fs, Path::new("plan.json")).unwrap();

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].address, "aws_s3_bucket.logs");
    assert_eq!(resources[0].resource_type, "aws_s3_bucket");
    assert_eq!(
        resources[0].values["versioning_configuration"][0]["status"],
        "Disabled"
    );
}

#[test]
fn test_load_plan_with_bom() {
    let with_bom = format!("\u{feff}{PLAN}");
    let (_dir, fs) = fs_with(&[("plan.json", with_bom.as_str())]);
    assert_eq!(load_plan(&fs, Path::new("plan.json")).unwrap().len(), 1);
}

#[test]
fn test_wrong_extension_rejected() {
    let (_dir, fs) = fs_with(&[("plan.tfplan", PLAN)]);
    assert!(matches!(
        load_plan(&fs, Path::new("plan.tfplan")),
        Err(PlanError::Security(Error::InvalidExtension { .. }))
    ));
}

#[test]
fn test_invalid_json_rejected() {
    let (_dir, fs) = fs_with(&[("plan.json", "{ nope")]);
    assert!(matches!(
        load_plan(&fs, Path::new("plan.json")),
        Err(PlanError::Security(Error::Json { .. }))
    ));
}

#[test]
fn test_non_object_plan_rejected() {
    let (_dir, fs) = fs_with(&[("plan.json", "[1, 2, 3]")]);
    let err = load_plan(&fs, Path::new("plan.json")).unwrap_err();
    assert!(matches!(err, PlanError::InvalidPlan { .. }));
    assert!(err.to_string().contains("plan must be a JSON object"));
}

#[test]
fn test_traversal_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("repo");
    fs::create_dir_all(&root).unwrap();
    fs::write(temp_dir.path().join("plan.json"), PLAN).unwrap();

    let fs = NativeFileSystem::new(&root, Limits::default()).unwrap();
    assert!(matches!(
        load_plan(&fs, Path::new("../plan.json")),
        Err(PlanError::Security(Error::PathTraversal { .. }))
    ));
}

#[test]
fn test_deep_plan_rejected() {
    let deep = format!(
        r#"{{"resource_changes": [], "x": {}{}}}"#,
        "[".repeat(60),
        "]".repeat(60)
    );
    let (_dir, fs) = fs_with(&[("plan.json", deep.as_str())]);
    assert!(matches!(
        load_plan(&fs, Path::new("plan.json")),
        Err(PlanError::Security(Error::JsonTooDeep { .. }))
    ));
}
