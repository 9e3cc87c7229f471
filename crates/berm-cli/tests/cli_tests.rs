//! Command behavior and exit codes, run against temporary repositories.

use berm_cli::commands::{run_check, run_explain, run_init, run_validate_rules, CheckOptions};
use berm_cli::{RunContext, EXIT_BLOCKING, EXIT_SUCCESS};
use berm_config::BermConfig;
use berm_core::OutputContext;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn plan(resources: &[(&str, &str, Value)]) -> Value {
    let changes: Vec<Value> = resources
        .iter()
        .map(|(resource_type, name, after)| {
            json!({
                "address": format!("{resource_type}.{name}"),
                "type": resource_type,
                "name": name,
                "change": { "actions": ["create"], "before": null, "after": after }
            })
        })
        .collect();
    json!({ "format_version": "1.2", "resource_changes": changes })
}

/// Repository with the S3 versioning error rule and the RDS retention warning rule.
fn repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_json(
        &dir.path().join(".berm/s3-versioning.json"),
        &json!({
            "id": "s3-versioning",
            "name": "S3 buckets must have versioning enabled",
            "resource_type": "aws_s3_bucket",
            "severity": "error",
            "property": "versioning_configuration.0.status",
            "equals": "Enabled",
            "message": "S3 bucket {{resource_name}} must have versioning enabled"
        }),
    );
    write_json(
        &dir.path().join(".berm/rds-backup.json"),
        &json!({
            "id": "rds-backup-retention",
            "name": "RDS backup retention",
            "resource_type": "aws_db_instance",
            "severity": "warning",
            "property": "backup_retention_period",
            "greater_than_or_equal": 7,
            "message": "RDS instance {{resource_name}} should keep 7 days of backups"
        }),
    );
    dir
}

fn context(dir: &TempDir) -> RunContext {
    RunContext::from_config(dir.path(), BermConfig::default()).unwrap()
}

fn check(ctx: &RunContext, plan_file: &str, format: OutputContext, strict: bool) -> (i32, String) {
    let options = CheckOptions {
        plan: PathBuf::from(plan_file),
        rules_dir: None,
        format: Some(format),
        strict,
    };
    let mut out = Vec::new();
    let code = run_check(ctx, &options, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn test_check_error_blocks() {
    let dir = repo();
    write_json(
        &dir.path().join("plan.json"),
        &plan(&[(
            "aws_s3_bucket",
            "logs",
            json!({"versioning_configuration": [{"status": "Disabled"}]}),
        )]),
    );

    let (code, out) = check(&context(&dir), "plan.json", OutputContext::Json, false);
    assert_eq!(code, EXIT_BLOCKING);

    let doc: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["summary"]["errors"], 1);
    assert_eq!(
        doc["violations"][0]["message"],
        "S3 bucket aws_s3_bucket.logs must have versioning enabled \
         (expected 'Enabled', got 'Disabled')"
    );
}

#[test]
fn test_check_warning_only_passes_unless_strict() {
    let dir = repo();
    write_json(
        &dir.path().join("plan.json"),
        &plan(&[
            (
                "aws_s3_bucket",
                "logs",
                json!({"versioning_configuration": [{"status": "Enabled"}]}),
            ),
            ("aws_db_instance", "main", json!({"backup_retention_period": 3})),
        ]),
    );
    let ctx = context(&dir);

    let (code, out) = check(&ctx, "plan.json", OutputContext::Json, false);
    assert_eq!(code, EXIT_SUCCESS);
    let doc: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["summary"]["warnings"], 1);
    assert_eq!(doc["summary"]["has_errors"], false);

    let (code, _) = check(&ctx, "plan.json", OutputContext::Json, true);
    assert_eq!(code, EXIT_BLOCKING);
}

#[test]
fn test_strict_from_config() {
    let dir = repo();
    write_json(
        &dir.path().join("plan.json"),
        &plan(&[("aws_db_instance", "main", json!({"backup_retention_period": 1}))]),
    );
    let config = BermConfig {
        strict: true,
        ..BermConfig::default()
    };
    let ctx = RunContext::from_config(dir.path(), config).unwrap();

    let (code, _) = check(&ctx, "plan.json", OutputContext::Json, false);
    assert_eq!(code, EXIT_BLOCKING);
}

#[test]
fn test_check_clean_plan() {
    let dir = repo();
    write_json(
        &dir.path().join("plan.json"),
        &plan(&[(
            "aws_s3_bucket",
            "logs",
            json!({"versioning_configuration": [{"status": "Enabled"}]}),
        )]),
    );

    let (code, out) = check(&context(&dir), "plan.json", OutputContext::Github, false);
    assert_eq!(code, EXIT_SUCCESS);
    assert!(out.contains("All policy checks passed!"));
}

#[test]
fn test_github_output_sanitized() {
    let dir = repo();
    write_json(
        &dir.path().join("plan.json"),
        &plan(&[(
            "aws_s3_bucket",
            "x::error::pwned",
            json!({"versioning_configuration": [{"status": "Disabled"}]}),
        )]),
    );

    let (code, out) = check(&context(&dir), "plan.json", OutputContext::Github, false);
    assert_eq!(code, EXIT_BLOCKING);
    for line in out.lines() {
        let data = line.splitn(3, "::").nth(2).unwrap();
        assert!(!data.contains("::"), "forged command in {line:?}");
    }
}

#[test]
fn test_check_failures_are_errors() {
    let dir = repo();
    let ctx = context(&dir);

    // Missing plan
    let options = CheckOptions {
        plan: PathBuf::from("missing.json"),
        ..CheckOptions::default()
    };
    assert!(run_check(&ctx, &options, &mut Vec::new()).is_err());

    // Plan outside the base directory
    let options = CheckOptions {
        plan: PathBuf::from("../plan.json"),
        ..CheckOptions::default()
    };
    let err = run_check(&ctx, &options, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("Path traversal"));

    // Missing rules directory
    write_json(&dir.path().join("plan.json"), &plan(&[]));
    let options = CheckOptions {
        plan: PathBuf::from("plan.json"),
        rules_dir: Some(PathBuf::from("nope")),
        ..CheckOptions::default()
    };
    let err = run_check(&ctx, &options, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").starts_with("Error loading rules"));
}

#[test]
fn test_validate_rules() {
    let dir = repo();
    let ctx = context(&dir);

    let mut out = Vec::new();
    assert_eq!(run_validate_rules(&ctx, None, &mut out).unwrap(), EXIT_SUCCESS);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("rds-backup-retention: RDS backup retention"));
    assert!(out.contains("s3-versioning: S3 buckets must have versioning enabled"));

    write_json(
        &dir.path().join(".berm/broken.json"),
        &json!({
            "id": "broken",
            "name": "b",
            "resource_type": "t",
            "severity": "error",
            "message": "m"
        }),
    );
    let mut out = Vec::new();
    assert_eq!(run_validate_rules(&ctx, None, &mut out).unwrap(), EXIT_BLOCKING);
    assert!(String::from_utf8(out).unwrap().contains("broken.json"));
}

#[test]
fn test_explain() {
    let dir = repo();
    let ctx = context(&dir);

    let mut out = Vec::new();
    let code = run_explain(&ctx, "rds-backup-retention", None, OutputContext::Terminal, &mut out);
    assert_eq!(code.unwrap(), EXIT_SUCCESS);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("backup_retention_period"));
    assert!(out.contains("is greater than or equal to 7"));
    assert!(out.contains("should keep 7 days of backups"));

    let mut out = Vec::new();
    let code = run_explain(&ctx, "nope", None, OutputContext::Terminal, &mut out).unwrap();
    assert_eq!(code, EXIT_BLOCKING);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Available rules:"));
    assert!(out.contains("  - s3-versioning"));
}

#[test]
fn test_validate_single_rule_file() {
    let dir = repo();
    let ctx = context(&dir);

    let mut out = Vec::new();
    let code = run_validate_rules(&ctx, Some(Path::new(".berm/s3-versioning.json")), &mut out);
    assert_eq!(code.unwrap(), EXIT_SUCCESS);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Validating rule file:"));
    assert!(out.contains("Validated 1 rule(s):"));
    assert!(!out.contains("rds-backup-retention"));

    write_json(
        &dir.path().join("draft.json"),
        &json!({"id": "draft", "name": "d", "resource_type": "t", "severity": "fatal"}),
    );
    let mut out = Vec::new();
    let code = run_validate_rules(&ctx, Some(Path::new("draft.json")), &mut out).unwrap();
    assert_eq!(code, EXIT_BLOCKING);
    assert!(String::from_utf8(out).unwrap().contains("draft.json"));
}

#[test]
fn test_explain_json() {
    let dir = repo();
    let ctx = context(&dir);

    let mut out = Vec::new();
    let code = run_explain(&ctx, "s3-versioning", None, OutputContext::Json, &mut out).unwrap();
    assert_eq!(code, EXIT_SUCCESS);
    let doc: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["id"], "s3-versioning");
    assert_eq!(doc["resource_type"], "aws_s3_bucket");
    assert_eq!(doc["property"], "versioning_configuration.0.status");
    assert_eq!(doc["equals"], "Enabled");

    let mut out = Vec::new();
    let code = run_explain(&ctx, "nope", None, OutputContext::Json, &mut out).unwrap();
    assert_eq!(code, EXIT_BLOCKING);
    let doc: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["rule_id"], "nope");
    assert_eq!(doc["available"], json!(["rds-backup-retention", "s3-versioning"]));
}

#[test]
fn test_init_writes_loadable_rules() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);

    let mut out = Vec::new();
    assert_eq!(run_init(&ctx, None, false, &mut out).unwrap(), EXIT_SUCCESS);
    assert!(dir.path().join(".berm/s3-versioning-enabled.json").is_file());

    let mut out = Vec::new();
    assert_eq!(run_validate_rules(&ctx, None, &mut out).unwrap(), EXIT_SUCCESS);
    assert!(String::from_utf8(out).unwrap().contains("Validated 5 rule(s)"));

    // Existing directory needs --force
    let mut out = Vec::new();
    assert_eq!(run_init(&ctx, None, false, &mut out).unwrap(), EXIT_BLOCKING);
    let mut out = Vec::new();
    assert_eq!(run_init(&ctx, None, true, &mut out).unwrap(), EXIT_SUCCESS);
}

#[test]
fn test_init_outside_base_dir_rejected() {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir);
    assert!(run_init(&ctx, Some(Path::new("../escape")), false, &mut Vec::new()).is_err());
}

#[cfg(unix)]
#[test]
fn test_init_force_does_not_follow_symlinks() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("project");
    fs::create_dir_all(root.join(".berm")).unwrap();
    let outside = temp_dir.path().join("victim.json");
    fs::write(&outside, "keep").unwrap();
    std::os::unix::fs::symlink(&outside, root.join(".berm/s3-versioning-enabled.json")).unwrap();

    let ctx = RunContext::from_config(&root, BermConfig::default()).unwrap();
    assert!(run_init(&ctx, None, true, &mut Vec::new()).is_err());
    assert_eq!(fs::read_to_string(&outside).unwrap(), "keep");

    // A link that stays inside the base directory is refused too
    let inside = root.join("notes.json");
    fs::write(&inside, "keep").unwrap();
    fs::remove_file(root.join(".berm/s3-versioning-enabled.json")).unwrap();
    std::os::unix::fs::symlink(&inside, root.join(".berm/s3-versioning-enabled.json")).unwrap();
    let err = run_init(&ctx, None, true, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("symbolic link"));
    assert_eq!(fs::read_to_string(&inside).unwrap(), "keep");
}
