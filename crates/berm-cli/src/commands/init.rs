//! `berm init`: create a rules directory with example rules.

use super::RunContext;
use crate::{EXIT_BLOCKING, EXIT_SUCCESS};
use anyhow::{bail, Context, Result};
use berm_core::{sanitize_for_output, OutputContext};
use colored::*;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Example rules written by `berm init`, as (file name, rule).
pub fn example_rules() -> Vec<(&'static str, Value)> {
    vec![
        (
            "ec2-allowed-instance-types.json",
            json!({
                "id": "ec2-allowed-instance-types",
                "name": "EC2 instances must use approved instance types",
                "resource_type": "aws_instance",
                "severity": "error",
                "property": "instance_type",
                "in": ["t3.micro", "t3.small", "t3.medium", "t3.large"],
                "message": "EC2 instance {{resource_name}} must use an approved instance type"
            }),
        ),
        (
            "rds-backup-retention.json",
            json!({
                "id": "rds-backup-retention",
                "name": "RDS instances should have minimum backup retention",
                "resource_type": "aws_db_instance",
                "severity": "warning",
                "property": "backup_retention_period",
                "greater_than_or_equal": 7,
                "message": "RDS instance {{resource_name}} should have at least 7 days backup retention"
            }),
        ),
        (
            "s3-bucket-name-pattern.json",
            json!({
                "id": "s3-bucket-name-pattern",
                "name": "S3 bucket names must follow naming convention",
                "resource_type": "aws_s3_bucket",
                "severity": "error",
                "property": "bucket",
                "regex_match": "^[a-z0-9][a-z0-9-]*[a-z0-9]$",
                "message": "S3 bucket {{resource_name}} must use lowercase alphanumeric characters and hyphens only"
            }),
        ),
        (
            "s3-encryption-enabled.json",
            json!({
                "id": "s3-encryption-enabled",
                "name": "S3 buckets must have encryption enabled",
                "resource_type": "aws_s3_bucket",
                "severity": "error",
                "property": "server_side_encryption_configuration.0.rule.0.apply_server_side_encryption_by_default.0.sse_algorithm",
                "in": ["AES256", "aws:kms"],
                "message": "S3 bucket {{resource_name}} must have server-side encryption enabled"
            }),
        ),
        (
            "s3-versioning-enabled.json",
            json!({
                "id": "s3-versioning-enabled",
                "name": "S3 buckets must have versioning enabled",
                "resource_type": "aws_s3_bucket",
                "severity": "error",
                "property": "versioning.0.enabled",
                "equals": true,
                "message": "S3 bucket {{resource_name}} must have versioning enabled"
            }),
        ),
    ]
}

/// Writes the example rules into `dir` (default: the configured rules dir).
///
/// An existing directory is left alone unless `force` is set, in which case
/// the example files are overwritten and other files are kept.
pub fn run_init(
    ctx: &RunContext,
    dir: Option<&Path>,
    force: bool,
    out: &mut dyn Write,
) -> Result<i32> {
    let dir = ctx.rules_dir(dir);
    let shown = sanitize_for_output(
        &dir.display().to_string(),
        OutputContext::Terminal,
        ctx.limits(),
    );

    let target = ctx.fs().validate_path(&dir)?.into_path_buf();
    if target.exists() && !force {
        writeln!(out, "{}", format!("Directory '{shown}' already exists.").red())?;
        writeln!(
            out,
            "Use --force to overwrite the example rules or choose a different directory."
        )?;
        return Ok(EXIT_BLOCKING);
    }

    std::fs::create_dir_all(&target)
        .with_context(|| format!("Failed to create directory {shown}"))?;

    let rules = example_rules();
    for (file_name, rule) in &rules {
        let mut contents = serde_json::to_string_pretty(rule)?;
        contents.push('\n');
        // An existing link must not redirect the write.
        ctx.fs().validate_path(&dir.join(file_name))?;
        let output = target.join(file_name);
        let existing = std::fs::symlink_metadata(&output);
        if existing.is_ok_and(|meta| meta.file_type().is_symlink()) {
            bail!("Refusing to overwrite symbolic link {shown}/{file_name}");
        }
        std::fs::write(&output, contents)
            .with_context(|| format!("Failed to write {file_name}"))?;
    }
    info!(dir = %target.display(), count = rules.len(), "initialized rules directory");

    writeln!(
        out,
        "{} {}",
        "Initialized rules directory:".green().bold(),
        shown.bold()
    )?;
    writeln!(out, "Created {} example rules:", rules.len())?;
    for (file_name, _) in &rules {
        writeln!(out, "  - {file_name}")?;
    }
    writeln!(out, "\nNext: review the rules, then run `berm check plan.json`")?;
    Ok(EXIT_SUCCESS)
}
