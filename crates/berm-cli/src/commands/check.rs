//! `berm check` and `berm test`: evaluate a plan against a rule set.

use super::RunContext;
use crate::formatters::formatter_for;
use crate::{EXIT_BLOCKING, EXIT_SUCCESS};
use anyhow::{Context, Result};
use berm_core::OutputContext;
use berm_plan::load_plan;
use berm_rule_engine::{RuleEngine, RuleLoader};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Flags for a check run. Unset values fall back to the config.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub plan: PathBuf,
    pub rules_dir: Option<PathBuf>,
    pub format: Option<OutputContext>,
    pub strict: bool,
}

/// Runs every rule against every resource in the plan and writes the report.
///
/// Returns [`EXIT_BLOCKING`] when the report has errors, or any violation
/// in strict mode.
pub fn run_check(ctx: &RunContext, options: &CheckOptions, out: &mut dyn Write) -> Result<i32> {
    let rules_dir = ctx.rules_dir(options.rules_dir.as_deref());
    let format = options.format.unwrap_or(ctx.config().format);
    let strict = options.strict || ctx.config().strict;

    let rules = RuleLoader::new(ctx.fs().clone())
        .load_rule_set(&rules_dir)
        .context("Error loading rules")?;

    let resources = load_plan(ctx.fs(), &options.plan).context("Error loading Terraform plan")?;

    let engine = RuleEngine::new(rules, *ctx.limits());
    let report = engine.run(&resources);
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        strict,
        "check finished"
    );

    let rendered = formatter_for(format).render(&report.sanitized(format, ctx.limits()));
    out.write_all(rendered.as_bytes())?;

    Ok(if report.is_blocking(strict) {
        EXIT_BLOCKING
    } else {
        EXIT_SUCCESS
    })
}
