//! `berm validate-rules` and `berm explain`.

use super::RunContext;
use crate::{EXIT_BLOCKING, EXIT_SUCCESS};
use anyhow::{Context, Result};
use berm_core::{sanitize_for_output, OutputContext, Severity};
use berm_rule_engine::{Rule, RuleCheck, RuleLoader};
use colored::*;
use serde_json::json;
use std::io::Write;
use std::path::Path;

/// Loads the rule set, or a single rule file, and lists it. Any load
/// failure is a validation failure.
pub fn run_validate_rules(
    ctx: &RunContext,
    target: Option<&Path>,
    out: &mut dyn Write,
) -> Result<i32> {
    let target = ctx.rules_dir(target);
    let clean = |s: &str| sanitize_for_output(s, OutputContext::Terminal, ctx.limits());
    let is_file = ctx.fs().metadata(&target).is_ok_and(|meta| meta.is_file);

    writeln!(
        out,
        "{} {}",
        if is_file { "Validating rule file:" } else { "Validating rules in:" }.cyan(),
        clean(&target.display().to_string())
    )?;

    let loader = RuleLoader::new(ctx.fs().clone());
    let loaded = if is_file {
        loader.load_single_rule(&target).map(|rule| vec![rule])
    } else {
        loader.load_rule_set(&target)
    };

    match loaded {
        Ok(rules) => {
            writeln!(out, "{}", "All rules are valid".green().bold())?;
            writeln!(out, "Validated {} rule(s):", rules.len())?;
            for rule in &rules {
                writeln!(out, "  - {}: {}", clean(&rule.id), clean(&rule.name))?;
            }
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            writeln!(out, "{}", "Rule validation failed:".red().bold())?;
            writeln!(out, "{}", clean(&e.to_string()))?;
            Ok(EXIT_BLOCKING)
        }
    }
}

/// Shows what one rule checks. Unknown ids list the available ones.
///
/// [`OutputContext::Json`] prints the rule in its rule file shape; any other
/// context prints the annotated text view.
pub fn run_explain(
    ctx: &RunContext,
    rule_id: &str,
    rules_dir: Option<&Path>,
    format: OutputContext,
    out: &mut dyn Write,
) -> Result<i32> {
    let rules_dir = ctx.rules_dir(rules_dir);
    let clean = |s: &str| sanitize_for_output(s, OutputContext::Terminal, ctx.limits());

    let rules = RuleLoader::new(ctx.fs().clone())
        .load_rule_set(&rules_dir)
        .context("Error loading rules")?;
    let found = rules.iter().find(|r| r.id == rule_id);

    if format == OutputContext::Json {
        let document = match found {
            Some(rule) => rule.to_json(),
            None => json!({
                "error": "rule not found",
                "rule_id": rule_id,
                "available": rules.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            }),
        };
        writeln!(out, "{document:#}")?;
        return Ok(if found.is_some() { EXIT_SUCCESS } else { EXIT_BLOCKING });
    }

    let Some(rule) = found else {
        writeln!(
            out,
            "{}",
            format!("Rule '{}' not found.", clean(rule_id)).red()
        )?;
        writeln!(out, "\nAvailable rules:")?;
        for rule in &rules {
            writeln!(out, "  - {}", clean(&rule.id))?;
        }
        return Ok(EXIT_BLOCKING);
    };

    write_rule(rule, &clean, out)?;
    Ok(EXIT_SUCCESS)
}

fn write_rule(rule: &Rule, clean: &dyn Fn(&str) -> String, out: &mut dyn Write) -> Result<()> {
    let severity = match rule.severity {
        Severity::Error => rule.severity.label().red().bold(),
        Severity::Warning => rule.severity.label().yellow().bold(),
    };

    writeln!(out, "{}", clean(&rule.name).bold())?;
    writeln!(out)?;
    writeln!(out, "  {}       {}", "Rule ID:".dimmed(), clean(&rule.id))?;
    writeln!(out, "  {}      {}", "Severity:".dimmed(), severity)?;
    writeln!(
        out,
        "  {} {}",
        "Resource type:".dimmed(),
        clean(&rule.resource_types.to_string())
    )?;
    if let RuleCheck::Property { path, .. } = &rule.check {
        writeln!(out, "  {}      {}", "Property:".dimmed(), clean(path.as_str()))?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "Check:".bold())?;
    if rule.is_forbidden() {
        writeln!(out, "  {}", "Forbidden resource".red())?;
        writeln!(out, "  Any usage of this resource type is not allowed.")?;
    } else {
        writeln!(out, "  {}", clean(&rule.describe_check()).cyan())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", "Violation message:".bold())?;
    writeln!(out, "  {}", clean(&rule.message))?;
    Ok(())
}
