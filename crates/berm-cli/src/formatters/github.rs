//! GitHub Actions workflow command formatter.
//!
//! Each violation becomes `::error title=<rule name>::[<id>] [<resource>] <message>`
//! (or `::warning`), followed by a summary as `::error::` or `::notice::`.

use super::Formatter;
use berm_core::{EvaluationReport, Violation};
use std::fmt::Write;

pub struct GithubFormatter;

impl Formatter for GithubFormatter {
    fn render(&self, report: &EvaluationReport) -> String {
        let mut out = String::new();

        if report.is_empty() {
            out.push_str("✓ All policy checks passed!\n");
            return out;
        }

        let errors = report.violations.iter().filter(|v| v.is_error());
        let warnings = report.violations.iter().filter(|v| v.is_warning());
        for violation in errors.chain(warnings) {
            write_annotation(&mut out, violation);
        }

        let summary = format!(
            "Policy check found {} error(s) and {} warning(s)",
            report.error_count(),
            report.warning_count()
        );
        let level = if report.has_errors() { "error" } else { "notice" };
        let _ = writeln!(out, "::{level}::{summary}");

        out
    }
}

fn write_annotation(out: &mut String, violation: &Violation) {
    let level = violation.severity.as_str();
    let _ = writeln!(
        out,
        "::{level} title={}::{}",
        escape_property(&violation.rule_name),
        escape_data(&format!(
            "[{}] [{}] {}",
            violation.rule_id, violation.resource_name, violation.message
        ))
    );
}

/// Workflow command message escaping.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Workflow command property escaping; `,` and `:` delimit properties.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
