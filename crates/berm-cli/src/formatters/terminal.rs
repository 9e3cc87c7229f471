//! Colored terminal formatter.

use super::Formatter;
use berm_core::{EvaluationReport, Violation};
use colored::*;
use std::fmt::Write;

pub struct TerminalFormatter;

impl Formatter for TerminalFormatter {
    fn render(&self, report: &EvaluationReport) -> String {
        let mut out = String::new();

        if report.is_empty() {
            let _ = writeln!(
                out,
                "\n{} {}\n",
                "✓".green().bold(),
                "All policy checks passed!".green().bold()
            );
            return out;
        }

        let errors: Vec<&Violation> = report
            .violations
            .iter()
            .filter(|v| v.is_error())
            .collect();
        let warnings: Vec<&Violation> = report
            .violations
            .iter()
            .filter(|v| v.is_warning())
            .collect();

        if !errors.is_empty() {
            let title = format!("Errors ({}):", errors.len()).red().bold();
            write_section(&mut out, title, "✗".red(), &errors);
        }
        if !warnings.is_empty() {
            let title = format!("Warnings ({}):", warnings.len()).yellow().bold();
            write_section(&mut out, title, "!".yellow(), &warnings);
        }

        let error_summary = match errors.len() {
            0 => "0 errors".green(),
            n => format!("{n} error(s)").red().bold(),
        };
        let warning_summary = match warnings.len() {
            0 => "0 warnings".green(),
            n => format!("{n} warning(s)").yellow().bold(),
        };
        let _ = writeln!(
            out,
            "\n{} {}, {}\n",
            "Summary:".bold(),
            error_summary,
            warning_summary
        );

        out
    }
}

fn write_section(
    out: &mut String,
    title: ColoredString,
    marker: ColoredString,
    violations: &[&Violation],
) {
    let _ = writeln!(out, "\n{title}\n");
    for violation in violations {
        let _ = writeln!(
            out,
            "  {} {} {}",
            marker,
            violation.resource_name.cyan(),
            format!("[{}]", violation.rule_id).dimmed()
        );
        let _ = writeln!(out, "    {}", violation.rule_name.bold());
        let _ = writeln!(out, "    {}", violation.message);
    }
}
