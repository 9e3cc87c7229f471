//! Output formatters for evaluation reports.
//!
//! Formatters receive a report that was already sanitized for their output
//! context; they only lay it out.

pub mod github;
pub mod json;
pub mod terminal;

pub use github::GithubFormatter;
pub use json::JsonFormatter;
pub use terminal::TerminalFormatter;

use berm_core::{EvaluationReport, OutputContext};

/// Trait for formatting evaluation reports
pub trait Formatter {
    /// Render the report as the text to print on stdout
    fn render(&self, report: &EvaluationReport) -> String;
}

/// Formatter matching an output context.
pub fn formatter_for(context: OutputContext) -> Box<dyn Formatter> {
    match context {
        OutputContext::Terminal => Box::new(TerminalFormatter),
        OutputContext::Github => Box::new(GithubFormatter),
        OutputContext::Json => Box::new(JsonFormatter),
    }
}
