//! Core data model shared by the loaders, the engine and the reporters.

use crate::limits::Limits;
use crate::sanitize::{sanitize_for_output, OutputContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Severity of a rule and of the violations it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks deployment.
    Error,
    /// Advisory only, unless running in strict mode.
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// Short upper-case label for compact output.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            other => Err(format!(
                "severity must be 'error' or 'warning', got '{other}'"
            )),
        }
    }
}

/// A normalized post-change infrastructure object extracted from plan data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Fully-qualified instance address (e.g. `module.vpc.aws_subnet.private[0]`).
    pub address: String,

    /// Resource type (e.g. `aws_s3_bucket`).
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name within its module.
    pub name: String,

    /// Planned post-change state.
    pub values: Value,
}

impl Resource {
    pub fn new(
        address: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        values: Value,
    ) -> Self {
        Self {
            address: address.into(),
            resource_type: resource_type.into(),
            name: name.into(),
            values,
        }
    }
}

/// A recorded failure of one resource against one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub rule_name: String,
    /// Address of the offending resource.
    pub resource_name: String,
    pub resource_type: String,
    pub severity: Severity,
    pub message: String,
    /// Source location, when known. Plan data carries none.
    pub location: Option<String>,
}

impl Violation {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Single-line form: `[ERROR] aws_s3_bucket.logs (aws_s3_bucket): message`.
    pub fn format_compact(&self) -> String {
        format!(
            "[{}] {} ({}): {}",
            self.severity.label(),
            self.resource_name,
            self.resource_type,
            self.message
        )
    }

    /// Multi-line form with one labelled field per line.
    pub fn format_detailed(&self) -> String {
        let mut lines = vec![
            format!("Severity: {}", self.severity.as_str().to_uppercase()),
            format!("Rule: {} ({})", self.rule_name, self.rule_id),
            format!("Resource: {} ({})", self.resource_name, self.resource_type),
            format!("Message: {}", self.message),
        ];
        if let Some(location) = &self.location {
            lines.push(format!("Location: {location}"));
        }
        lines.join("\n")
    }

    /// Returns a copy with every string field passed through the output sanitizer.
    pub fn sanitized(&self, context: OutputContext, limits: &Limits) -> Self {
        let clean = |s: &str| sanitize_for_output(s, context, limits);
        Self {
            rule_id: clean(&self.rule_id),
            rule_name: clean(&self.rule_name),
            resource_name: clean(&self.resource_name),
            resource_type: clean(&self.resource_type),
            severity: self.severity,
            message: clean(&self.message),
            location: self.location.as_deref().map(clean),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_compact())
    }
}

/// Ordered violations plus the summary flags a caller needs for its exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationReport {
    pub violations: Vec<Violation>,
}

impl EvaluationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(Violation::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.violations.iter().any(Violation::is_warning)
    }

    pub fn error_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_warning()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether the violations should block: any error, or any violation in strict mode.
    pub fn is_blocking(&self, strict: bool) -> bool {
        self.has_errors() || (strict && !self.violations.is_empty())
    }

    /// Sanitizes every violation for `context`, keeping order.
    pub fn sanitized(&self, context: OutputContext, limits: &Limits) -> Self {
        Self {
            violations: self
                .violations
                .iter()
                .map(|v| v.sanitized(context, limits))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(severity: Severity, message: &str) -> Violation {
        Violation {
            rule_id: "s3-versioning".to_string(),
            rule_name: "S3 versioning".to_string(),
            resource_name: "aws_s3_bucket.logs".to_string(),
            resource_type: "aws_s3_bucket".to_string(),
            severity,
            message: message.to_string(),
            location: None,
        }
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert!("info".parse::<Severity>().is_err());
        assert!("Error".parse::<Severity>().is_err());
    }

    #[test]
    fn test_resource_deserializes_type_field() {
        let resource: Resource = serde_json::from_value(json!({
            "address": "aws_s3_bucket.logs",
            "type": "aws_s3_bucket",
            "name": "logs",
            "values": {"bucket": "logs"}
        }))
        .unwrap();
        assert_eq!(resource.resource_type, "aws_s3_bucket");
    }

    #[test]
    fn test_format_compact() {
        let v = violation(Severity::Warning, "needs tags");
        assert_eq!(
            v.format_compact(),
            "[WARN] aws_s3_bucket.logs (aws_s3_bucket): needs tags"
        );
    }

    #[test]
    fn test_format_detailed_includes_location() {
        let mut v = violation(Severity::Error, "bad");
        assert!(!v.format_detailed().contains("Location"));
        v.location = Some("main.tf:12".to_string());
        assert!(v.format_detailed().ends_with("Location: main.tf:12"));
    }

    #[test]
    fn test_report_flags() {
        let report = EvaluationReport::new(vec![violation(Severity::Warning, "w")]);
        assert!(!report.has_errors());
        assert!(report.has_warnings());
        assert!(!report.is_blocking(false));
        assert!(report.is_blocking(true));

        let report = EvaluationReport::new(vec![
            violation(Severity::Error, "e"),
            violation(Severity::Warning, "w"),
        ]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_blocking(false));

        assert!(!EvaluationReport::default().is_blocking(true));
    }

    #[test]
    fn test_sanitized_touches_every_string_field() {
        let mut v = violation(Severity::Error, "::error::pwned\n");
        v.resource_name = "aws_s3_bucket.\x1b[31mlogs".to_string();
        v.location = Some("a::b".to_string());

        let clean = v.sanitized(OutputContext::Github, &Limits::default());
        assert_eq!(clean.resource_name, "aws_s3_bucket.logs");
        assert!(!clean.message.contains("::"));
        assert!(!clean.message.contains('\n'));
        assert_eq!(clean.location.as_deref(), Some("a:\u{200B}:b"));
    }
}
