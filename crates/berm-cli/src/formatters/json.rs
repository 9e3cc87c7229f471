//! JSON formatter for machine-readable output.

use super::Formatter;
use berm_core::EvaluationReport;
use serde_json::json;

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn render(&self, report: &EvaluationReport) -> String {
        let document = json!({
            "violations": report.violations,
            "summary": {
                "errors": report.error_count(),
                "warnings": report.warning_count(),
                "total": report.violations.len(),
                "has_errors": report.has_errors(),
                "has_warnings": report.has_warnings(),
            },
        });

        format!("{document:#}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::test_support::mixed_report;
    use serde_json::Value;

    #[test]
    fn test_document_shape() {
        let out = JsonFormatter.render(&mixed_report());
        let doc: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(
            doc["summary"],
            json!({
                "errors": 2,
                "warnings": 1,
                "total": 3,
                "has_errors": true,
                "has_warnings": true,
            })
        );

        let first = &doc["violations"][0];
        assert_eq!(first["rule_id"], "s3-versioning");
        assert_eq!(first["resource_type"], "aws_s3_bucket");
        assert_eq!(first["severity"], "error");
        assert_eq!(first["location"], Value::Null);
        assert_eq!(doc["violations"][1]["severity"], "warning");
    }

    #[test]
    fn test_empty_report() {
        let doc: Value =
            serde_json::from_str(&JsonFormatter.render(&EvaluationReport::default())).unwrap();
        assert_eq!(doc["violations"], json!([]));
        assert_eq!(doc["summary"]["total"], 0);
        assert_eq!(doc["summary"]["has_errors"], false);
    }
}
