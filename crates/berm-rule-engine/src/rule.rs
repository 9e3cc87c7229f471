//! Rule schema and validation
//!
//! A rule file holds one JSON object. [`parse_rule`] validates it field by
//! field and produces a [`Rule`] whose comparison is a closed [`Operator`],
//! so "exactly one operator" holds by construction after parsing.

use crate::constants::{MAX_REGEX_LENGTH, REGEX_DFA_SIZE_LIMIT, REGEX_SIZE_LIMIT};
use crate::matcher::render_value;
use crate::{Result, RuleError};
use berm_core::{Limits, PropertyPath, Severity};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Comparison operator fields, in the order they are reported.
pub const OPERATOR_FIELDS: &[&str] = &[
    "equals",
    "greater_than",
    "greater_than_or_equal",
    "less_than",
    "less_than_or_equal",
    "contains",
    "in",
    "regex_match",
    "has_keys",
    "is_not_empty",
];

const RULE_FIELDS: &[&str] = &[
    "id",
    "name",
    "message",
    "resource_type",
    "resource_types",
    "severity",
    "property",
    "resource_forbidden",
    "requires_resources",
];

/// Which resource types a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceTypes {
    /// `resource_type`: one exact type.
    Single(String),
    /// `resource_types`: any of several types.
    Any(Vec<String>),
}

impl ResourceTypes {
    pub fn matches(&self, resource_type: &str) -> bool {
        self.as_slice().iter().any(|t| t == resource_type)
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            ResourceTypes::Single(t) => std::slice::from_ref(t),
            ResourceTypes::Any(types) => types,
        }
    }
}

impl fmt::Display for ResourceTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_slice().join(", "))
    }
}

/// The single comparison a property rule performs.
#[derive(Debug, Clone)]
pub enum Operator {
    Equals(Value),
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
    /// Substring or element; a list means every listed element.
    Contains(Value),
    In(Vec<Value>),
    RegexMatch(Regex),
    HasKeys(Vec<String>),
    IsNotEmpty,
}

impl Operator {
    /// Rule file field this operator is written as.
    pub fn field(&self) -> &'static str {
        match self {
            Operator::Equals(_) => "equals",
            Operator::GreaterThan(_) => "greater_than",
            Operator::GreaterThanOrEqual(_) => "greater_than_or_equal",
            Operator::LessThan(_) => "less_than",
            Operator::LessThanOrEqual(_) => "less_than_or_equal",
            Operator::Contains(_) => "contains",
            Operator::In(_) => "in",
            Operator::RegexMatch(_) => "regex_match",
            Operator::HasKeys(_) => "has_keys",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }

    /// The operator's operand as it appears in a rule file.
    pub fn expected_json(&self) -> Value {
        match self {
            Operator::Equals(v) | Operator::Contains(v) => v.clone(),
            Operator::GreaterThan(n)
            | Operator::GreaterThanOrEqual(n)
            | Operator::LessThan(n)
            | Operator::LessThanOrEqual(n) => number_json(*n),
            Operator::In(values) => Value::Array(values.clone()),
            Operator::RegexMatch(re) => Value::String(re.as_str().to_string()),
            Operator::HasKeys(keys) => {
                Value::Array(keys.iter().cloned().map(Value::String).collect())
            }
            Operator::IsNotEmpty => Value::Bool(true),
        }
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operator::RegexMatch(a), Operator::RegexMatch(b)) => a.as_str() == b.as_str(),
            (Operator::IsNotEmpty, Operator::IsNotEmpty) => true,
            (a, b) => a.field() == b.field() && a.expected_json() == b.expected_json(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Equals(v) => write!(f, "equals {}", render_value(v)),
            Operator::GreaterThan(n) => write!(f, "is greater than {n}"),
            Operator::GreaterThanOrEqual(n) => write!(f, "is greater than or equal to {n}"),
            Operator::LessThan(n) => write!(f, "is less than {n}"),
            Operator::LessThanOrEqual(n) => write!(f, "is less than or equal to {n}"),
            Operator::Contains(v) => write!(f, "contains {}", render_value(v)),
            Operator::In(values) => write!(f, "is one of {}", Value::Array(values.clone())),
            Operator::RegexMatch(re) => write!(f, "matches pattern '{}'", re.as_str()),
            Operator::HasKeys(keys) => write!(f, "has keys [{}]", keys.join(", ")),
            Operator::IsNotEmpty => f.write_str("is not empty"),
        }
    }
}

/// What a rule checks on each resource of a matching type.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    /// Every resource of a matching type is a violation.
    Forbidden,
    /// The value at `path` must satisfy `operator`.
    Property {
        path: PropertyPath,
        operator: Operator,
    },
}

/// A validated policy rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub name: String,
    /// Message template; `{{resource_name}}` is replaced by the resource address.
    pub message: String,
    pub resource_types: ResourceTypes,
    pub severity: Severity,
    pub check: RuleCheck,
}

impl Rule {
    pub fn matches_resource_type(&self, resource_type: &str) -> bool {
        self.resource_types.matches(resource_type)
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self.check, RuleCheck::Forbidden)
    }

    /// Renders the message template for one resource.
    pub fn format_message(&self, resource_name: &str) -> String {
        self.message.replace("{{resource_name}}", resource_name)
    }

    /// Human-readable summary of the check, e.g. `property 'a.b' equals true`.
    pub fn describe_check(&self) -> String {
        match &self.check {
            RuleCheck::Forbidden => "resource type is forbidden".to_string(),
            RuleCheck::Property { path, operator } => format!("property '{path}' {operator}"),
        }
    }

    /// Serializes back to the rule file shape accepted by [`parse_rule`].
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        obj.insert("name".to_string(), Value::String(self.name.clone()));
        match &self.resource_types {
            ResourceTypes::Single(t) => {
                obj.insert("resource_type".to_string(), Value::String(t.clone()));
            }
            ResourceTypes::Any(types) => {
                obj.insert(
                    "resource_types".to_string(),
                    Value::Array(types.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        obj.insert(
            "severity".to_string(),
            Value::String(self.severity.as_str().to_string()),
        );
        match &self.check {
            RuleCheck::Forbidden => {
                obj.insert("resource_forbidden".to_string(), Value::Bool(true));
            }
            RuleCheck::Property { path, operator } => {
                obj.insert("property".to_string(), Value::String(path.to_string()));
                obj.insert(operator.field().to_string(), operator.expected_json());
            }
        }
        obj.insert("message".to_string(), Value::String(self.message.clone()));
        Value::Object(obj)
    }
}

/// Validates one raw rule object.
///
/// # Errors
///
/// - [`RuleError::InvalidRule`] for missing or mistyped fields, zero or
///   several operators, forbidden rules that also set a check, a malformed
///   property path, or cross-resource `requires_resources`
/// - [`RuleError::InvalidRegex`] if `regex_match` does not compile
pub fn parse_rule(raw: &Value, limits: &Limits) -> Result<Rule> {
    let obj = raw
        .as_object()
        .ok_or_else(|| invalid("rule must be a JSON object"))?;

    let id = required_string(obj, "id")?;
    parse_fields(obj, &id, limits).map_err(|e| match e {
        RuleError::InvalidRule { reason } => invalid(format!("rule '{id}': {reason}")),
        other => other,
    })
}

fn parse_fields(obj: &Map<String, Value>, id: &str, limits: &Limits) -> Result<Rule> {
    for key in obj.keys() {
        if !RULE_FIELDS.contains(&key.as_str()) && !OPERATOR_FIELDS.contains(&key.as_str()) {
            warn!(rule = id, field = %key, "ignoring unknown rule field");
        }
    }

    let name = required_string(obj, "name")?;
    let message = required_string(obj, "message")?;
    let severity = required_string(obj, "severity")?
        .parse::<Severity>()
        .map_err(invalid)?;
    let resource_types = parse_resource_types(obj)?;

    if optional(obj, "requires_resources").is_some() {
        return Err(invalid(
            "cross-resource checks ('requires_resources') are not supported",
        ));
    }

    let forbidden = match optional(obj, "resource_forbidden") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid("'resource_forbidden' must be a boolean")),
    };

    let operators: Vec<&str> = OPERATOR_FIELDS
        .iter()
        .copied()
        // `"equals": null` is a set operator expecting null.
        .filter(|field| {
            if *field == "equals" {
                obj.contains_key(*field)
            } else {
                optional(obj, field).is_some()
            }
        })
        .collect();
    let property = optional(obj, "property");

    let check = if forbidden {
        if property.is_some() {
            return Err(invalid("resource_forbidden rules must not set 'property'"));
        }
        if !operators.is_empty() {
            return Err(invalid(format!(
                "resource_forbidden rules must not set comparison operators (found: {})",
                operators.join(", ")
            )));
        }
        RuleCheck::Forbidden
    } else {
        let raw_path = match property {
            Some(Value::String(s)) => s,
            Some(_) => return Err(invalid("'property' must be a string")),
            None => {
                return Err(invalid(
                    "'property' is required unless 'resource_forbidden' is true",
                ))
            }
        };
        let path = PropertyPath::parse(raw_path, limits)
            .map_err(|e| invalid(format!("invalid property path: {e}")))?;

        let field = match operators.as_slice() {
            [field] => *field,
            [] => {
                return Err(invalid(format!(
                    "exactly one comparison operator is required: {}",
                    OPERATOR_FIELDS.join(", ")
                )))
            }
            many => {
                return Err(invalid(format!(
                    "exactly one comparison operator is allowed, found: {}",
                    many.join(", ")
                )))
            }
        };
        let operand = obj.get(field).unwrap_or(&Value::Null);
        let operator = parse_operator(field, operand)?;

        RuleCheck::Property { path, operator }
    };

    Ok(Rule {
        id: id.to_string(),
        name,
        message,
        resource_types,
        severity,
        check,
    })
}

fn parse_resource_types(obj: &Map<String, Value>) -> Result<ResourceTypes> {
    match (optional(obj, "resource_type"), optional(obj, "resource_types")) {
        (Some(_), Some(_)) => Err(invalid(
            "specify either 'resource_type' or 'resource_types', not both",
        )),
        (None, None) => Err(invalid("missing 'resource_type' or 'resource_types'")),
        (Some(_), None) => Ok(ResourceTypes::Single(required_string(obj, "resource_type")?)),
        (None, Some(Value::Array(items))) => {
            if items.is_empty() {
                return Err(invalid("'resource_types' must not be empty"));
            }
            let mut seen = HashSet::new();
            let mut types = Vec::with_capacity(items.len());
            for item in items {
                let t = non_empty_str(item)
                    .ok_or_else(|| invalid("'resource_types' entries must be non-empty strings"))?;
                if !seen.insert(t) {
                    return Err(invalid(format!(
                        "'resource_types' contains duplicate entry '{t}'"
                    )));
                }
                types.push(t.to_string());
            }
            Ok(ResourceTypes::Any(types))
        }
        (None, Some(_)) => Err(invalid("'resource_types' must be a list of strings")),
    }
}

fn parse_operator(field: &str, operand: &Value) -> Result<Operator> {
    let number = || {
        operand
            .as_f64()
            .ok_or_else(|| invalid(format!("'{field}' must be a number")))
    };

    let operator = match field {
        "equals" => Operator::Equals(operand.clone()),
        "greater_than" => Operator::GreaterThan(number()?),
        "greater_than_or_equal" => Operator::GreaterThanOrEqual(number()?),
        "less_than" => Operator::LessThan(number()?),
        "less_than_or_equal" => Operator::LessThanOrEqual(number()?),
        "contains" => match operand {
            Value::String(_) => Operator::Contains(operand.clone()),
            Value::Array(items) if !items.is_empty() => Operator::Contains(operand.clone()),
            _ => {
                return Err(invalid(
                    "'contains' must be a string or a non-empty list",
                ))
            }
        },
        "in" => match operand {
            Value::Array(items) if !items.is_empty() => Operator::In(items.clone()),
            _ => return Err(invalid("'in' must be a non-empty list")),
        },
        "regex_match" => match operand {
            Value::String(pattern) => Operator::RegexMatch(compile_regex_safe(pattern)?),
            _ => return Err(invalid("'regex_match' must be a string pattern")),
        },
        "has_keys" => {
            let keys = operand
                .as_array()
                .filter(|items| !items.is_empty())
                .and_then(|items| {
                    items
                        .iter()
                        .map(|k| non_empty_str(k).map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| invalid("'has_keys' must be a non-empty list of key names"))?;
            Operator::HasKeys(keys)
        }
        "is_not_empty" => match operand {
            Value::Bool(true) => Operator::IsNotEmpty,
            _ => return Err(invalid("'is_not_empty' must be true")),
        },
        other => return Err(invalid(format!("unknown operator '{other}'"))),
    };

    Ok(operator)
}

/// Compile a regex with the rule engine's size limits.
fn compile_regex_safe(pattern: &str) -> Result<Regex> {
    if pattern.len() > MAX_REGEX_LENGTH {
        return Err(invalid(format!(
            "'regex_match' pattern exceeds maximum length of {MAX_REGEX_LENGTH} characters"
        )));
    }

    RegexBuilder::new(pattern)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
        .build()
        .map_err(|source| RuleError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })
}

/// Field lookup treating JSON null as absent.
fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn required_string(obj: &Map<String, Value>, field: &str) -> Result<String> {
    match optional(obj, field) {
        None => Err(invalid(format!("missing required field '{field}'"))),
        Some(value) => non_empty_str(value)
            .map(str::to_string)
            .ok_or_else(|| invalid(format!("'{field}' must be a non-empty string"))),
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

fn number_json(n: f64) -> Value {
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

fn invalid(reason: impl Into<String>) -> RuleError {
    RuleError::InvalidRule {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: Value) -> Result<Rule> {
        parse_rule(&raw, &Limits::default())
    }

    fn s3_versioning() -> Value {
        json!({
            "id": "s3-versioning",
            "name": "S3 buckets must have versioning enabled",
            "resource_type": "aws_s3_bucket",
            "severity": "error",
            "property": "versioning_configuration.0.status",
            "equals": "Enabled",
            "message": "Bucket {{resource_name}} must have versioning enabled"
        })
    }

    fn assert_invalid(raw: Value, needle: &str) {
        match parse(raw) {
            Err(RuleError::InvalidRule { reason }) => {
                assert!(reason.contains(needle), "reason {reason:?} lacks {needle:?}")
            }
            other => panic!("expected InvalidRule containing {needle:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_property_rule() {
        let rule = parse(s3_versioning()).unwrap();
        assert_eq!(rule.id, "s3-versioning");
        assert_eq!(rule.severity, Severity::Error);
        assert_eq!(
            rule.resource_types,
            ResourceTypes::Single("aws_s3_bucket".to_string())
        );
        match &rule.check {
            RuleCheck::Property { path, operator } => {
                assert_eq!(path.as_str(), "versioning_configuration.0.status");
                assert_eq!(*operator, Operator::Equals(json!("Enabled")));
            }
            RuleCheck::Forbidden => panic!("expected a property check"),
        }
        assert_eq!(
            rule.format_message("aws_s3_bucket.logs"),
            "Bucket aws_s3_bucket.logs must have versioning enabled"
        );
    }

    #[test]
    fn test_round_trip() {
        let rule = parse(s3_versioning()).unwrap();
        assert_eq!(rule.to_json(), s3_versioning());
        assert_eq!(parse(rule.to_json()).unwrap(), rule);

        let mut raw = s3_versioning();
        raw["greater_than_or_equal"] = json!(7);
        raw.as_object_mut().unwrap().remove("equals");
        let rule = parse(raw.clone()).unwrap();
        assert_eq!(rule.to_json(), raw);
    }

    #[test]
    fn test_zero_operators_rejected() {
        let mut raw = s3_versioning();
        raw.as_object_mut().unwrap().remove("equals");
        assert_invalid(raw, "exactly one comparison operator is required");
    }

    #[test]
    fn test_multiple_operators_rejected() {
        let mut raw = s3_versioning();
        raw["contains"] = json!("Enab");
        raw["regex_match"] = json!("^E");
        assert_invalid(raw, "found: equals, contains, regex_match");
    }

    #[test]
    fn test_equals_null_is_an_operator() {
        let mut raw = s3_versioning();
        raw["equals"] = Value::Null;
        let rule = parse(raw).unwrap();
        assert!(matches!(
            rule.check,
            RuleCheck::Property {
                operator: Operator::Equals(Value::Null),
                ..
            }
        ));
    }

    #[test]
    fn test_forbidden_rule() {
        let rule = parse(json!({
            "id": "no-raw-buckets",
            "name": "Use the bucket module",
            "resource_type": "aws_s3_bucket",
            "severity": "warning",
            "resource_forbidden": true,
            "message": "Use module.bucket instead of {{resource_name}}"
        }))
        .unwrap();
        assert!(rule.is_forbidden());
        assert_eq!(rule.describe_check(), "resource type is forbidden");
    }

    #[test]
    fn test_forbidden_with_check_rejected() {
        let mut raw = s3_versioning();
        raw["resource_forbidden"] = json!(true);
        assert_invalid(raw.clone(), "must not set 'property'");

        raw.as_object_mut().unwrap().remove("property");
        assert_invalid(raw, "must not set comparison operators (found: equals)");
    }

    #[test]
    fn test_missing_fields() {
        for field in ["id", "name", "message", "severity"] {
            let mut raw = s3_versioning();
            raw.as_object_mut().unwrap().remove(field);
            assert_invalid(raw, field);
        }

        let mut raw = s3_versioning();
        raw.as_object_mut().unwrap().remove("property");
        assert_invalid(raw, "'property' is required");

        let mut raw = s3_versioning();
        raw["name"] = json!("   ");
        assert_invalid(raw, "'name' must be a non-empty string");
    }

    #[test]
    fn test_invalid_severity() {
        let mut raw = s3_versioning();
        raw["severity"] = json!("critical");
        assert_invalid(raw, "severity must be 'error' or 'warning'");
    }

    #[test]
    fn test_resource_types() {
        let mut raw = s3_versioning();
        raw.as_object_mut().unwrap().remove("resource_type");
        raw["resource_types"] = json!(["aws_s3_bucket", "aws_s3_bucket_v2"]);
        let rule = parse(raw.clone()).unwrap();
        assert!(rule.matches_resource_type("aws_s3_bucket_v2"));
        assert!(!rule.matches_resource_type("aws_instance"));
        assert_eq!(rule.to_json(), raw);

        raw["resource_types"] = json!(["a", "a"]);
        assert_invalid(raw.clone(), "duplicate");
        raw["resource_types"] = json!([]);
        assert_invalid(raw.clone(), "must not be empty");
        raw["resource_type"] = json!("aws_s3_bucket");
        raw["resource_types"] = json!(["aws_s3_bucket"]);
        assert_invalid(raw, "not both");
    }

    #[test]
    fn test_requires_resources_rejected() {
        let mut raw = s3_versioning();
        raw["requires_resources"] = json!([{"resource_type": "aws_s3_bucket_versioning"}]);
        assert_invalid(raw, "requires_resources");
    }

    #[test]
    fn test_invalid_regex() {
        let mut raw = s3_versioning();
        raw.as_object_mut().unwrap().remove("equals");
        raw["regex_match"] = json!("(unclosed");
        assert!(matches!(parse(raw.clone()), Err(RuleError::InvalidRegex { .. })));

        raw["regex_match"] = json!("a".repeat(MAX_REGEX_LENGTH + 1));
        assert_invalid(raw, "maximum length");
    }

    #[test]
    fn test_operator_type_checks() {
        let cases = [
            ("greater_than", json!("7"), "must be a number"),
            ("contains", json!(7), "'contains' must be a string"),
            ("contains", json!([]), "non-empty list"),
            ("in", json!("prod"), "'in' must be a non-empty list"),
            ("has_keys", json!(["Owner", 1]), "'has_keys' must be"),
            ("is_not_empty", json!(false), "'is_not_empty' must be true"),
        ];
        for (field, operand, needle) in cases {
            let mut raw = s3_versioning();
            raw.as_object_mut().unwrap().remove("equals");
            raw[field] = operand;
            assert_invalid(raw, needle);
        }
    }

    #[test]
    fn test_invalid_property_path() {
        let mut raw = s3_versioning();
        raw["property"] = json!("tags..Owner");
        assert_invalid(raw.clone(), "invalid property path");
        raw["property"] = json!("rules.101");
        assert_invalid(raw, "invalid property path");
    }

    #[test]
    fn test_reason_names_rule() {
        let mut raw = s3_versioning();
        raw["severity"] = json!("fatal");
        assert_invalid(raw, "rule 's3-versioning':");
    }

    #[test]
    fn test_describe_check() {
        let rule = parse(s3_versioning()).unwrap();
        assert_eq!(
            rule.describe_check(),
            "property 'versioning_configuration.0.status' equals 'Enabled'"
        );
    }
}
