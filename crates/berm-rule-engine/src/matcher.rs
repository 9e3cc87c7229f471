//! Comparison of resolved values against rule operators
//!
//! Coercion only goes one way: when a rule expects a boolean or a number
//! and the plan holds a string, the string is parsed before comparing.

use crate::resolver::resolve;
use crate::rule::{Operator, Rule, RuleCheck};
use berm_core::{Limits, PropertyPath, Resource, Violation};
use serde_json::{Number, Value};
use std::borrow::Cow;

/// Evaluates one rule against one resource.
///
/// Returns `None` when the resource type doesn't match or the check passes.
pub fn evaluate(rule: &Rule, resource: &Resource, limits: &Limits) -> Option<Violation> {
    if !rule.matches_resource_type(&resource.resource_type) {
        return None;
    }

    let message = rule.format_message(&resource.address);
    let message = match &rule.check {
        RuleCheck::Forbidden => message,
        RuleCheck::Property { path, operator } => {
            let detail = failure_detail(&resource.values, path, operator, limits)?;
            format!("{message} ({detail})")
        }
    };

    Some(Violation {
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        resource_name: resource.address.clone(),
        resource_type: resource.resource_type.clone(),
        severity: rule.severity,
        message,
        location: None,
    })
}

/// Checks the property at `path`. Returns why it failed, or `None` if it passed.
pub fn failure_detail(
    values: &Value,
    path: &PropertyPath,
    operator: &Operator,
    limits: &Limits,
) -> Option<String> {
    let Some(actual) = resolve(values, path, limits) else {
        // Absent compares as null for equals and fails everything else.
        return match operator {
            Operator::Equals(Value::Null) => None,
            _ => Some(format!("property '{path}' not found")),
        };
    };

    if matches(actual, operator) {
        None
    } else {
        Some(describe_failure(actual, operator))
    }
}

/// Whether a present value satisfies `operator`.
pub fn matches(actual: &Value, operator: &Operator) -> bool {
    match operator {
        Operator::Equals(expected) => values_equal(actual, expected),
        Operator::GreaterThan(n) => as_number(actual).is_some_and(|a| a > *n),
        Operator::GreaterThanOrEqual(n) => as_number(actual).is_some_and(|a| a >= *n),
        Operator::LessThan(n) => as_number(actual).is_some_and(|a| a < *n),
        Operator::LessThanOrEqual(n) => as_number(actual).is_some_and(|a| a <= *n),
        Operator::Contains(Value::Array(needles)) => {
            needles.iter().all(|needle| contains(actual, needle))
        }
        Operator::Contains(needle) => contains(actual, needle),
        Operator::In(options) => options.iter().any(|option| values_equal(actual, option)),
        Operator::RegexMatch(re) => re.is_match(&stringify(actual)),
        Operator::HasKeys(keys) => actual
            .as_object()
            .is_some_and(|obj| keys.iter().all(|k| obj.contains_key(k))),
        Operator::IsNotEmpty => is_not_empty(actual),
    }
}

fn describe_failure(actual: &Value, operator: &Operator) -> String {
    let got = render_value(actual);
    match operator {
        Operator::Equals(expected) => format!("expected {}, got {got}", render_value(expected)),
        Operator::GreaterThan(n) => format!("expected value > {n}, got {got}"),
        Operator::GreaterThanOrEqual(n) => format!("expected value >= {n}, got {got}"),
        Operator::LessThan(n) => format!("expected value < {n}, got {got}"),
        Operator::LessThanOrEqual(n) => format!("expected value <= {n}, got {got}"),
        Operator::Contains(needle) => {
            format!("expected value contains {}, got {got}", render_value(needle))
        }
        Operator::In(options) => format!(
            "expected value in {}, got {got}",
            Value::Array(options.clone())
        ),
        Operator::RegexMatch(re) => format!(
            "expected value matches pattern '{}', got {got}",
            re.as_str()
        ),
        Operator::HasKeys(keys) => match actual.as_object() {
            Some(obj) => {
                let missing: Vec<&str> = keys
                    .iter()
                    .filter(|k| !obj.contains_key(k.as_str()))
                    .map(String::as_str)
                    .collect();
                format!(
                    "expected value has keys [{}], missing [{}]",
                    keys.join(", "),
                    missing.join(", ")
                )
            }
            None => format!("expected value has keys [{}], got {got}", keys.join(", ")),
        },
        Operator::IsNotEmpty => "expected value is not empty".to_string(),
    }
}

/// Equality with string-to-bool/number coercion of the resolved value.
///
/// Numbers compare by value, so `7` equals `7.0`.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(s), Value::Bool(b)) => parse_bool(s) == Some(*b),
        (Value::String(s), Value::Number(n)) => {
            matches!((parse_number(s), n.as_f64()), (Some(a), Some(b)) if a == b)
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => actual == expected,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    a.as_f64() == b.as_f64()
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn contains(actual: &Value, needle: &Value) -> bool {
    match actual {
        Value::String(haystack) => haystack.contains(&*stringify(needle)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        _ => false,
    }
}

fn is_not_empty(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Strings as-is, everything else as compact JSON.
fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

/// Strings single-quoted, everything else as compact JSON.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}
