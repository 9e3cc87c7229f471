//! Rule engine - applies validated rules to plan resources
//!
//! Evaluation is pure and order-stable: violations come out in rule order,
//! then resource order.

use crate::matcher::evaluate;
use crate::rule::Rule;
use berm_core::{EvaluationReport, Limits, Resource, Violation};
use tracing::{debug, info};

/// The rule engine evaluates a fixed rule set against resource lists
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    limits: Limits,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>, limits: Limits) -> Self {
        Self { rules, limits }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate one rule against one resource
    pub fn evaluate(&self, rule: &Rule, resource: &Resource) -> Option<Violation> {
        evaluate(rule, resource, &self.limits)
    }

    /// Evaluate every rule against every resource
    pub fn evaluate_all(&self, resources: &[Resource]) -> Vec<Violation> {
        let mut violations = Vec::new();

        for rule in &self.rules {
            let before = violations.len();
            violations.extend(
                resources
                    .iter()
                    .filter_map(|resource| self.evaluate(rule, resource)),
            );
            debug!(
                rule = %rule.id,
                violations = violations.len() - before,
                "evaluated rule"
            );
        }

        violations
    }

    /// Evaluate and wrap the result in an [`EvaluationReport`]
    pub fn run(&self, resources: &[Resource]) -> EvaluationReport {
        let report = EvaluationReport::new(self.evaluate_all(resources));
        info!(
            rules = self.rules.len(),
            resources = resources.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "evaluation complete"
        );
        report
    }
}
