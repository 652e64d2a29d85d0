// warden-core/src/domain/rules/executor.rs

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::profile::{Dimension, conforms_to_type, parse_datetime};
use crate::domain::record::{FieldValue, RawRow};
use crate::domain::rules::rule::{Rule, RuleLogic, RuleSet, Severity};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExecutionMode {
    /// Re-evaluate every sampled row.
    Full,
    /// Only rows created after the given timestamp. Rows without a parseable
    /// created-at field are still evaluated; skipping them would hide exactly
    /// the rows most likely to be broken.
    Incremental { since: DateTime<Utc> },
}

/// Result of executing one rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetric {
    pub rule_id: String,
    pub dimension: Dimension,
    pub column: String,
    pub severity: Severity,
    pub threshold: f64,
    /// passed / evaluated, in [0,1]. 1.0 when nothing was evaluated.
    pub success_rate: f64,
    pub evaluated_count: usize,
    pub failed_count: usize,
    /// success_rate < threshold
    pub violated: bool,
}

/// Aggregate over all rule metrics of one execution.
/// Invariant: `passed + failed == total_rules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub total_rules: usize,
    pub passed: usize,
    pub failed: usize,
    /// True iff at least one critical-severity rule is violated. This is a
    /// first-class business outcome, not an error; the orchestrator's failure
    /// policy decides how it propagates.
    pub critical_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub metrics: Vec<RuleMetric>,
    pub summary: ExecutionSummary,
}

pub struct RuleExecutor {
    /// Field consulted for incremental filtering.
    pub created_at_field: String,
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self {
            created_at_field: "created_at".to_string(),
        }
    }
}

impl RuleExecutor {
    pub fn execute(
        &self,
        rule_set: &RuleSet,
        rows: &[RawRow],
        mode: ExecutionMode,
        execution_id: &str,
    ) -> Result<ExecutionReport, DomainError> {
        if rule_set.rules.is_empty() {
            return Err(DomainError::RulesFailed(format!(
                "rule set v{} for '{}' is empty",
                rule_set.version, rule_set.dataset_id
            )));
        }
        if let Some(bad) = rule_set
            .rules
            .iter()
            .find(|r| !r.threshold.is_finite() || !(0.0..=1.0).contains(&r.threshold))
        {
            return Err(DomainError::RulesFailed(format!(
                "rule '{}' carries an out-of-range threshold {}",
                bad.id, bad.threshold
            )));
        }

        let scoped: Vec<&RawRow> = match mode {
            ExecutionMode::Full => rows.iter().collect(),
            ExecutionMode::Incremental { since } => rows
                .iter()
                .filter(|row| match row.get(&self.created_at_field) {
                    Some(FieldValue::Text(s)) => parse_datetime(s.trim())
                        .map(|ts| ts > since)
                        .unwrap_or(true),
                    _ => true,
                })
                .collect(),
        };

        let metrics: Vec<RuleMetric> = rule_set
            .rules
            .iter()
            .map(|rule| evaluate_rule(rule, &scoped))
            .collect();

        let failed = metrics.iter().filter(|m| m.violated).count();
        let critical_failure = metrics
            .iter()
            .any(|m| m.violated && m.severity == Severity::Critical);

        let summary = ExecutionSummary {
            execution_id: execution_id.to_string(),
            total_rules: metrics.len(),
            passed: metrics.len() - failed,
            failed,
            critical_failure,
        };

        Ok(ExecutionReport { metrics, summary })
    }
}

fn evaluate_rule(rule: &Rule, rows: &[&RawRow]) -> RuleMetric {
    let (evaluated, passed) = match &rule.logic {
        RuleLogic::NotNull => {
            let passed = rows
                .iter()
                .filter(|row| row.get(&rule.column).map(|v| !v.is_null()).unwrap_or(false))
                .count();
            (rows.len(), passed)
        }
        RuleLogic::Unique => {
            let mut freq: HashMap<String, usize> = HashMap::new();
            let values: Vec<String> = rows
                .iter()
                .filter_map(|row| row.get(&rule.column))
                .filter(|v| !v.is_null())
                .map(|v| v.render())
                .collect();
            for v in &values {
                *freq.entry(v.clone()).or_insert(0) += 1;
            }
            let passed = values.iter().filter(|v| freq[*v] == 1).count();
            (values.len(), passed)
        }
        RuleLogic::TypeConforms { expected } => {
            let non_null: Vec<&FieldValue> = rows
                .iter()
                .filter_map(|row| row.get(&rule.column))
                .filter(|v| !v.is_null())
                .collect();
            let passed = non_null
                .iter()
                .filter(|v| conforms_to_type(v, *expected))
                .count();
            (non_null.len(), passed)
        }
        RuleLogic::RecencyWithinDays { days } => {
            let cutoff = Utc::now() - Duration::days(*days);
            let mut evaluated = 0usize;
            let mut passed = 0usize;
            for row in rows {
                let newest = row
                    .values()
                    .filter_map(|v| match v {
                        FieldValue::Text(s) => parse_datetime(s.trim()),
                        _ => None,
                    })
                    .max();
                if let Some(ts) = newest {
                    evaluated += 1;
                    if ts >= cutoff {
                        passed += 1;
                    }
                }
            }
            (evaluated, passed)
        }
    };

    // Nothing evaluated means nothing observed to violate.
    let success_rate = if evaluated == 0 {
        1.0
    } else {
        passed as f64 / evaluated as f64
    };

    RuleMetric {
        rule_id: rule.id.clone(),
        dimension: rule.dimension,
        column: rule.column.clone(),
        severity: rule.severity,
        threshold: rule.threshold,
        success_rate,
        evaluated_count: evaluated,
        failed_count: evaluated - passed,
        violated: success_rate < rule.threshold,
    }
}
