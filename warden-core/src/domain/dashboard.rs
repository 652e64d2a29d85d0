// warden-core/src/domain/dashboard.rs
//
// Read-optimized views over execution metrics. Purely derived: no business
// rule lives here, only reshaping for direct display. The key set is a
// versioned contract so downstream consumers can rely on shape stability.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::error::DomainError;
use crate::domain::rules::{ExecutionReport, Severity};

pub const DASHBOARD_CONTRACT_VERSION: &str = "v1";

/// Keys every projection must carry. Removing one is a contract break.
pub const REQUIRED_VIEW_KEYS: [&str; 5] = [
    "overall_pass_rate",
    "dimension_breakdown",
    "top_failing_columns",
    "severity_counts",
    "rule_count",
];

const TOP_FAILING_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardProjection {
    pub contract_version: String,
    pub views: BTreeMap<String, Value>,
}

pub struct DashboardProjector;

impl DashboardProjector {
    pub fn project(report: &ExecutionReport) -> DashboardProjection {
        let summary = &report.summary;
        let overall_pass_rate = if summary.total_rules == 0 {
            1.0
        } else {
            summary.passed as f64 / summary.total_rules as f64
        };

        // Per-dimension breakdown
        let mut by_dimension: BTreeMap<String, (usize, usize, f64)> = BTreeMap::new();
        for m in &report.metrics {
            let entry = by_dimension
                .entry(m.dimension.to_string())
                .or_insert((0, 0, 0.0));
            entry.0 += 1;
            if m.violated {
                entry.1 += 1;
            }
            entry.2 += m.success_rate;
        }
        let dimension_breakdown: BTreeMap<String, Value> = by_dimension
            .into_iter()
            .map(|(dim, (rules, violated, rate_sum))| {
                (
                    dim,
                    json!({
                        "rules": rules,
                        "violated": violated,
                        "avg_success_rate": rate_sum / rules as f64,
                    }),
                )
            })
            .collect();

        // Worst columns first
        let mut failing: Vec<(&str, f64, usize)> = report
            .metrics
            .iter()
            .filter(|m| m.violated)
            .map(|m| (m.column.as_str(), m.success_rate, m.failed_count))
            .collect();
        failing.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let top_failing_columns: Vec<Value> = failing
            .into_iter()
            .take(TOP_FAILING_LIMIT)
            .map(|(column, rate, failed)| {
                json!({"column": column, "success_rate": rate, "failed_count": failed})
            })
            .collect();

        let mut severity_counts: BTreeMap<String, usize> = BTreeMap::new();
        for sev in [Severity::Info, Severity::Warning, Severity::Critical] {
            let violated = report
                .metrics
                .iter()
                .filter(|m| m.violated && m.severity == sev)
                .count();
            severity_counts.insert(sev.to_string(), violated);
        }

        let mut views = BTreeMap::new();
        views.insert("overall_pass_rate".to_string(), json!(overall_pass_rate));
        views.insert(
            "dimension_breakdown".to_string(),
            json!(dimension_breakdown),
        );
        views.insert(
            "top_failing_columns".to_string(),
            Value::Array(top_failing_columns),
        );
        views.insert("severity_counts".to_string(), json!(severity_counts));
        views.insert("rule_count".to_string(), json!(summary.total_rules));

        DashboardProjection {
            contract_version: DASHBOARD_CONTRACT_VERSION.to_string(),
            views,
        }
    }

    /// Contract check: all required keys present. A failure here is soft for
    /// the run (recorded, not halting) but the projection is discarded.
    pub fn validate(projection: &DashboardProjection) -> Result<(), DomainError> {
        for key in REQUIRED_VIEW_KEYS {
            if !projection.views.contains_key(key) {
                return Err(DomainError::InvalidDashboardAssets {
                    missing: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::profile::Dimension;
    use crate::domain::rules::{ExecutionSummary, RuleMetric};

    fn metric(rule_id: &str, dimension: Dimension, column: &str, rate: f64, violated: bool, severity: Severity) -> RuleMetric {
        RuleMetric {
            rule_id: rule_id.to_string(),
            dimension,
            column: column.to_string(),
            severity,
            threshold: 0.9,
            success_rate: rate,
            evaluated_count: 100,
            failed_count: ((1.0 - rate) * 100.0) as usize,
            violated,
        }
    }

    fn report() -> ExecutionReport {
        let metrics = vec![
            metric("r1", Dimension::Completeness, "email", 0.4, true, Severity::Critical),
            metric("r2", Dimension::Completeness, "name", 0.99, false, Severity::Info),
            metric("r3", Dimension::Uniqueness, "id", 0.7, true, Severity::Warning),
        ];
        ExecutionReport {
            summary: ExecutionSummary {
                execution_id: "e1".to_string(),
                total_rules: 3,
                passed: 1,
                failed: 2,
                critical_failure: true,
            },
            metrics,
        }
    }

    #[test]
    fn test_projection_carries_all_contract_keys() {
        let projection = DashboardProjector::project(&report());
        assert_eq!(projection.contract_version, DASHBOARD_CONTRACT_VERSION);
        for key in REQUIRED_VIEW_KEYS {
            assert!(projection.views.contains_key(key), "missing {key}");
        }
        DashboardProjector::validate(&projection).unwrap();
    }

    #[test]
    fn test_worst_column_ranks_first() {
        let projection = DashboardProjector::project(&report());
        let top = projection.views["top_failing_columns"].as_array().unwrap();
        assert_eq!(top[0]["column"], "email");
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_severity_counts_only_violations() {
        let projection = DashboardProjector::project(&report());
        let counts = &projection.views["severity_counts"];
        assert_eq!(counts["critical"], 1);
        assert_eq!(counts["warning"], 1);
        assert_eq!(counts["info"], 0);
    }

    #[test]
    fn test_validate_flags_missing_key() {
        let mut projection = DashboardProjector::project(&report());
        projection.views.remove("severity_counts");
        let res = DashboardProjector::validate(&projection);
        assert!(matches!(
            res,
            Err(DomainError::InvalidDashboardAssets { missing }) if missing == "severity_counts"
        ));
    }
}
