// warden-core/src/domain/incident.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::profile::Dimension;
use crate::domain::rules::{ALL_COLUMNS, RuleMetric, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
}

/// One quality incident. Keyed by (dataset, dimension, rule id) so a repeated
/// violation updates the existing record instead of piling up duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub dataset_id: String,
    pub dimension: Dimension,
    pub severity: Severity,
    pub status: IncidentStatus,
    /// The violated rule this incident originates from. An incident without
    /// one is an orphan and a governance contract violation.
    pub rule_id: String,
    pub recommended_action: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Incident {
    /// Storage key for the atomic upsert.
    pub fn key(&self) -> String {
        incident_key(&self.dataset_id, self.dimension, &self.rule_id)
    }
}

pub fn incident_key(dataset_id: &str, dimension: Dimension, rule_id: &str) -> String {
    format!("{dataset_id}/{dimension}/{rule_id}")
}

/// Drafts the incident for one violated metric. Pure: the caller is
/// responsible for refusing non-violated metrics and for the keyed upsert.
pub fn draft_incident(dataset_id: &str, metric: &RuleMetric, now: DateTime<Utc>) -> Incident {
    Incident {
        id: uuid::Uuid::new_v4().to_string(),
        dataset_id: dataset_id.to_string(),
        dimension: metric.dimension,
        severity: metric.severity,
        status: IncidentStatus::Open,
        rule_id: metric.rule_id.clone(),
        recommended_action: recommended_action(metric),
        first_seen: now,
        last_seen: now,
    }
}

fn recommended_action(metric: &RuleMetric) -> String {
    let scope = if metric.column == ALL_COLUMNS {
        "the dataset".to_string()
    } else {
        format!("column '{}'", metric.column)
    };
    match metric.dimension {
        Dimension::Completeness => format!(
            "Investigate the ingestion path filling {scope}: {} of {} evaluated values were missing",
            metric.failed_count, metric.evaluated_count
        ),
        Dimension::Uniqueness => format!("Deduplicate {scope}; duplicate values broke a candidate-key expectation"),
        Dimension::Validity => format!("Review type drift in {scope}; values stopped conforming to the profiled type"),
        Dimension::Timeliness => format!("Check upstream delivery lag for {scope}; records fell outside the recency window"),
        Dimension::Accuracy | Dimension::Consistency => {
            format!("Compare {scope} against its external reference system")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violated_metric() -> RuleMetric {
        RuleMetric {
            rule_id: "completeness:email:v3".to_string(),
            dimension: Dimension::Completeness,
            column: "email".to_string(),
            severity: Severity::Critical,
            threshold: 0.95,
            success_rate: 0.40,
            evaluated_count: 100,
            failed_count: 60,
            violated: true,
        }
    }

    #[test]
    fn test_draft_inherits_rule_severity_and_reference() {
        let now = Utc::now();
        let incident = draft_incident("orders", &violated_metric(), now);

        assert_eq!(incident.severity, Severity::Critical);
        assert_eq!(incident.status, IncidentStatus::Open);
        assert_eq!(incident.rule_id, "completeness:email:v3");
        assert_eq!(incident.first_seen, now);
        assert!(incident.recommended_action.contains("email"));
    }

    #[test]
    fn test_key_dedupes_by_dataset_dimension_rule() {
        let now = Utc::now();
        let a = draft_incident("orders", &violated_metric(), now);
        let b = draft_incident("orders", &violated_metric(), now);

        // Distinct ids, same upsert key
        assert_ne!(a.id, b.id);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), "orders/completeness/completeness:email:v3");
    }
}
