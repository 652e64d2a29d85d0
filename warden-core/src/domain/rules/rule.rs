// warden-core/src/domain/rules/rule.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::profile::{Dimension, InferredType};

/// Target marker for dataset-level rules.
pub const ALL_COLUMNS: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Executable check behind a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleLogic {
    /// Value must be present and non-null.
    NotNull,
    /// Value must occur exactly once among the column's non-null values.
    Unique,
    /// Value must pass the sanity check for the profiled type.
    TypeConforms { expected: InferredType },
    /// The row's newest datetime value must fall inside the window.
    RecencyWithinDays { days: i64 },
}

impl RuleLogic {
    /// Stable descriptor used for deduplication keys.
    pub fn descriptor(&self) -> String {
        match self {
            RuleLogic::NotNull => "not_null".to_string(),
            RuleLogic::Unique => "unique".to_string(),
            RuleLogic::TypeConforms { expected } => format!("type_conforms:{expected}"),
            RuleLogic::RecencyWithinDays { days } => format!("recency_within_days:{days}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Deterministic id: `{dimension}:{column}:v{version}`.
    pub id: String,
    pub version: u64,
    pub dimension: Dimension,
    /// Target column, or [`ALL_COLUMNS`] for dataset-level rules.
    pub column: String,
    pub logic: RuleLogic,
    /// Minimum acceptable success rate, in [0,1].
    pub threshold: f64,
    pub severity: Severity,
    /// How much profiling evidence backs this rule, in [0,1].
    pub confidence: f64,
}

/// One immutable generation of rules for a dataset. A later profiling run
/// produces a new version; prior versions are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub dataset_id: String,
    pub version: u64,
    pub rules: Vec<Rule>,
    /// How many candidate rules collapsed during deduplication; the truth
    /// enforcer sanity-checks this against the final set.
    pub deduplicated: usize,
    pub generated_at: DateTime<Utc>,
}

impl RuleSet {
    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }
}
