// warden-core/src/domain/rules/generator.rs

use std::collections::HashSet;

use chrono::Utc;

use crate::domain::error::DomainError;
use crate::domain::profile::{ColumnProfile, Dimension, ProfilingReport};
use crate::domain::rules::rule::{ALL_COLUMNS, Rule, RuleLogic, RuleSet, Severity};

/// A column whose distinct ratio reaches this bar is treated as a candidate
/// key and gets a uniqueness rule.
const CANDIDATE_KEY_BAR: f64 = 0.95;

pub struct RuleGenerator {
    /// Subtracted from the observed score to calibrate a threshold, so a rule
    /// is anchored to profiling evidence with slack for ordinary drift.
    pub safety_margin: f64,
    /// Window carried into generated timeliness rules.
    pub recency_window_days: i64,
}

impl Default for RuleGenerator {
    fn default() -> Self {
        Self {
            safety_margin: 0.05,
            recency_window_days: 365,
        }
    }
}

impl RuleGenerator {
    /// Turns a profiling report into an immutable, deduplicated rule set.
    /// `version` must come from the store's atomic per-dataset sequence.
    pub fn generate(
        &self,
        report: &ProfilingReport,
        version: u64,
    ) -> Result<RuleSet, DomainError> {
        if report.columns.is_empty() {
            return Err(DomainError::InvalidProfilingOutput(
                "profiling report carries no column profiles".to_string(),
            ));
        }
        if report.dimensions.is_empty() {
            return Err(DomainError::InvalidProfilingOutput(
                "profiling report carries no dimension scores".to_string(),
            ));
        }
        if report.row_count == 0 {
            return Err(DomainError::InvalidProfilingOutput(
                "profiling report covers zero rows".to_string(),
            ));
        }

        let mut candidates: Vec<(Dimension, String, RuleLogic, f64)> = Vec::new();

        for col in &report.columns {
            self.column_candidates(col, &mut candidates);
        }

        // Dataset-level timeliness rule, only when the dimension was computed.
        if let Some(timeliness) = report
            .dimensions
            .iter()
            .find(|d| d.dimension == Dimension::Timeliness && d.computed)
            && let Some(observed) = timeliness.score
        {
            candidates.push((
                Dimension::Timeliness,
                ALL_COLUMNS.to_string(),
                RuleLogic::RecencyWithinDays { days: self.recency_window_days },
                observed,
            ));
        }

        // Dedup by (dimension, column, logic); the collapsed count is reported
        // so the truth enforcer can sanity-check the set.
        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut rules = Vec::new();
        let mut deduplicated = 0usize;
        for (dimension, column, logic, observed) in candidates {
            let key = (dimension.as_str().to_string(), column.clone(), logic.descriptor());
            if !seen.insert(key) {
                deduplicated += 1;
                continue;
            }
            rules.push(self.build_rule(dimension, column, logic, observed, version));
        }

        Ok(RuleSet {
            dataset_id: report.dataset_id.clone(),
            version,
            rules,
            deduplicated,
            generated_at: Utc::now(),
        })
    }

    fn column_candidates(
        &self,
        col: &ColumnProfile,
        out: &mut Vec<(Dimension, String, RuleLogic, f64)>,
    ) {
        // Completeness: meaningful as soon as the column carries any values.
        if col.completeness > 0.0 {
            out.push((
                Dimension::Completeness,
                col.column.clone(),
                RuleLogic::NotNull,
                col.completeness,
            ));
        }

        // Uniqueness: only candidate keys; a 0.3-distinct column is not a
        // uniqueness expectation, it's a category column.
        if col.uniqueness >= CANDIDATE_KEY_BAR && col.null_count < col.total_count {
            out.push((
                Dimension::Uniqueness,
                col.column.clone(),
                RuleLogic::Unique,
                col.uniqueness,
            ));
        }

        // Validity: the profiled type is the expectation.
        if col.null_count < col.total_count {
            out.push((
                Dimension::Validity,
                col.column.clone(),
                RuleLogic::TypeConforms { expected: col.inferred_type },
                col.validity,
            ));
        }
    }

    fn build_rule(
        &self,
        dimension: Dimension,
        column: String,
        logic: RuleLogic,
        observed: f64,
        version: u64,
    ) -> Rule {
        // Threshold calibrated from the observed value, never an arbitrary
        // constant: slack below what the data actually showed.
        let threshold = (observed - self.safety_margin).clamp(0.0, 1.0);
        Rule {
            id: format!("{dimension}:{column}:v{version}"),
            version,
            dimension,
            column,
            logic,
            threshold,
            severity: severity_for(observed),
            confidence: observed.clamp(0.0, 1.0),
        }
    }
}

/// The worse the observed score, the louder the generated rule.
fn severity_for(observed: f64) -> Severity {
    if observed < 0.5 {
        Severity::Critical
    } else if observed < 0.9 {
        Severity::Warning
    } else {
        Severity::Info
    }
}
