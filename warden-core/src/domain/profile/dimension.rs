// warden-core/src/domain/profile/dimension.rs

use serde::{Deserialize, Serialize};

/// The quality dimension vocabulary. Six axes are declared; at most four are
/// ever computed from the dataset alone (see `requires_external_evidence`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Completeness,
    Uniqueness,
    Validity,
    Timeliness,
    Accuracy,
    Consistency,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Completeness => "completeness",
            Dimension::Uniqueness => "uniqueness",
            Dimension::Validity => "validity",
            Dimension::Timeliness => "timeliness",
            Dimension::Accuracy => "accuracy",
            Dimension::Consistency => "consistency",
        }
    }

    /// True for dimensions that cannot be derived from the dataset alone
    /// (ground truth, cross-system comparison). Scoring one of these from a
    /// single dataset would be fabrication; the truth enforcer treats a
    /// computed score here as a contract violation.
    pub fn requires_external_evidence(&self) -> bool {
        matches!(self, Dimension::Accuracy | Dimension::Consistency)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of one quality dimension for a profiling run.
///
/// Invariant: either `computed == true` and `score` is in [0,1], or
/// `computed == false` with a `reason` and no score. Never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    pub computed: bool,
    pub score: Option<f64>,
    pub reason: Option<String>,
    /// Human-readable derivation, e.g. "mean(non_null/total) over 5 columns".
    pub formula: String,
    /// Number of observations that contributed to the score.
    pub computed_from: usize,
}

impl DimensionScore {
    pub fn computed(dimension: Dimension, score: f64, formula: impl Into<String>, computed_from: usize) -> Self {
        Self {
            dimension,
            computed: true,
            score: Some(score.clamp(0.0, 1.0)),
            reason: None,
            formula: formula.into(),
            computed_from,
        }
    }

    pub fn omitted(dimension: Dimension, reason: impl Into<String>) -> Self {
        Self {
            dimension,
            computed: false,
            score: None,
            reason: Some(reason.into()),
            formula: "not derivable".to_string(),
            computed_from: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_score_is_clamped() {
        let s = DimensionScore::computed(Dimension::Completeness, 1.4, "f", 3);
        assert_eq!(s.score, Some(1.0));
        assert!(s.computed);
        assert!(s.reason.is_none());
    }

    #[test]
    fn test_omitted_carries_reason_and_no_score() {
        let s = DimensionScore::omitted(Dimension::Accuracy, "needs ground truth");
        assert!(!s.computed);
        assert_eq!(s.score, None);
        assert_eq!(s.reason.as_deref(), Some("needs ground truth"));
    }

    #[test]
    fn test_external_evidence_dimensions() {
        assert!(Dimension::Accuracy.requires_external_evidence());
        assert!(Dimension::Consistency.requires_external_evidence());
        assert!(!Dimension::Timeliness.requires_external_evidence());
        assert!(!Dimension::Completeness.requires_external_evidence());
    }
}
