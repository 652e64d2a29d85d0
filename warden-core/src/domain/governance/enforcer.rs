// warden-core/src/domain/governance/enforcer.rs
//
// Cross-stage truth contract. Every prior stage's output is re-validated for
// structural and numeric consistency before a run is allowed to reach a user.
// Lives as its own component (not inline assertions in each stage) so the
// checks stay independently testable and auditable.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::incident::Incident;
use crate::domain::profile::{Dimension, ProfilingReport};
use crate::domain::rules::{ExecutionReport, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TruthCheck {
    /// passed + failed must equal the total rule count.
    ExecutionTruthViolation,
    /// Rates, thresholds and scores in [0,1]; counts never negative or inverted.
    BoundsViolation,
    /// An executed rule id that the generated set never contained.
    PhantomRule,
    /// A generated rule that was never attempted. Logged, not penalized.
    UnexecutedRule,
    /// An incident referencing a rule that did not fail.
    OrphanIncident,
    /// A score for a dimension that cannot be derived from the dataset alone.
    FabricatedDimension,
}

impl TruthCheck {
    /// Whether this check weighs on the truth score. Unexecuted rules are
    /// surfaced for the audit trail but do not decertify a run on their own.
    fn penalized(&self) -> bool {
        !matches!(self, TruthCheck::UnexecutedRule)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inconsistency {
    pub check: TruthCheck,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmittedDimension {
    pub dimension: Dimension,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Certified,
    ContractViolation,
}

/// Consistency verdict over one full run. Computed fresh every run and only
/// meaningful attached to the run it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustReport {
    /// Internal-consistency score in [0,100]; 100 = fully consistent.
    /// This measures the pipeline's outputs, not the data's quality.
    pub truth_score: u32,
    pub verdict: Verdict,
    pub inconsistencies_found: Vec<Inconsistency>,
    /// Dimensions that were not computed, listed rather than silently dropped.
    pub omitted_dimensions: Vec<OmittedDimension>,
    /// Echo of the generator's dedup count.
    pub deduplicated_rules: usize,
}

/// Accumulated stage outputs for one run.
pub struct RunEvidence<'a> {
    pub profiling: &'a ProfilingReport,
    pub rule_set: &'a RuleSet,
    pub execution: &'a ExecutionReport,
    /// Incidents raised by this run.
    pub incidents: &'a [Incident],
}

pub struct TruthEnforcer {
    /// Points deducted per penalized inconsistency.
    pub penalty_per_inconsistency: u32,
    /// Scores below this bar yield `ContractViolation`.
    pub certification_threshold: u32,
}

impl Default for TruthEnforcer {
    fn default() -> Self {
        Self {
            penalty_per_inconsistency: 10,
            // Zero tolerance: any penalized inconsistency decertifies the run.
            certification_threshold: 100,
        }
    }
}

impl TruthEnforcer {
    pub fn enforce(&self, evidence: &RunEvidence<'_>) -> TrustReport {
        let mut found: Vec<Inconsistency> = Vec::new();

        self.check_execution_totals(evidence.execution, &mut found);
        self.check_bounds(evidence, &mut found);
        self.check_rule_coverage(evidence.rule_set, evidence.execution, &mut found);
        self.check_incidents(evidence.execution, evidence.incidents, &mut found);
        self.check_dimension_honesty(evidence.profiling, &mut found);

        for inc in &found {
            tracing::warn!(check = ?inc.check, detail = %inc.detail, "truth contract inconsistency");
        }

        let penalized = found.iter().filter(|i| i.check.penalized()).count() as u32;
        let truth_score = 100u32.saturating_sub(penalized * self.penalty_per_inconsistency);
        let verdict = if truth_score >= self.certification_threshold {
            Verdict::Certified
        } else {
            Verdict::ContractViolation
        };

        let omitted_dimensions = evidence
            .profiling
            .dimensions
            .iter()
            .filter(|d| !d.computed)
            .map(|d| OmittedDimension {
                dimension: d.dimension,
                reason: d.reason.clone().unwrap_or_else(|| "unspecified".to_string()),
            })
            .collect();

        TrustReport {
            truth_score,
            verdict,
            inconsistencies_found: found,
            omitted_dimensions,
            deduplicated_rules: evidence.rule_set.deduplicated,
        }
    }

    fn check_execution_totals(&self, execution: &ExecutionReport, found: &mut Vec<Inconsistency>) {
        let s = &execution.summary;
        if s.passed + s.failed != s.total_rules {
            found.push(Inconsistency {
                check: TruthCheck::ExecutionTruthViolation,
                detail: format!(
                    "execution '{}': passed {} + failed {} != total {}",
                    s.execution_id, s.passed, s.failed, s.total_rules
                ),
            });
        }
        if s.total_rules != execution.metrics.len() {
            found.push(Inconsistency {
                check: TruthCheck::ExecutionTruthViolation,
                detail: format!(
                    "execution '{}': summary claims {} rules but {} metrics exist",
                    s.execution_id,
                    s.total_rules,
                    execution.metrics.len()
                ),
            });
        }
    }

    fn check_bounds(&self, evidence: &RunEvidence<'_>, found: &mut Vec<Inconsistency>) {
        let unit = 0.0..=1.0;

        for m in &evidence.execution.metrics {
            if !m.success_rate.is_finite() || !unit.contains(&m.success_rate) {
                found.push(Inconsistency {
                    check: TruthCheck::BoundsViolation,
                    detail: format!("metric '{}': success_rate {} outside [0,1]", m.rule_id, m.success_rate),
                });
            }
            if !m.threshold.is_finite() || !unit.contains(&m.threshold) {
                found.push(Inconsistency {
                    check: TruthCheck::BoundsViolation,
                    detail: format!("metric '{}': threshold {} outside [0,1]", m.rule_id, m.threshold),
                });
            }
            if m.failed_count > m.evaluated_count {
                found.push(Inconsistency {
                    check: TruthCheck::BoundsViolation,
                    detail: format!(
                        "metric '{}': failed {} exceeds evaluated {}",
                        m.rule_id, m.failed_count, m.evaluated_count
                    ),
                });
            }
        }

        for r in &evidence.rule_set.rules {
            if !r.confidence.is_finite() || !unit.contains(&r.confidence) {
                found.push(Inconsistency {
                    check: TruthCheck::BoundsViolation,
                    detail: format!("rule '{}': confidence {} outside [0,1]", r.id, r.confidence),
                });
            }
        }

        for d in &evidence.profiling.dimensions {
            if let Some(score) = d.score
                && (!score.is_finite() || !unit.contains(&score))
            {
                found.push(Inconsistency {
                    check: TruthCheck::BoundsViolation,
                    detail: format!("dimension '{}': score {} outside [0,1]", d.dimension, score),
                });
            }
        }
    }

    fn check_rule_coverage(
        &self,
        rule_set: &RuleSet,
        execution: &ExecutionReport,
        found: &mut Vec<Inconsistency>,
    ) {
        let generated: HashSet<&str> = rule_set.rule_ids().collect();
        let executed: HashSet<&str> =
            execution.metrics.iter().map(|m| m.rule_id.as_str()).collect();

        for phantom in executed.difference(&generated) {
            found.push(Inconsistency {
                check: TruthCheck::PhantomRule,
                detail: format!("metric references rule '{phantom}' absent from rule set v{}", rule_set.version),
            });
        }
        for missed in generated.difference(&executed) {
            found.push(Inconsistency {
                check: TruthCheck::UnexecutedRule,
                detail: format!("rule '{missed}' from v{} was never attempted", rule_set.version),
            });
        }
    }

    fn check_incidents(
        &self,
        execution: &ExecutionReport,
        incidents: &[Incident],
        found: &mut Vec<Inconsistency>,
    ) {
        let violated: HashMap<&str, bool> = execution
            .metrics
            .iter()
            .map(|m| (m.rule_id.as_str(), m.violated))
            .collect();

        for incident in incidents {
            match violated.get(incident.rule_id.as_str()) {
                Some(true) => {}
                _ => found.push(Inconsistency {
                    check: TruthCheck::OrphanIncident,
                    detail: format!(
                        "incident '{}' references rule '{}' which did not fail",
                        incident.id, incident.rule_id
                    ),
                }),
            }
        }
    }

    fn check_dimension_honesty(&self, profiling: &ProfilingReport, found: &mut Vec<Inconsistency>) {
        for d in &profiling.dimensions {
            if d.dimension.requires_external_evidence() && d.computed {
                found.push(Inconsistency {
                    check: TruthCheck::FabricatedDimension,
                    detail: format!(
                        "dimension '{}' cannot be derived from the dataset alone but carries a score",
                        d.dimension
                    ),
                });
            }
        }
    }
}
