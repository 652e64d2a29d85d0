// warden-core/src/application/orchestrator.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::request::{
    PipelineRequest, PipelineResponse, ResponseStatus, Stage, StageFailure,
};
use crate::domain::dashboard::DashboardProjector;
use crate::domain::governance::{RunEvidence, TruthEnforcer, Verdict};
use crate::domain::incident::{Incident, draft_incident};
use crate::domain::profile::Profiler;
use crate::domain::rules::{RuleExecutor, RuleGenerator};
use crate::error::WardenError;
use crate::infrastructure::config::{CriticalFailurePolicy, WardenConfig};
use crate::ports::store::{RecordStore, StoredProfile, UpsertOutcome};

/// Sequences the pipeline stages for one run:
/// Profiling -> RuleGeneration -> Execution -> {Dashboard, Incidents} -> Governance.
///
/// Each stage receives only the prior stage's output; this is the one place
/// that sees all intermediate results. Stage transitions require the
/// predecessor's output to be structurally valid; the critical-failure policy
/// only governs the dashboard/incident stages.
pub struct Orchestrator<S: RecordStore> {
    store: Arc<S>,
    config: WardenConfig,
}

impl<S: RecordStore> Orchestrator<S> {
    pub fn new(store: Arc<S>, config: WardenConfig) -> Self {
        Self { store, config }
    }

    /// Runs the full pipeline under the configured wall-clock budget.
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineResponse, WardenError> {
        let budget = Duration::from_secs(self.config.run_timeout_secs);
        match tokio::time::timeout(budget, self.run_stages(request)).await {
            Ok(result) => result,
            Err(_) => Err(WardenError::Timeout {
                budget_secs: self.config.run_timeout_secs,
            }),
        }
    }

    async fn run_stages(&self, request: PipelineRequest) -> Result<PipelineResponse, WardenError> {
        let start = std::time::Instant::now();
        let mode = request.checked_mode()?;
        let dataset_id = request.dataset_id.as_str();
        info!(dataset_id, ?mode, "starting control-plane run");

        let rows = self
            .store
            .fetch_rows(dataset_id, self.config.sample_cap)
            .await?;

        let mut completed: Vec<Stage> = Vec::new();
        let mut failed: Vec<StageFailure> = Vec::new();

        // --- 1. PROFILING ---
        let profiler = Profiler {
            sample_cap: self.config.sample_cap,
            recency_window_days: self.config.recency_window_days,
            max_sample_values: self.config.max_sample_values,
        };
        let profiling = profiler.profile(dataset_id, &rows).await?;
        let profiling_run_id = Uuid::new_v4().to_string();
        self.store
            .insert_profile(StoredProfile {
                profiling_run_id: profiling_run_id.clone(),
                dataset_id: dataset_id.to_string(),
                row_count: profiling.row_count,
                report: profiling.clone(),
                profile_ts: Utc::now(),
            })
            .await?;
        completed.push(Stage::Profiling);
        info!(
            columns = profiling.column_count,
            rows = profiling.row_count,
            "profiling done"
        );

        // --- 2. RULE GENERATION ---
        // Version comes from the store's atomic sequence: concurrent runs on
        // the same dataset cannot mint colliding versions.
        let version = self.store.next_rules_version(dataset_id).await?;
        let generator = RuleGenerator {
            safety_margin: self.config.safety_margin,
            recency_window_days: self.config.recency_window_days,
        };
        let rule_set = generator.generate(&profiling, version)?;
        self.store.insert_rule_set(&rule_set).await?;
        completed.push(Stage::RuleGeneration);
        info!(
            version,
            rules = rule_set.rules.len(),
            deduplicated = rule_set.deduplicated,
            "rule set generated"
        );

        // --- 3. EXECUTION ---
        let execution_id = Uuid::new_v4().to_string();
        let executor = RuleExecutor {
            created_at_field: self.config.created_at_field.clone(),
        };
        let execution = executor.execute(&rule_set, &rows, mode, &execution_id)?;
        self.store
            .insert_metrics(&execution_id, &execution.metrics)
            .await?;
        completed.push(Stage::Execution);

        let tripped = execution.summary.critical_failure
            && self.config.critical_failure_policy == CriticalFailurePolicy::CircuitBreaker;

        // --- 4. DASHBOARD + INCIDENTS ---
        let mut incidents: Vec<Incident> = Vec::new();
        let mut incident_count = 0usize;
        let mut dashboard = None;
        if tripped {
            warn!(
                execution_id,
                "circuit breaker tripped on critical failure; skipping dashboard and incidents"
            );
        } else {
            // Dashboard contract breaks are soft: recorded, run continues.
            let projection = DashboardProjector::project(&execution);
            match DashboardProjector::validate(&projection) {
                Ok(()) => {
                    dashboard = Some(projection);
                    completed.push(Stage::Dashboard);
                }
                Err(e) => {
                    warn!(error = %e, "dashboard projection discarded");
                    failed.push(StageFailure {
                        stage: Stage::Dashboard,
                        code: e.code().to_string(),
                        message: e.to_string(),
                    });
                }
            }

            let now = Utc::now();
            for metric in execution.metrics.iter().filter(|m| m.violated) {
                let incident = draft_incident(dataset_id, metric, now);
                if self.store.upsert_incident(&incident).await? == UpsertOutcome::Created {
                    incident_count += 1;
                }
                incidents.push(incident);
            }
            completed.push(Stage::Incidents);
        }

        // --- 5. GOVERNANCE (always runs; it gates the response) ---
        let enforcer = TruthEnforcer {
            penalty_per_inconsistency: self.config.truth_penalty,
            certification_threshold: self.config.certification_threshold,
        };
        let trust_report = enforcer.enforce(&RunEvidence {
            profiling: &profiling,
            rule_set: &rule_set,
            execution: &execution,
            incidents: &incidents,
        });
        completed.push(Stage::Governance);

        let (status, code) = match trust_report.verdict {
            Verdict::Certified => (ResponseStatus::Success, "DQ_RUN_CERTIFIED"),
            Verdict::ContractViolation => (ResponseStatus::Error, "DQ_CONTRACT_VIOLATION"),
        };
        info!(
            ?status,
            truth_score = trust_report.truth_score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "control-plane run finished"
        );

        Ok(PipelineResponse {
            status,
            code: code.to_string(),
            message: None,
            profiling_run_id: Some(profiling_run_id),
            rules_version: Some(version),
            execution_summary: Some(execution.summary),
            incident_count,
            completed_steps: completed,
            failed_steps: failed,
            dashboard,
            trust_report: Some(trust_report),
        })
    }
}
