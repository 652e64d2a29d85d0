// warden-core/src/application/request.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::dashboard::DashboardProjection;
use crate::domain::governance::TrustReport;
use crate::domain::rules::{ExecutionMode, ExecutionSummary};
use crate::error::WardenError;

/// The single control-plane entry point's request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineRequest {
    #[validate(length(min = 1, message = "dataset_id must not be empty"))]
    pub dataset_id: String,
    #[serde(default)]
    pub dataset_version: Option<String>,
    pub execution_mode: ExecutionModeArg,
    #[serde(default)]
    pub last_execution_ts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionModeArg {
    Full,
    Incremental,
}

impl PipelineRequest {
    /// Validates the request and resolves the execution mode.
    /// Incremental mode without a parseable cutoff is an input error: the
    /// caller asked for "rows since X" without saying when X was.
    pub fn checked_mode(&self) -> Result<ExecutionMode, WardenError> {
        self.validate()
            .map_err(|e| WardenError::InvalidInput(e.to_string()))?;

        match self.execution_mode {
            ExecutionModeArg::Full => Ok(ExecutionMode::Full),
            ExecutionModeArg::Incremental => {
                let ts = self.last_execution_ts.as_deref().ok_or_else(|| {
                    WardenError::InvalidInput(
                        "INCREMENTAL mode requires last_execution_ts".to_string(),
                    )
                })?;
                let since = chrono::DateTime::parse_from_rfc3339(ts)
                    .map_err(|e| {
                        WardenError::InvalidInput(format!(
                            "last_execution_ts '{ts}' is not RFC 3339: {e}"
                        ))
                    })?
                    .with_timezone(&chrono::Utc);
                Ok(ExecutionMode::Incremental { since })
            }
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Profiling,
    RuleGeneration,
    Execution,
    Dashboard,
    Incidents,
    Governance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Final payload of one pipeline run. The step lists let a caller distinguish
/// "nothing ran" from "ran with a partial degradation".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    pub status: ResponseStatus,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profiling_run_id: Option<String>,
    pub rules_version: Option<u64>,
    pub execution_summary: Option<ExecutionSummary>,
    pub incident_count: usize,
    pub completed_steps: Vec<Stage>,
    pub failed_steps: Vec<StageFailure>,
    /// Validated projection for downstream display. Absent when the stage was
    /// skipped (circuit breaker) or its contract check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardProjection>,
    pub trust_report: Option<TrustReport>,
}

impl PipelineResponse {
    /// Hard-stop shape: a machine code and a message, no partial results.
    pub fn from_error(err: &WardenError) -> Self {
        Self {
            status: ResponseStatus::Error,
            code: err.code().to_string(),
            message: Some(err.to_string()),
            profiling_run_id: None,
            rules_version: None,
            execution_summary: None,
            incident_count: 0,
            completed_steps: vec![],
            failed_steps: vec![],
            dashboard: None,
            trust_report: None,
        }
    }
}
