// warden-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Dataset '{0}' not found")]
    #[diagnostic(
        code(warden::domain::dataset_not_found),
        help("Check the dataset id; ingestion must have run before profiling.")
    )]
    DatasetNotFound(String),

    #[error("Dataset '{0}' has no ingestible rows")]
    #[diagnostic(
        code(warden::domain::empty_dataset),
        help("Profiling a zero-row dataset is a hard stop; no mock data is ever substituted.")
    )]
    EmptyDataset(String),

    #[error("Invalid row data in dataset '{dataset_id}': {detail}")]
    #[diagnostic(code(warden::domain::invalid_data_format))]
    InvalidDataFormat { dataset_id: String, detail: String },

    #[error("Profiling output rejected: {0}")]
    #[diagnostic(
        code(warden::domain::invalid_profiling_output),
        help("Rule generation needs column profiles and dimension scores.")
    )]
    InvalidProfilingOutput(String),

    #[error("Rule set unusable: {0}")]
    #[diagnostic(code(warden::domain::rules_failed))]
    RulesFailed(String),

    #[error("Dashboard projection is missing required key '{missing}'")]
    #[diagnostic(
        code(warden::domain::invalid_dashboard_assets),
        help("The dashboard contract is versioned; consumers rely on shape stability.")
    )]
    InvalidDashboardAssets { missing: String },
}

impl DomainError {
    /// Wire code for this error (see the pipeline entry-point contract).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            DomainError::EmptyDataset(_) => "EMPTY_DATASET",
            DomainError::InvalidDataFormat { .. } => "INVALID_DATA_FORMAT",
            DomainError::InvalidProfilingOutput(_) => "INVALID_PROFILING_OUTPUT",
            DomainError::RulesFailed(_) => "RULES_FAILED",
            DomainError::InvalidDashboardAssets { .. } => "INVALID_DASHBOARD_ASSETS",
        }
    }
}
