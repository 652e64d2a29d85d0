// warden-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardenError {
    // --- DOMAIN ERRORS (Profiling, Rules, Governance) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, Config, Store) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- REQUEST ERRORS ---
    #[error("Invalid request: {0}")]
    InvalidInput(String),

    // --- RUN BUDGET ---
    #[error("Pipeline run exceeded its wall-clock budget of {budget_secs}s")]
    Timeout { budget_secs: u64 },

    // --- GENERIC / APPLICATIVE ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl WardenError {
    /// Machine-readable code carried on every error response.
    pub fn code(&self) -> &'static str {
        match self {
            WardenError::Domain(e) => e.code(),
            WardenError::Infrastructure(_) => "STORAGE_ERROR",
            WardenError::InvalidInput(_) => "INVALID_INPUT",
            WardenError::Timeout { .. } => "RUN_TIMEOUT",
            WardenError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        WardenError::Infrastructure(InfrastructureError::Io(err))
    }
}
