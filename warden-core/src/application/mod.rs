// warden-core/src/application/mod.rs

pub mod orchestrator;
pub mod request;

// Re-exports
pub use orchestrator::Orchestrator;
pub use request::{
    ExecutionModeArg, PipelineRequest, PipelineResponse, ResponseStatus, Stage, StageFailure,
};
