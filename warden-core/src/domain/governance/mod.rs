// warden-core/src/domain/governance/mod.rs

pub mod enforcer;

// Re-exports
pub use enforcer::{
    Inconsistency, OmittedDimension, RunEvidence, TruthCheck, TruthEnforcer, TrustReport, Verdict,
};
