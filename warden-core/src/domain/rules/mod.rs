// warden-core/src/domain/rules/mod.rs

pub mod executor;
pub mod generator;
pub mod rule;

// Re-exports
pub use executor::{ExecutionMode, ExecutionReport, ExecutionSummary, RuleExecutor, RuleMetric};
pub use generator::RuleGenerator;
pub use rule::{ALL_COLUMNS, Rule, RuleLogic, RuleSet, Severity};
