// warden-core/src/infrastructure/config.rs

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::infrastructure::error::InfrastructureError;

/// What to do once a critical-severity rule is violated. The observed
/// behaviors in the wild disagree, so the policy is explicit and
/// independently configurable rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalFailurePolicy {
    /// Run every stage; the failure travels as `critical_failure: true`.
    #[default]
    Continue,
    /// Halt after the execution stage; dashboard and incidents are skipped.
    /// Governance still runs, it gates everything.
    CircuitBreaker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Hard cap on profiled/executed rows per run.
    pub sample_cap: usize,
    /// Slack subtracted from an observed score to calibrate a rule threshold.
    pub safety_margin: f64,
    /// Timeliness window.
    pub recency_window_days: i64,
    /// Sample values retained per column profile.
    pub max_sample_values: usize,
    pub critical_failure_policy: CriticalFailurePolicy,
    /// Truth-score points deducted per inconsistency.
    pub truth_penalty: u32,
    /// Truth score below this bar decertifies the run.
    pub certification_threshold: u32,
    /// Wall-clock budget per pipeline run.
    pub run_timeout_secs: u64,
    /// Row field consulted for incremental execution.
    pub created_at_field: String,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            sample_cap: 1_000,
            safety_margin: 0.05,
            recency_window_days: 365,
            max_sample_values: 5,
            critical_failure_policy: CriticalFailurePolicy::Continue,
            truth_penalty: 10,
            certification_threshold: 100,
            run_timeout_secs: 30,
            created_at_field: "created_at".to_string(),
        }
    }
}

/// Loads the pipeline configuration. The file is optional; every knob has a
/// default.
pub fn load_config(path: Option<&Path>) -> Result<WardenConfig, InfrastructureError> {
    let Some(path) = path else {
        return Ok(WardenConfig::default());
    };
    if !path.exists() {
        return Err(InfrastructureError::ConfigNotFound(
            path.display().to_string(),
        ));
    }
    let content = fs::read_to_string(path)?;
    let config: WardenConfig = serde_yaml::from_str(&content)?;

    if !(0.0..=1.0).contains(&config.safety_margin) {
        return Err(InfrastructureError::ConfigError(format!(
            "safety_margin must lie in [0,1], got {}",
            config.safety_margin
        )));
    }
    if config.certification_threshold > 100 {
        return Err(InfrastructureError::ConfigError(format!(
            "certification_threshold must lie in [0,100], got {}",
            config.certification_threshold
        )));
    }
    if config.sample_cap == 0 {
        return Err(InfrastructureError::ConfigError(
            "sample_cap must be positive".to_string(),
        ));
    }

    Ok(config)
}
