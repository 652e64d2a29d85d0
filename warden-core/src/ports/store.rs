// warden-core/src/ports/store.rs

// What the pipeline needs from persistence, without knowing how it's done.
// The store is an opaque keyed table store; everything the pipeline writes is
// an append-only insert, except the incident upsert which must be atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::incident::Incident;
use crate::domain::profile::ProfilingReport;
use crate::domain::record::RawRow;
use crate::domain::rules::{RuleMetric, RuleSet};
use crate::error::WardenError;

/// Persisted profiling record (`dq_profiles`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub profiling_run_id: String,
    pub dataset_id: String,
    pub row_count: usize,
    pub report: ProfilingReport,
    pub profile_ts: DateTime<Utc>,
}

/// Result of an atomic incident upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads up to `cap` raw rows of a dataset.
    /// Fails with `DatasetNotFound` for unknown dataset ids.
    async fn fetch_rows(&self, dataset_id: &str, cap: usize) -> Result<Vec<RawRow>, WardenError>;

    /// Allocates the next rule-set version for a dataset. Must be atomic:
    /// two concurrent runs on the same dataset must never receive the same
    /// version.
    async fn next_rules_version(&self, dataset_id: &str) -> Result<u64, WardenError>;

    async fn insert_profile(&self, profile: StoredProfile) -> Result<(), WardenError>;

    async fn insert_rule_set(&self, rule_set: &RuleSet) -> Result<(), WardenError>;

    async fn insert_metrics(
        &self,
        execution_id: &str,
        metrics: &[RuleMetric],
    ) -> Result<(), WardenError>;

    /// Upserts by the incident's (dataset, dimension, rule) key. Atomic, so
    /// concurrent runs cannot raise duplicate incidents for the same rule.
    async fn upsert_incident(&self, incident: &Incident) -> Result<UpsertOutcome, WardenError>;

    async fn list_incidents(&self, dataset_id: &str) -> Result<Vec<Incident>, WardenError>;
}
