// warden-core/src/infrastructure/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::error::DomainError;
use crate::domain::incident::Incident;
use crate::domain::record::RawRow;
use crate::domain::rules::{RuleMetric, RuleSet};
use crate::error::WardenError;
use crate::ports::store::{RecordStore, StoredProfile, UpsertOutcome};

/// In-memory keyed table store. One table per record family; appends only,
/// except the incident upsert which happens under a single write lock so the
/// check-then-insert is atomic.
#[derive(Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<String, Vec<RawRow>>>,
    profiles: RwLock<Vec<StoredProfile>>,
    rule_sets: RwLock<Vec<RuleSet>>,
    metrics: RwLock<HashMap<String, Vec<RuleMetric>>>,
    incidents: RwLock<HashMap<String, Incident>>,
    // Per-dataset rule-set version sequences. A plain process-local counter
    // would hand the same version to two concurrent runs; the lock makes the
    // read-increment-return one step.
    sequences: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset's raw rows. Ingestion itself is outside the
    /// pipeline; this stands in for it.
    pub async fn insert_dataset(&self, dataset_id: &str, rows: Vec<RawRow>) {
        self.datasets
            .write()
            .await
            .insert(dataset_id.to_string(), rows);
    }

    pub async fn profiles(&self) -> Vec<StoredProfile> {
        self.profiles.read().await.clone()
    }

    pub async fn rule_sets(&self) -> Vec<RuleSet> {
        self.rule_sets.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_rows(&self, dataset_id: &str, cap: usize) -> Result<Vec<RawRow>, WardenError> {
        let datasets = self.datasets.read().await;
        let rows = datasets
            .get(dataset_id)
            .ok_or_else(|| DomainError::DatasetNotFound(dataset_id.to_string()))?;
        Ok(rows.iter().take(cap).cloned().collect())
    }

    async fn next_rules_version(&self, dataset_id: &str) -> Result<u64, WardenError> {
        let mut sequences = self.sequences.lock().await;
        let version = sequences.entry(dataset_id.to_string()).or_insert(0);
        *version += 1;
        Ok(*version)
    }

    async fn insert_profile(&self, profile: StoredProfile) -> Result<(), WardenError> {
        self.profiles.write().await.push(profile);
        Ok(())
    }

    async fn insert_rule_set(&self, rule_set: &RuleSet) -> Result<(), WardenError> {
        self.rule_sets.write().await.push(rule_set.clone());
        Ok(())
    }

    async fn insert_metrics(
        &self,
        execution_id: &str,
        metrics: &[RuleMetric],
    ) -> Result<(), WardenError> {
        self.metrics
            .write()
            .await
            .insert(execution_id.to_string(), metrics.to_vec());
        Ok(())
    }

    async fn upsert_incident(&self, incident: &Incident) -> Result<UpsertOutcome, WardenError> {
        let mut incidents = self.incidents.write().await;
        match incidents.get_mut(&incident.key()) {
            Some(existing) => {
                // Repeated violation: refresh recency, keep triage status.
                existing.last_seen = Utc::now();
                existing.severity = incident.severity;
                existing.recommended_action = incident.recommended_action.clone();
                Ok(UpsertOutcome::Updated)
            }
            None => {
                incidents.insert(incident.key(), incident.clone());
                Ok(UpsertOutcome::Created)
            }
        }
    }

    async fn list_incidents(&self, dataset_id: &str) -> Result<Vec<Incident>, WardenError> {
        let incidents = self.incidents.read().await;
        let mut found: Vec<Incident> = incidents
            .values()
            .filter(|i| i.dataset_id == dataset_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.rule_id.cmp(&b.rule_id));
        Ok(found)
    }
}
