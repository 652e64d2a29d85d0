// warden-core/src/domain/profile/profiler.rs

use chrono::{Duration, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::profile::column::{ColumnProfile, InferredType, parse_datetime, profile_column};
use crate::domain::profile::dimension::{Dimension, DimensionScore};
use crate::domain::record::{FieldValue, RawRow};

/// Column scans are pure and read-only; bound the fan-out anyway.
const PROFILE_CONCURRENCY: usize = 8;

/// Output of one profiling run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilingReport {
    pub dataset_id: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub dimensions: Vec<DimensionScore>,
    pub elapsed_ms: u64,
}

pub struct Profiler {
    /// Hard cap on the number of rows scanned.
    pub sample_cap: usize,
    /// Window for the timeliness score.
    pub recency_window_days: i64,
    /// Sample values retained per column.
    pub max_sample_values: usize,
}

impl Default for Profiler {
    fn default() -> Self {
        Self {
            sample_cap: 1_000,
            recency_window_days: 365,
            max_sample_values: 5,
        }
    }
}

impl Profiler {
    /// Profiles a bounded sample of raw rows.
    ///
    /// The column set is taken from the first row; a column scan then covers
    /// every sampled row (fields absent from a row count as null).
    pub async fn profile(
        &self,
        dataset_id: &str,
        rows: &[RawRow],
    ) -> Result<ProfilingReport, DomainError> {
        let start = std::time::Instant::now();

        if rows.is_empty() {
            return Err(DomainError::EmptyDataset(dataset_id.to_string()));
        }
        let sample = &rows[..rows.len().min(self.sample_cap)];

        let first = &sample[0];
        if first.is_empty() {
            return Err(DomainError::InvalidDataFormat {
                dataset_id: dataset_id.to_string(),
                detail: "first row has no fields".to_string(),
            });
        }
        let names: Vec<String> = first.keys().cloned().collect();

        // Parallel column scans, bounded concurrency (same layer idiom as the
        // orchestrator's stage execution).
        let scans = names.iter().map(|name| {
            let name = name.clone();
            async move { profile_column(&name, sample, self.max_sample_values) }
        });
        let mut columns: Vec<ColumnProfile> = futures::stream::iter(scans)
            .buffer_unordered(PROFILE_CONCURRENCY)
            .collect()
            .await;
        // buffer_unordered yields in completion order; re-sort for determinism.
        columns.sort_by(|a, b| a.column.cmp(&b.column));

        let dimensions = self.dimension_scores(&columns, sample);

        Ok(ProfilingReport {
            dataset_id: dataset_id.to_string(),
            row_count: sample.len(),
            column_count: columns.len(),
            columns,
            dimensions,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn dimension_scores(&self, columns: &[ColumnProfile], rows: &[RawRow]) -> Vec<DimensionScore> {
        let n = columns.len();
        let mean_of = |f: fn(&ColumnProfile) -> f64| {
            columns.iter().map(f).sum::<f64>() / n.max(1) as f64
        };

        let mut scores = vec![
            DimensionScore::computed(
                Dimension::Completeness,
                mean_of(|c| c.completeness),
                format!("mean(non_null/total) over {n} columns"),
                n,
            ),
            DimensionScore::computed(
                Dimension::Uniqueness,
                mean_of(|c| c.uniqueness),
                format!("mean(distinct/non_null) over {n} columns"),
                n,
            ),
            DimensionScore::computed(
                Dimension::Validity,
                mean_of(|c| c.validity),
                format!("mean(type_conformant/non_null) over {n} columns"),
                n,
            ),
        ];

        scores.push(self.timeliness_score(columns, rows));

        // Hard invariant: these need evidence outside the dataset. They are
        // declared and flagged, never scored.
        scores.push(DimensionScore::omitted(
            Dimension::Accuracy,
            "requires external ground truth; not derivable from the dataset alone",
        ));
        scores.push(DimensionScore::omitted(
            Dimension::Consistency,
            "requires a second system to compare against",
        ));

        scores
    }

    /// Timeliness = fraction of datetime values inside the recency window.
    /// Omitted (not zero-filled) when no datetime column exists.
    fn timeliness_score(&self, columns: &[ColumnProfile], rows: &[RawRow]) -> DimensionScore {
        let datetime_columns: Vec<&str> = columns
            .iter()
            .filter(|c| c.inferred_type == InferredType::Datetime)
            .map(|c| c.column.as_str())
            .collect();

        if datetime_columns.is_empty() {
            return DimensionScore::omitted(Dimension::Timeliness, "no datetime column observed");
        }

        let cutoff = Utc::now() - Duration::days(self.recency_window_days);
        let mut total = 0usize;
        let mut recent = 0usize;
        for row in rows {
            for col in &datetime_columns {
                if let Some(FieldValue::Text(s)) = row.get(*col)
                    && let Some(ts) = parse_datetime(s.trim())
                {
                    total += 1;
                    if ts >= cutoff {
                        recent += 1;
                    }
                }
            }
        }

        if total == 0 {
            return DimensionScore::omitted(
                Dimension::Timeliness,
                "datetime columns present but no parseable values",
            );
        }

        DimensionScore::computed(
            Dimension::Timeliness,
            recent as f64 / total as f64,
            format!(
                "values within {} days / parseable datetime values",
                self.recency_window_days
            ),
            total,
        )
    }
}
