// warden-core/src/domain/profile/column.rs

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::record::{FieldValue, RawRow};

// Shape detectors. ISO-8601-ish dates and canonical UUIDs.
static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
        .unwrap()
});
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});

/// Share of value shapes that must match for a type to win the inference.
const SHAPE_MAJORITY: f64 = 0.8;

/// Numeric magnitude beyond which a value is considered garbage
/// (overflow artifacts, sentinel values).
const SANE_MAGNITUDE: f64 = 1e15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Uuid,
}

impl std::fmt::Display for InferredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InferredType::String => "string",
            InferredType::Integer => "integer",
            InferredType::Float => "float",
            InferredType::Boolean => "boolean",
            InferredType::Datetime => "datetime",
            InferredType::Uuid => "uuid",
        };
        f.write_str(s)
    }
}

/// Descriptive statistics for numeric columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub mode: Option<f64>,
}

/// Profile of one column over the sampled rows. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub inferred_type: InferredType,
    pub total_count: usize,
    pub null_count: usize,
    pub distinct_count: usize,
    /// non-null / total
    pub completeness: f64,
    /// distinct / non-null
    pub uniqueness: f64,
    /// fraction of non-null values passing the type-appropriate sanity check
    pub validity: f64,
    pub numeric_stats: Option<NumericStats>,
    pub sample_values: Vec<String>,
}

/// Lenient datetime parsing: RFC 3339 first, then common naive layouts.
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn looks_numeric(value: &FieldValue) -> bool {
    match value {
        FieldValue::Integer(_) | FieldValue::Float(_) => true,
        FieldValue::Text(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn looks_integer(value: &FieldValue) -> bool {
    match value {
        FieldValue::Integer(_) => true,
        FieldValue::Float(f) => f.fract() == 0.0,
        FieldValue::Text(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn looks_datetime(value: &FieldValue) -> bool {
    matches!(value, FieldValue::Text(s) if ISO_DATE_RE.is_match(s.trim()))
}

fn looks_uuid(value: &FieldValue) -> bool {
    matches!(value, FieldValue::Text(s) if UUID_RE.is_match(s.trim()))
}

fn looks_boolean(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(_) => true,
        FieldValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "false"),
        _ => false,
    }
}

/// Infers a column type from the shapes of its non-null values.
/// Order matters: boolean and the narrow string shapes (uuid, datetime) are
/// tested before the numeric ratio so "2024-01-01" never lands as arithmetic.
pub fn infer_type(values: &[&FieldValue]) -> InferredType {
    if values.is_empty() {
        return InferredType::String;
    }
    let n = values.len() as f64;
    let ratio = |pred: fn(&FieldValue) -> bool| values.iter().filter(|v| pred(v)).count() as f64 / n;

    if values.iter().all(|v| looks_boolean(v)) {
        return InferredType::Boolean;
    }
    if ratio(looks_uuid) >= SHAPE_MAJORITY {
        return InferredType::Uuid;
    }
    if ratio(looks_datetime) >= SHAPE_MAJORITY {
        return InferredType::Datetime;
    }
    if ratio(looks_numeric) >= SHAPE_MAJORITY {
        if values.iter().filter(|v| looks_numeric(v)).all(|v| looks_integer(v)) {
            return InferredType::Integer;
        }
        return InferredType::Float;
    }
    InferredType::String
}

/// Type-appropriate sanity check, shared by the profiler (validity score)
/// and the rule executor (type-conformance predicate).
pub fn conforms_to_type(value: &FieldValue, ty: InferredType) -> bool {
    match ty {
        InferredType::Integer | InferredType::Float => value
            .as_f64()
            .map(|f| f.is_finite() && f.abs() < SANE_MAGNITUDE)
            .unwrap_or(false),
        InferredType::Boolean => looks_boolean(value),
        InferredType::Datetime => match value {
            FieldValue::Text(s) => parse_datetime(s.trim()).is_some(),
            _ => false,
        },
        InferredType::Uuid => looks_uuid(value),
        InferredType::String => match value {
            FieldValue::Text(s) => !s.trim().is_empty(),
            // A scalar that isn't text still renders to something displayable.
            FieldValue::Null => false,
            _ => true,
        },
    }
}

fn numeric_stats(values: &[&FieldValue]) -> Option<NumericStats> {
    let mut nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).filter(|f| f.is_finite()).collect();
    if nums.is_empty() {
        return None;
    }
    nums.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = nums.len();
    let min = nums[0];
    let max = nums[n - 1];
    let mean = nums.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        nums[n / 2]
    } else {
        (nums[n / 2 - 1] + nums[n / 2]) / 2.0
    };
    let variance = nums.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let stddev = variance.sqrt();

    // Mode: most frequent exact value; BTreeMap keeps the tie-break deterministic.
    let mut freq: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for x in &nums {
        let entry = freq.entry(x.to_string()).or_insert((*x, 0));
        entry.1 += 1;
    }
    let mode = freq
        .values()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| *value);

    Some(NumericStats {
        min,
        max,
        mean,
        median,
        stddev,
        mode,
    })
}

/// Scans all sampled rows for one column and computes its profile.
/// Pure and read-only, so column scans parallelize trivially.
pub fn profile_column(name: &str, rows: &[RawRow], max_sample_values: usize) -> ColumnProfile {
    let total_count = rows.len();
    let non_null: Vec<&FieldValue> = rows
        .iter()
        .filter_map(|row| row.get(name))
        .filter(|v| !v.is_null())
        .collect();
    let null_count = total_count - non_null.len();

    let inferred_type = infer_type(&non_null);

    let distinct: std::collections::BTreeSet<String> =
        non_null.iter().map(|v| v.render()).collect();
    let distinct_count = distinct.len();

    let completeness = if total_count == 0 {
        0.0
    } else {
        non_null.len() as f64 / total_count as f64
    };
    let uniqueness = if non_null.is_empty() {
        0.0
    } else {
        distinct_count as f64 / non_null.len() as f64
    };
    let validity = if non_null.is_empty() {
        0.0
    } else {
        non_null.iter().filter(|v| conforms_to_type(v, inferred_type)).count() as f64
            / non_null.len() as f64
    };

    let numeric_stats = match inferred_type {
        InferredType::Integer | InferredType::Float => numeric_stats(&non_null),
        _ => None,
    };

    let sample_values = distinct.into_iter().take(max_sample_values).collect();

    ColumnProfile {
        column: name.to_string(),
        inferred_type,
        total_count,
        null_count,
        distinct_count,
        completeness,
        uniqueness,
        validity,
        numeric_stats,
        sample_values,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rows_of(column: &str, values: Vec<FieldValue>) -> Vec<RawRow> {
        values
            .into_iter()
            .map(|v| {
                let mut row = RawRow::new();
                row.insert(column.to_string(), v);
                row
            })
            .collect()
    }

    #[test]
    fn test_infer_integer_vs_float() {
        let ints = vec![FieldValue::Integer(1), FieldValue::Integer(2)];
        let refs: Vec<&FieldValue> = ints.iter().collect();
        assert_eq!(infer_type(&refs), InferredType::Integer);

        let floats = vec![FieldValue::Float(1.5), FieldValue::Integer(2)];
        let refs: Vec<&FieldValue> = floats.iter().collect();
        assert_eq!(infer_type(&refs), InferredType::Float);
    }

    #[test]
    fn test_infer_datetime_and_uuid_beat_string() {
        let dates = vec![
            FieldValue::Text("2024-01-01".into()),
            FieldValue::Text("2024-06-15T10:30:00Z".into()),
        ];
        let refs: Vec<&FieldValue> = dates.iter().collect();
        assert_eq!(infer_type(&refs), InferredType::Datetime);

        let uuids = vec![
            FieldValue::Text("550e8400-e29b-41d4-a716-446655440000".into()),
            FieldValue::Text("550e8400-e29b-41d4-a716-446655440001".into()),
        ];
        let refs: Vec<&FieldValue> = uuids.iter().collect();
        assert_eq!(infer_type(&refs), InferredType::Uuid);
    }

    #[test]
    fn test_infer_mixed_shapes_fall_back_to_string() {
        let mixed = vec![
            FieldValue::Text("abc".into()),
            FieldValue::Integer(1),
            FieldValue::Text("def".into()),
        ];
        let refs: Vec<&FieldValue> = mixed.iter().collect();
        assert_eq!(infer_type(&refs), InferredType::String);
    }

    #[test]
    fn test_profile_column_null_partition() {
        // 100 rows, 20 null -> completeness 0.80
        let mut values = vec![FieldValue::Null; 20];
        for i in 0..80 {
            values.push(FieldValue::Integer(i));
        }
        let rows = rows_of("amount", values);
        let profile = profile_column("amount", &rows, 5);

        assert_eq!(profile.total_count, 100);
        assert_eq!(profile.null_count, 20);
        assert!((profile.completeness - 0.80).abs() < 1e-9);
        assert!((profile.uniqueness - 1.0).abs() < 1e-9);
        assert_eq!(profile.inferred_type, InferredType::Integer);
        assert_eq!(profile.sample_values.len(), 5);
    }

    #[test]
    fn test_numeric_stats_values() {
        let rows = rows_of(
            "x",
            vec![
                FieldValue::Integer(1),
                FieldValue::Integer(2),
                FieldValue::Integer(2),
                FieldValue::Integer(3),
            ],
        );
        let profile = profile_column("x", &rows, 5);
        let stats = profile.numeric_stats.unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
        assert!((stats.mean - 2.0).abs() < 1e-9);
        assert!((stats.median - 2.0).abs() < 1e-9);
        assert_eq!(stats.mode, Some(2.0));
        assert!((stats.stddev - (0.5f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_validity_flags_insane_magnitude() {
        let rows = rows_of(
            "x",
            vec![FieldValue::Float(1.0), FieldValue::Float(1e18)],
        );
        let profile = profile_column("x", &rows, 5);
        assert!((profile.validity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_datetime_layouts() {
        assert!(parse_datetime("2024-01-01").is_some());
        assert!(parse_datetime("2024-01-01T10:30:00Z").is_some());
        assert!(parse_datetime("2024-01-01 10:30:00").is_some());
        assert!(parse_datetime("not a date").is_none());
    }

    #[test]
    fn test_profile_missing_field_counts_as_null() {
        // Rows where the column is absent entirely
        let mut rows = rows_of("a", vec![FieldValue::Integer(1)]);
        rows.push(RawRow::new());
        let profile = profile_column("a", &rows, 5);
        assert_eq!(profile.total_count, 2);
        assert_eq!(profile.null_count, 1);
    }
}
