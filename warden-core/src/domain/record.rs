// warden-core/src/domain/record.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// One scalar cell of a raw row.
///
/// Raw records arrive loosely typed; modeling them as a closed union (rather
/// than an untyped map of JSON values) keeps type inference in the profiler
/// exhaustive: a `match` on `FieldValue` covers every shape a cell can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A raw dataset row: field name -> scalar value.
/// BTreeMap keeps field iteration deterministic across runs.
pub type RawRow = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Canonical textual form, used for distinct counting and sample values.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Converts an arbitrary JSON scalar. Nested arrays/objects are flattened
    /// to their JSON text; the profiler treats them as opaque strings.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// Builds a `RawRow` from a JSON value. The value must be an object;
/// anything else is an `INVALID_DATA_FORMAT` hard stop.
pub fn row_from_json(dataset_id: &str, value: &serde_json::Value) -> Result<RawRow, DomainError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DomainError::InvalidDataFormat {
            dataset_id: dataset_id.to_string(),
            detail: format!("expected a record (JSON object), got {value}"),
        })?;

    Ok(obj
        .iter()
        .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
        .collect())
}
