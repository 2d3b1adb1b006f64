use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Typed field values decoded from a query result cell.
///
/// The warehouse ships every scalar as a string; the declared column type
/// decides which variant a cell becomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    /// Values of a `REPEATED` column, in service order.
    Repeated(Vec<FieldValue>),
    /// A `RECORD` / `STRUCT` cell keyed by sub-field name, in schema order.
    Record(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Extract as string, returning None for anything but `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers widen to `f64` so callers can read numeric columns uniformly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Repeated(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Look up a sub-field of a `Record` value.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Record(fields) => fields.get(name),
            _ => None,
        }
    }
}
