//! Decoding of the service's JSON row encoding into [`ResultRow`]s.
//!
//! Rows arrive as `{"f": [{"v": <cell>}, ...]}` with one cell per schema
//! field. Scalars are always strings; `REPEATED` cells are arrays of
//! `{"v": ..}`; `RECORD` cells are nested `{"f": [..]}` objects.

use std::sync::Arc;

use base64::Engine;
use bqrun_core::FieldValue;
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ServiceError;
use crate::result::{FieldSchema, ResultRow, Schema};

/// Decode a page worth of raw rows against `schema`.
pub fn decode_rows(schema: &Arc<Schema>, rows: &[Value]) -> Result<Vec<ResultRow>, ServiceError> {
    rows.iter()
        .map(|row| {
            let values = decode_record(&schema.fields, row)?;
            Ok(ResultRow::new(Arc::clone(schema), values))
        })
        .collect()
}

/// Decode one `{"f": [..]}` object into values ordered like `fields`.
fn decode_record(fields: &[FieldSchema], record: &Value) -> Result<Vec<FieldValue>, ServiceError> {
    let cells = record
        .get("f")
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::Parse("row is missing its \"f\" cell list".into()))?;

    if cells.len() != fields.len() {
        return Err(ServiceError::Parse(format!(
            "row has {} cells but schema declares {} fields",
            cells.len(),
            fields.len()
        )));
    }

    fields
        .iter()
        .zip(cells)
        .map(|(field, cell)| decode_cell(field, cell.get("v").unwrap_or(&Value::Null)))
        .collect()
}

/// Decode the `v` payload of a single cell.
pub fn decode_cell(field: &FieldSchema, value: &Value) -> Result<FieldValue, ServiceError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }

    if field.is_repeated() {
        let items = value.as_array().ok_or_else(|| {
            ServiceError::Parse(format!("repeated field {} is not an array", field.name))
        })?;
        let values = items
            .iter()
            .map(|item| decode_single(field, item.get("v").unwrap_or(&Value::Null)))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(FieldValue::Repeated(values));
    }

    decode_single(field, value)
}

fn decode_single(field: &FieldSchema, value: &Value) -> Result<FieldValue, ServiceError> {
    if value.is_null() {
        return Ok(FieldValue::Null);
    }

    match field.field_type.to_uppercase().as_str() {
        "RECORD" | "STRUCT" => {
            let values = decode_record(&field.fields, value)?;
            let record: IndexMap<String, FieldValue> = field
                .fields
                .iter()
                .map(|f| f.name.clone())
                .zip(values)
                .collect();
            Ok(FieldValue::Record(record))
        }
        other => {
            let text = match value {
                Value::String(s) => s.clone(),
                // Emulators sometimes send bare JSON scalars.
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(ServiceError::Parse(format!(
                        "field {} expected a scalar, got {}",
                        field.name, value
                    )))
                }
            };
            Ok(parse_scalar(&text, other))
        }
    }
}

/// Parse a scalar string into a `FieldValue` based on the declared type.
///
/// Numeric, boolean, bytes and timestamp types fall back to `Text` when the
/// string does not parse.
pub fn parse_scalar(value: &str, field_type: &str) -> FieldValue {
    match field_type.to_uppercase().as_str() {
        "INTEGER" | "INT64" => value
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::Text(value.to_string())),
        "FLOAT" | "FLOAT64" => value
            .parse::<f64>()
            .map(FieldValue::Float)
            .unwrap_or_else(|_| FieldValue::Text(value.to_string())),
        "BOOLEAN" | "BOOL" => match value.to_lowercase().as_str() {
            "true" => FieldValue::Boolean(true),
            "false" => FieldValue::Boolean(false),
            _ => FieldValue::Text(value.to_string()),
        },
        "BYTES" => base64::engine::general_purpose::STANDARD
            .decode(value)
            .map(FieldValue::Bytes)
            .unwrap_or_else(|_| FieldValue::Text(value.to_string())),
        "TIMESTAMP" => parse_timestamp(value)
            .map(FieldValue::Timestamp)
            .unwrap_or_else(|| FieldValue::Text(value.to_string())),
        // NUMERIC/BIGNUMERIC stay textual to keep their full precision;
        // DATE, TIME, DATETIME, GEOGRAPHY, JSON and INTERVAL are textual too.
        _ => FieldValue::Text(value.to_string()),
    }
}

/// Parse a TIMESTAMP cell.
///
/// The service sends epoch seconds as a float string (`"1.7149536E9"`,
/// `"1714953600.123456"`). RFC3339 and `"%Y-%m-%d %H:%M:%S"` are accepted
/// as well. Returns `None` if every format fails.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(secs) = value.parse::<f64>() {
        if !secs.is_finite() {
            return None;
        }
        let micros = (secs * 1_000_000.0).round() as i64;
        return DateTime::from_timestamp_micros(micros);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }

    None
}
