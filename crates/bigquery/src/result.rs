use std::sync::Arc;

use bqrun_core::FieldValue;
use serde::{Deserialize, Serialize};

/// Column definition as declared by the query's projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// Service type name (e.g. "STRING", "INTEGER", "RECORD").
    #[serde(rename = "type")]
    pub field_type: String,
    /// "NULLABLE", "REQUIRED" or "REPEATED". Absent means nullable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Sub-fields of a RECORD column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            mode: None,
            fields: Vec::new(),
        }
    }

    pub fn is_repeated(&self) -> bool {
        self.mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("REPEATED"))
    }
}

/// Ordered column list of a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    /// Zero-based index of a column by name (case-sensitive).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One result row: values in column order, sharing the page's schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl ResultRow {
    pub fn new(schema: Arc<Schema>, values: Vec<FieldValue>) -> Self {
        Self { schema, values }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Value of the named column, `None` if no such column exists.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let idx = self.schema.index_of(name)?;
        self.values.get(idx)
    }

    pub fn get_index(&self, idx: usize) -> Option<&FieldValue> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(column name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.schema
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }
}

/// One page of results as returned by a single fetch call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub schema: Arc<Schema>,
    pub rows: Vec<ResultRow>,
    /// Token for the next page; `None` on the last page.
    pub page_token: Option<String>,
    /// Total rows in the whole result set, when the service reports it.
    pub total_rows: Option<u64>,
}

impl ResultPage {
    /// Build a page from raw value rows, all bound to `schema`.
    pub fn from_values(
        schema: Arc<Schema>,
        rows: Vec<Vec<FieldValue>>,
        page_token: Option<String>,
    ) -> Self {
        let rows = rows
            .into_iter()
            .map(|values| ResultRow::new(Arc::clone(&schema), values))
            .collect();
        Self {
            schema,
            rows,
            page_token,
            total_rows: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page_token.is_none()
    }
}
