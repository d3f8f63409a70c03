//! Minimal tabular input interface.
//!
//! The embedder does not care where records come from; callers adapt their
//! storage at the edge by implementing [`Table`]. A small columnar
//! [`DataTable`] ships for the common cases (literal rows in tests, JSON
//! record arrays from upstream services).

use serde_json::Value;

use features::FeatureError;

use crate::error::EmbedderError;

/// Read-only view over tabular records.
///
/// Cells are optional text: `None` models missing data and extractors treat
/// it as an empty value.
pub trait Table {
    /// Number of rows.
    fn len(&self) -> usize;

    /// Column names, in order.
    fn columns(&self) -> &[String];

    /// Cell value at `(row, column)`; `None` when missing or the column is
    /// unknown.
    fn value(&self, row: usize, column: &str) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned columnar table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl DataTable {
    /// Empty table with the given column names.
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build from column names plus row-major cells.
    pub fn from_rows<S: Into<String>>(
        columns: Vec<S>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Result<Self, EmbedderError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Append one row; the cell count must match the column count.
    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<(), EmbedderError> {
        if row.len() != self.columns.len() {
            return Err(EmbedderError::TableShape {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Build from an array of JSON objects. Columns are the union of the
    /// record keys in JSON map order (lexicographic). Scalars coerce to
    /// text; nested arrays or objects are rejected as
    /// [`FeatureError::InvalidFieldValue`].
    pub fn from_json_records(records: &[Value]) -> Result<Self, EmbedderError> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let mut table = Self::new(columns.clone());
        for record in records {
            let Value::Object(map) = record else {
                return Err(FeatureError::InvalidFieldValue {
                    column: "<record>".into(),
                    found: short_value(record),
                }
                .into());
            };
            let mut row = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = match map.get(column) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    Some(Value::Bool(b)) => Some(b.to_string()),
                    Some(other) => {
                        return Err(FeatureError::InvalidFieldValue {
                            column: column.clone(),
                            found: short_value(other),
                        }
                        .into());
                    }
                };
                row.push(cell);
            }
            table.push_row(row)?;
        }
        Ok(table)
    }
}

fn short_value(value: &Value) -> String {
    match value {
        Value::Array(_) => "array".into(),
        Value::Object(_) => "object".into(),
        other => other.to_string(),
    }
}

impl Table for DataTable {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}
