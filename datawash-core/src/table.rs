//! In-memory tabular dataset.
//!
//! Cells are `serde_json::Value`s, the same representation row samples use
//! when they arrive from JSON sources. `Null` is the only missing marker.
//! Tables are immutable once built; sampling produces new tables through
//! [`Table::take`].

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DataWashError, Result};

/// Declared type of a column, inferred from its non-null cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Every non-null cell is a JSON boolean
    Boolean,
    /// Every non-null cell is an integral JSON number
    Integer,
    /// Every non-null cell is a JSON number, at least one fractional
    Float,
    /// Every non-null cell is a JSON string
    String,
    /// Non-null cells of more than one kind, or nested values
    Mixed,
    /// No non-null cells at all
    Null,
}

impl DataType {
    /// Infers the declared type of a sequence of cells.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred = Self::Null;
        for value in values {
            let kind = match value {
                Value::Null => continue,
                Value::Bool(_) => Self::Boolean,
                Value::Number(n) if n.is_f64() => Self::Float,
                Value::Number(_) => Self::Integer,
                Value::String(_) => Self::String,
                Value::Array(_) | Value::Object(_) => return Self::Mixed,
            };
            inferred = match (inferred, kind) {
                (Self::Null, k) => k,
                (a, b) if a == b => a,
                (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
                _ => return Self::Mixed,
            };
        }
        inferred
    }

    /// True for integer and float columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// True for string columns; the string-based detectors only look at these.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Stable lowercase tag used in profiles and finding details.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Mixed => "mixed",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    data_type: DataType,
    values: Vec<Value>,
}

impl Column {
    /// Creates a column and infers its declared type.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let data_type = DataType::infer(&values);
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type tag
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// All cells in row order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the column has no cells
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over non-null cells in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }

    /// Iterates over `(row index, value)` pairs for non-null cells.
    pub fn enumerate_non_null(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.values.iter().enumerate().filter(|(_, v)| !v.is_null())
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Finite numeric view of the non-null cells, with row indices.
    ///
    /// Only JSON numbers are read; strings are not coerced.
    pub fn numeric_values(&self) -> Vec<(usize, f64)> {
        self.enumerate_non_null()
            .filter_map(|(i, v)| v.as_f64().filter(|x| x.is_finite()).map(|x| (i, x)))
            .collect()
    }
}

/// An immutable table of equally long, uniquely named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table from columns.
    ///
    /// # Errors
    /// Returns an invalid table error for duplicate column names or columns
    /// of differing lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name()) {
                return Err(DataWashError::invalid_table(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
            if column.len() != row_count {
                return Err(DataWashError::invalid_table(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    row_count
                )));
            }
        }
        Ok(Self { columns, row_count })
    }

    /// Builds a table from JSON object records.
    ///
    /// Columns appear in first-seen key order; keys missing from a record
    /// become nulls.
    ///
    /// # Errors
    /// Returns an invalid table error if any record is not a JSON object.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut known: HashSet<String> = HashSet::new();
        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                DataWashError::invalid_table(format!("record {index} is not a JSON object"))
            })?;
            for key in object.keys() {
                if known.insert(key.clone()) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|record| record.get(&name).cloned().unwrap_or(Value::Null))
                    .collect();
                Column::new(name, values)
            })
            .collect();

        Self::new(columns)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True if the table has no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Looks up a column by name, failing if it does not exist.
    ///
    /// # Errors
    /// Returns a column-not-found error.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| DataWashError::column_not_found(name))
    }

    /// True if any cell of the row is null.
    pub fn row_has_null(&self, row: usize) -> bool {
        self.columns
            .iter()
            .any(|c| c.values.get(row).is_some_and(Value::is_null))
    }

    /// Canonical key of a whole row, used for strict row equality.
    pub fn row_key(&self, row: usize) -> String {
        let mut key = String::new();
        for column in &self.columns {
            if let Some(value) = column.values.get(row) {
                key.push_str(&cell_key(value));
            }
            key.push('\u{1f}');
        }
        key
    }

    /// Returns a re-indexed table holding the given rows in the given order.
    ///
    /// Out-of-range indices are ignored.
    pub fn take(&self, rows: &[usize]) -> Self {
        let rows: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&r| r < self.row_count)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let values = rows.iter().map(|&r| column.values[r].clone()).collect();
                Column {
                    name: column.name.clone(),
                    // The declared type of the source column is kept even if
                    // the selected rows would infer something narrower.
                    data_type: column.data_type,
                    values,
                }
            })
            .collect();
        Self {
            columns,
            row_count: rows.len(),
        }
    }

    /// Rough in-memory footprint of the table in bytes.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.name.len() + c.values.iter().map(cell_size).sum::<usize>())
            .sum()
    }
}

/// Renders a cell the way value sets compare it: strings verbatim,
/// everything else as compact JSON.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical, type-preserving key for a cell (`1` and `"1"` differ).
pub fn cell_key(value: &Value) -> String {
    value.to_string()
}

fn cell_size(value: &Value) -> usize {
    const SLOT: usize = std::mem::size_of::<Value>();
    match value {
        Value::String(s) => SLOT + s.len(),
        Value::Array(_) | Value::Object(_) => SLOT + value.to_string().len(),
        _ => SLOT,
    }
}
