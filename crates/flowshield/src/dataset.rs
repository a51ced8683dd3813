//! In-memory dataset snapshot and cell value types.

use serde::{Deserialize, Serialize};

/// A single typed cell value.
///
/// `Float(f64::NAN)` is treated as a missing value, matching how numeric
/// telemetry exports commonly encode gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Whole number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Text value (categorical columns).
    Text(String),
}

impl Value {
    /// Returns true if this value is missing (null or NaN).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of this value.
    ///
    /// Integers and finite floats convert directly; text converts when it
    /// parses as a number. Missing values yield `None`.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// A materialized snapshot of tabular feature data.
///
/// The repair engine never mutates the snapshot it is given; it clones the
/// snapshot and returns a new one, so the original stays available for audit
/// diffing and concurrent validation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names, in declaration order.
    pub columns: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create a new dataset snapshot.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Get a cell value by column name.
    pub fn get_named(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.get(row, col)
    }

    /// Set a specific cell value.
    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        if let Some(r) = self.rows.get_mut(row) {
            if let Some(cell) = r.get_mut(col) {
                *cell = value;
            }
        }
    }

    /// Borrow one row as a named view for rule evaluation.
    pub fn row(&self, index: usize) -> RowView<'_> {
        RowView {
            dataset: self,
            index,
        }
    }
}

/// A read-only view of one dataset row, addressable by column name.
///
/// Relation rules evaluate against this view, which keeps them pure
/// functions of row state plus schema.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> RowView<'a> {
    /// Row index within the dataset.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Get a cell value by column name.
    pub fn value(&self, column: &str) -> Option<&'a Value> {
        self.dataset.get_named(self.index, column)
    }

    /// Get a numeric cell value by column name.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.value(column).and_then(Value::numeric)
    }
}
