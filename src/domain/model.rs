use crate::utils::error::IngestionError;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single cell of an ingested table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell, used by the statistics stage.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Hashable identity used for distinct-value counting. Floats compare by
    /// bit pattern with every NaN folded onto one key.
    pub(crate) fn identity(&self) -> ValueKey<'_> {
        match self {
            Value::Missing => ValueKey::Missing,
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) if f.is_nan() => ValueKey::NaN,
            // -0.0 and 0.0 are the same value
            Value::Float(f) if *f == 0.0 => ValueKey::Float(0),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Text(s) => ValueKey::Text(s),
            Value::DateTime(dt) => ValueKey::DateTime(*dt),
        }
    }

    /// Text form used by the delimited-text writer. Missing cells become an
    /// empty field.
    pub fn to_field(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => write!(f, "NaN"),
            other => write!(f, "{}", other.to_field()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DateTime(dt) => dt.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey<'a> {
    Missing,
    NaN,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(&'a str),
    DateTime(NaiveDateTime),
}

/// Shortest round-trip representation that always keeps a decimal point or
/// exponent, so integral floats read back as floats (`3.0`, `1e-7`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    format!("{:?}", value)
}

/// Inferred semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    DateTime,
    /// Mixed or textual values.
    Text,
    /// No non-missing cell at all.
    Empty,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn dtype_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::DateTime => "datetime64[ns]",
            ColumnType::Text => "object",
            ColumnType::Empty => "empty",
        }
    }

    /// Bytes per cell for the in-memory footprint estimate. Text cells count
    /// the reference only.
    pub(crate) fn cell_width(self) -> usize {
        match self {
            ColumnType::Boolean => 1,
            _ => 8,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.missing_count()
    }
}

/// Immutable, column-oriented table produced by ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> std::result::Result<Self, IngestionError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(IngestionError::Malformed {
                message: format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    row_count
                ),
            });
        }
        Ok(Self { columns, row_count })
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.row_count, self.columns.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.dtype.is_numeric())
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    /// First `n` rows, used for the on-screen preview.
    pub fn head(&self, n: usize) -> Vec<Vec<&Value>> {
        self.rows().take(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new(
                "id",
                ColumnType::Integer,
                vec![Value::Int(1), Value::Int(2), Value::Missing],
            ),
            Column::new(
                "name",
                ColumnType::Text,
                vec![
                    Value::Text("أحمد".to_string()),
                    Value::Missing,
                    Value::Text("Sara".to_string()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_shape_and_rows() {
        let table = sample();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.row(0).unwrap(), vec![&Value::Int(1), &Value::Text("أحمد".to_string())]);
        assert!(table.row(3).is_none());
        assert_eq!(table.head(2).len(), 2);
        assert_eq!(table.head(10).len(), 3);
        assert_eq!(table.column_names(), vec!["id", "name"]);
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::new("a", ColumnType::Integer, vec![Value::Int(1)]),
            Column::new("b", ColumnType::Integer, vec![]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_float_keeps_decimal_point() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_value_identity_folds_nan_and_signed_zero() {
        assert_eq!(
            Value::Float(f64::NAN).identity(),
            Value::Float(-f64::NAN).identity()
        );
        assert_eq!(Value::Float(0.0).identity(), Value::Float(-0.0).identity());
        assert_ne!(Value::Missing.identity(), Value::Float(f64::NAN).identity());
    }

    #[test]
    fn test_value_serializes_missing_and_nan_as_null() {
        let values = vec![
            Value::Missing,
            Value::Float(f64::NAN),
            Value::Int(4),
            Value::Text("مرحبا".to_string()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,null,4,"مرحبا"]"#);
    }
}
