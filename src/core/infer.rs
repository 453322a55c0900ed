//! Column type inference.
//!
//! Delimited text arrives as strings and is typed here; spreadsheet cells
//! arrive already typed and only need their column tag unified.

use crate::domain::model::{Column, ColumnType, Value};

/// Tokens read as a missing cell in delimited text.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(raw: &str) -> bool {
    NA_TOKENS.contains(&raw)
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    // Rust accepts "inf"/"infinity"; only the spelled-out forms are numbers here
    match trimmed.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" => return Some(f64::INFINITY),
        "-inf" | "-infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Types one column of raw strings. Missing tokens become [`Value::Missing`].
pub fn infer_text_column(name: String, raw: Vec<String>) -> Column {
    let present: Vec<&str> = raw
        .iter()
        .map(String::as_str)
        .filter(|s| !is_na_token(s))
        .collect();

    let dtype = if present.is_empty() {
        ColumnType::Empty
    } else if present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.iter().all(|s| parse_float(s).is_some()) {
        ColumnType::Float
    } else if present.iter().all(|s| parse_bool(s.trim()).is_some()) {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    };

    let values = raw
        .into_iter()
        .map(|s| {
            if is_na_token(&s) {
                return Value::Missing;
            }
            match dtype {
                ColumnType::Integer => s.trim().parse().map(Value::Int).unwrap_or(Value::Missing),
                ColumnType::Float => parse_float(&s).map(Value::Float).unwrap_or(Value::Missing),
                ColumnType::Boolean => parse_bool(s.trim()).map(Value::Bool).unwrap_or(Value::Missing),
                _ => Value::Text(s),
            }
        })
        .collect();

    Column::new(name, dtype, values)
}

/// Unifies already-typed cells into a column tag.
///
/// An int/float mix widens to floats and any other mix is kept as-is under
/// [`ColumnType::Text`]. With `narrow_floats`, a float column whose values are
/// all integral becomes an integer column (spreadsheets store every number
/// as a float).
pub fn unify_typed_column(name: String, values: Vec<Value>, narrow_floats: bool) -> Column {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_bool = false;
    let mut has_text = false;
    let mut has_datetime = false;

    for value in &values {
        match value {
            Value::Missing => {}
            Value::Int(_) => has_int = true,
            Value::Float(_) => has_float = true,
            Value::Bool(_) => has_bool = true,
            Value::Text(_) => has_text = true,
            Value::DateTime(_) => has_datetime = true,
        }
    }

    let dtype = match (has_int, has_float, has_bool, has_text, has_datetime) {
        (false, false, false, false, false) => ColumnType::Empty,
        (_, _, false, false, false) if !has_float || (narrow_floats && all_integral(&values)) => ColumnType::Integer,
        (_, _, false, false, false) => ColumnType::Float,
        (false, false, true, false, false) => ColumnType::Boolean,
        (false, false, false, false, true) => ColumnType::DateTime,
        _ => ColumnType::Text,
    };

    let values = match dtype {
        ColumnType::Integer => values
            .into_iter()
            .map(|v| match v {
                Value::Float(f) => Value::Int(f as i64),
                other => other,
            })
            .collect(),
        ColumnType::Float => values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Value::Float(i as f64),
                other => other,
            })
            .collect(),
        _ => values,
    };

    Column::new(name, dtype, values)
}

fn all_integral(values: &[Value]) -> bool {
    values.iter().all(|v| match v {
        Value::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15,
        _ => true,
    })
}

/// Header names as read, with blanks replaced by `Unnamed: <index>` and
/// repeats suffixed `.1`, `.2`, ...
pub fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = Vec::new();
    for (index, name) in raw.into_iter().enumerate() {
        let name = name.as_ref();
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while names.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(candidate);
    }
    names
}
