//! Descriptive statistics over numeric columns.

use crate::domain::model::{Column, Table};
use crate::domain::report::{ColumnStats, DescribeTable, Summary};

/// Linear interpolation between closest ranks at position `q * (n - 1)`.
/// `sorted` must be ascending and non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

pub fn column_stats(column: &Column) -> ColumnStats {
    let mut values: Vec<f64> = column
        .values
        .iter()
        .filter_map(|v| v.as_f64())
        .filter(|v| !v.is_nan())
        .collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    if count == 0 {
        return ColumnStats {
            column: column.name.clone(),
            count,
            mean: None,
            std: None,
            min: None,
            q25: None,
            q50: None,
            q75: None,
            max: None,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    ColumnStats {
        column: column.name.clone(),
        count,
        mean: Some(mean),
        std: sample_std(&values, mean),
        min: values.first().copied(),
        q25: Some(quantile(&values, 0.25)),
        q50: Some(quantile(&values, 0.5)),
        q75: Some(quantile(&values, 0.75)),
        max: values.last().copied(),
    }
}

/// Statistics for every numeric column, or [`Summary::NoNumericColumns`].
pub fn summarize(table: &Table) -> Summary {
    let columns: Vec<ColumnStats> = table.numeric_columns().map(column_stats).collect();
    if columns.is_empty() {
        tracing::debug!("No numeric columns to describe");
        return Summary::NoNumericColumns;
    }
    tracing::debug!(columns = columns.len(), "Numeric columns described");
    Summary::Stats(DescribeTable { columns })
}
