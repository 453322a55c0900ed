use crate::domain::model::{Column, Table, ValueKey};
use crate::domain::report::Profile;
use std::collections::HashSet;

/// Distinct values in a column; every missing cell shares one value.
pub fn unique_count(column: &Column) -> usize {
    column
        .values
        .iter()
        .map(|v| v.identity())
        .collect::<HashSet<_>>()
        .len()
}

/// Distinct values in a column, leaving out missing cells and NaN.
pub fn distinct_present_count(column: &Column) -> usize {
    column
        .values
        .iter()
        .map(|v| v.identity())
        .filter(|key| !matches!(key, ValueKey::Missing | ValueKey::NaN))
        .collect::<HashSet<_>>()
        .len()
}

pub fn profile(table: &Table) -> Profile {
    let per_column_missing_count: Vec<(String, usize)> = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.missing_count()))
        .collect();

    let per_column_unique_count = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), unique_count(c)))
        .collect();

    let profile = Profile {
        row_count: table.row_count(),
        column_count: table.column_count(),
        numeric_column_count: table.numeric_columns().count(),
        total_missing_count: per_column_missing_count.iter().map(|(_, n)| n).sum(),
        per_column_missing_count,
        per_column_unique_count,
    };

    tracing::debug!(
        rows = profile.row_count,
        columns = profile.column_count,
        numeric = profile.numeric_column_count,
        missing = profile.total_missing_count,
        "Table profiled"
    );
    profile
}
