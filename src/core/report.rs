//! Analysis reports built from the profiling and statistics stages.

use crate::core::describe::summarize;
use crate::core::profile::{distinct_present_count, profile};
use crate::domain::model::{ColumnType, Table};
use crate::domain::report::{
    AnalysisKind, ColumnInfo, MissingEntry, MissingReport, QuickAnalysis, Report, TableInfo,
};

pub fn analyze(table: &Table, kind: AnalysisKind) -> Report {
    match kind {
        AnalysisKind::GeneralInfo => Report::GeneralInfo(table_info(table)),
        AnalysisKind::Descriptive => Report::Descriptive(summarize(table)),
        AnalysisKind::MissingValues => Report::MissingValues(missing_report(table)),
        AnalysisKind::Quick => Report::Quick(quick_analysis(table)),
    }
}

pub fn table_info(table: &Table) -> TableInfo {
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, c)| ColumnInfo {
            index,
            name: c.name.clone(),
            non_null_count: c.non_null_count(),
            dtype: c.dtype,
        })
        .collect();

    let mut dtype_counts: Vec<(ColumnType, usize)> = Vec::new();
    for column in table.columns() {
        match dtype_counts.iter_mut().find(|(dtype, _)| *dtype == column.dtype) {
            Some((_, n)) => *n += 1,
            None => dtype_counts.push((column.dtype, 1)),
        }
    }

    let memory_usage_bytes = table
        .columns()
        .iter()
        .map(|c| c.dtype.cell_width() * c.len())
        .sum();

    TableInfo {
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns,
        dtype_counts,
        memory_usage_bytes,
        memory_is_lower_bound: table.columns().iter().any(|c| c.dtype == ColumnType::Text),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn missing_report(table: &Table) -> MissingReport {
    let profile = profile(table);
    let rows = table.row_count();

    let entries = profile
        .per_column_missing_count
        .into_iter()
        .filter(|(_, missing)| *missing > 0)
        .map(|(column, missing_count)| MissingEntry {
            column,
            missing_count,
            missing_percent: if rows == 0 {
                0.0
            } else {
                round2(missing_count as f64 / rows as f64 * 100.0)
            },
        })
        .collect();

    MissingReport {
        total_missing_count: profile.total_missing_count,
        entries,
    }
}

/// Mean of per-column distinct non-missing counts, rounded half-to-even,
/// alongside the table shape.
pub fn quick_analysis(table: &Table) -> QuickAnalysis {
    let counts: Vec<usize> = table.columns().iter().map(distinct_present_count).collect();
    let mean_unique_count = if counts.is_empty() {
        0
    } else {
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        mean.round_ties_even() as u64
    };

    QuickAnalysis {
        mean_unique_count,
        row_count: table.row_count(),
        column_count: table.column_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Column, Value};
    use crate::domain::report::Summary;

    fn table() -> Table {
        Table::new(vec![
            Column::new(
                "id",
                ColumnType::Integer,
                vec![Value::Int(1), Value::Int(2), Value::Int(3)],
            ),
            Column::new(
                "note",
                ColumnType::Text,
                vec![
                    Value::Text("ok".to_string()),
                    Value::Missing,
                    Value::Text("ok".to_string()),
                ],
            ),
            Column::new(
                "flag",
                ColumnType::Boolean,
                vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_info() {
        let info = table_info(&table());
        assert_eq!(info.row_count, 3);
        assert_eq!(info.columns[1].name, "note");
        assert_eq!(info.columns[1].non_null_count, 2);
        assert_eq!(
            info.dtype_counts,
            vec![
                (ColumnType::Integer, 1),
                (ColumnType::Text, 1),
                (ColumnType::Boolean, 1)
            ]
        );
        assert_eq!(info.memory_usage_bytes, 3 * 8 + 3 * 8 + 3);
        assert!(info.memory_is_lower_bound);
    }

    #[test]
    fn test_missing_report_lists_only_incomplete_columns() {
        let report = missing_report(&table());
        assert_eq!(report.total_missing_count, 1);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].column, "note");
        assert_eq!(report.entries[0].missing_percent, 33.33);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_missing_report_clean_table() {
        let table = Table::new(vec![Column::new("a", ColumnType::Integer, vec![Value::Int(1)])]).unwrap();
        assert!(missing_report(&table).is_clean());
        assert!(missing_report(&Table::empty()).is_clean());
    }

    #[test]
    fn test_quick_analysis_rounds_mean_unique() {
        // distinct present values: id 3, note 1, flag 2 -> 6/3 = 2
        let quick = quick_analysis(&table());
        assert_eq!(quick.mean_unique_count, 2);
        assert_eq!((quick.row_count, quick.column_count), (3, 3));

        // a: {1}, b: {x} once missing is left out -> 1
        let sparse = crate::core::ingest::read_csv(b"a,b\n1,\n1,\n1,x\n").unwrap();
        assert_eq!(quick_analysis(&sparse).mean_unique_count, 1);

        let empty = quick_analysis(&Table::empty());
        assert_eq!(empty.mean_unique_count, 0);
    }

    #[test]
    fn test_analyze_dispatch() {
        let table = table();
        for kind in AnalysisKind::ALL {
            assert_eq!(analyze(&table, kind).kind(), kind);
        }
        match analyze(&table, AnalysisKind::Descriptive) {
            Report::Descriptive(Summary::Stats(stats)) => assert_eq!(stats.columns.len(), 1),
            other => panic!("unexpected report: {:?}", other),
        }
    }
}
