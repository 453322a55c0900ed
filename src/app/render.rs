use crate::app::session::Preview;
use crate::domain::report::{
    DescribeTable, MissingReport, Profile, QuickAnalysis, Report, Summary, TableInfo, STAT_LABELS,
};
use std::fmt::Write;

/// Left-aligned text grid with a dashed rule under the header.
fn grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", line(&rule[..]));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.as_slice()));
    }
    out
}

fn stat_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "NaN".to_string(),
    }
}

pub fn render_profile(file_name: &str, profile: &Profile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}", file_name);
    let _ = writeln!(
        out,
        "Rows: {}  Columns: {}",
        profile.row_count, profile.column_count
    );
    let _ = writeln!(out, "Numeric columns: {}", profile.numeric_column_count);
    let _ = writeln!(out, "Missing values: {}", profile.total_missing_count);
    out
}

pub fn render_preview(preview: &Preview) -> String {
    let rows: Vec<Vec<String>> = preview
        .rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();
    grid(&preview.columns, &rows)
}

pub fn render_info(info: &TableInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RangeIndex: {} entries", info.row_count);
    let _ = writeln!(out, "Data columns (total {} columns):", info.column_count);

    let headers = ["#", "Column", "Non-Null Count", "Dtype"].map(String::from);
    let rows: Vec<Vec<String>> = info
        .columns
        .iter()
        .map(|c| {
            vec![
                c.index.to_string(),
                c.name.clone(),
                format!("{} non-null", c.non_null_count),
                c.dtype.dtype_name().to_string(),
            ]
        })
        .collect();
    out.push_str(&grid(&headers, &rows));

    let dtypes: Vec<String> = info
        .dtype_counts
        .iter()
        .map(|(dtype, n)| format!("{}({})", dtype.dtype_name(), n))
        .collect();
    let _ = writeln!(out, "dtypes: {}", dtypes.join(", "));
    let _ = writeln!(
        out,
        "memory usage: {:.1}{} bytes",
        info.memory_usage_bytes as f64,
        if info.memory_is_lower_bound { "+" } else { "" }
    );
    out
}

pub fn render_describe(table: &DescribeTable) -> String {
    let headers: Vec<String> = std::iter::once(String::new())
        .chain(table.columns.iter().map(|c| c.column.clone()))
        .collect();
    let rows: Vec<Vec<String>> = STAT_LABELS
        .iter()
        .map(|label| {
            std::iter::once(label.to_string())
                .chain(table.columns.iter().map(|c| stat_cell(c.stat(label))))
                .collect()
        })
        .collect();
    grid(&headers, &rows)
}

pub fn render_summary(summary: &Summary) -> String {
    match summary {
        Summary::Stats(table) => render_describe(table),
        Summary::NoNumericColumns => "No numeric columns to summarize.\n".to_string(),
    }
}

pub fn render_missing(report: &MissingReport) -> String {
    if report.is_clean() {
        return "No missing values.\n".to_string();
    }
    let headers = ["Column", "Missing", "Percent"].map(String::from);
    let rows: Vec<Vec<String>> = report
        .entries
        .iter()
        .map(|e| {
            vec![
                e.column.clone(),
                e.missing_count.to_string(),
                format!("{:.2}%", e.missing_percent),
            ]
        })
        .collect();
    let mut out = grid(&headers, &rows);
    let _ = writeln!(out, "Total missing: {}", report.total_missing_count);
    out
}

pub fn render_quick(quick: &QuickAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mean unique values per column: {}", quick.mean_unique_count);
    let _ = writeln!(out, "Rows: {}", quick.row_count);
    let _ = writeln!(out, "Columns: {}", quick.column_count);
    out
}

pub fn render_report(report: &Report) -> String {
    match report {
        Report::GeneralInfo(info) => render_info(info),
        Report::Descriptive(summary) => render_summary(summary),
        Report::MissingValues(missing) => render_missing(missing),
        Report::Quick(quick) => render_quick(quick),
    }
}
