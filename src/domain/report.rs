use crate::domain::model::ColumnType;
use crate::utils::error::{PipelineError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Shape and null/unique-count summary of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub row_count: usize,
    pub column_count: usize,
    pub numeric_column_count: usize,
    pub total_missing_count: usize,
    /// `(column, missing cells)` in column order.
    #[serde(serialize_with = "pairs_as_map")]
    pub per_column_missing_count: Vec<(String, usize)>,
    /// `(column, distinct values)` in column order, missing counted once.
    #[serde(serialize_with = "pairs_as_map")]
    pub per_column_unique_count: Vec<(String, usize)>,
}

impl Profile {
    pub fn missing_count(&self, column: &str) -> Option<usize> {
        lookup(&self.per_column_missing_count, column)
    }

    pub fn unique_count(&self, column: &str) -> Option<usize> {
        lookup(&self.per_column_unique_count, column)
    }
}

fn pairs_as_map<S: Serializer>(
    pairs: &[(String, usize)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (name, n) in pairs {
        map.serialize_entry(name, n)?;
    }
    map.end()
}

fn lookup(pairs: &[(String, usize)], column: &str) -> Option<usize> {
    pairs.iter().find(|(name, _)| name == column).map(|(_, n)| *n)
}

/// Row labels of the descriptive statistics table, in display order.
pub const STAT_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Descriptive statistics of one numeric column. Everything except `count`
/// is `None` when the column holds no usable values; `std` is also `None`
/// below two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    /// Value for one of [`STAT_LABELS`].
    pub fn stat(&self, label: &str) -> Option<f64> {
        match label {
            "count" => Some(self.count as f64),
            "mean" => self.mean,
            "std" => self.std,
            "min" => self.min,
            "25%" => self.q25,
            "50%" => self.q50,
            "75%" => self.q75,
            "max" => self.max,
            _ => None,
        }
    }
}

/// One column of statistics per numeric source column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeTable {
    pub columns: Vec<ColumnStats>,
}

impl DescribeTable {
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Outcome of summarization. Callers must branch on the empty case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoNumericColumns,
    Stats(DescribeTable),
}

impl Summary {
    pub fn stats(&self) -> Option<&DescribeTable> {
        match self {
            Summary::Stats(table) => Some(table),
            Summary::NoNumericColumns => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub index: usize,
    pub name: String,
    pub non_null_count: usize,
    pub dtype: ColumnType,
}

/// Per-column overview in the spirit of a dataframe `info()` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
    /// `(dtype, number of columns)` in first-seen order.
    pub dtype_counts: Vec<(ColumnType, usize)>,
    pub memory_usage_bytes: usize,
    /// True when text columns make the memory figure a lower bound.
    pub memory_is_lower_bound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingEntry {
    pub column: String,
    pub missing_count: usize,
    pub missing_percent: f64,
}

/// Columns with at least one missing cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingReport {
    pub total_missing_count: usize,
    pub entries: Vec<MissingEntry>,
}

impl MissingReport {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Headline numbers of the quick analysis mode.
///
/// `mean_unique_count` is the rounded mean of the per-column distinct counts,
/// missing cells left out, and is reported as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickAnalysis {
    pub mean_unique_count: u64,
    pub row_count: usize,
    pub column_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    GeneralInfo,
    Descriptive,
    MissingValues,
    Quick,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::GeneralInfo,
        AnalysisKind::Descriptive,
        AnalysisKind::MissingValues,
        AnalysisKind::Quick,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::GeneralInfo => "info",
            AnalysisKind::Descriptive => "describe",
            AnalysisKind::MissingValues => "missing",
            AnalysisKind::Quick => "quick",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" | "general" | "general-info" => Ok(AnalysisKind::GeneralInfo),
            "describe" | "stats" | "descriptive" => Ok(AnalysisKind::Descriptive),
            "missing" | "missing-values" => Ok(AnalysisKind::MissingValues),
            "quick" => Ok(AnalysisKind::Quick),
            _ => Err(PipelineError::InvalidSelector {
                kind: "analysis",
                value: s.to_string(),
                expected: "info, describe, missing, quick".to_string(),
            }),
        }
    }
}

/// Result of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    GeneralInfo(TableInfo),
    Descriptive(Summary),
    MissingValues(MissingReport),
    Quick(QuickAnalysis),
}

impl Report {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Report::GeneralInfo(_) => AnalysisKind::GeneralInfo,
            Report::Descriptive(_) => AnalysisKind::Descriptive,
            Report::MissingValues(_) => AnalysisKind::MissingValues,
            Report::Quick(_) => AnalysisKind::Quick,
        }
    }
}
