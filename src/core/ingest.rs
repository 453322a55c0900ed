//! Upload ingestion: file name + bytes → [`Table`].

use crate::core::infer::{infer_text_column, is_na_token, normalize_headers, unify_typed_column};
use crate::domain::model::{Table, Value};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::IngestionError;
use calamine::{Data, DataType, Range, Reader, Xls, Xlsx};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

type IngestResult<T> = std::result::Result<T, IngestionError>;

/// Container family, decided from the declared file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    DelimitedText,
    LegacySpreadsheet,
    ModernSpreadsheet,
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" => Some(SourceKind::DelimitedText),
            "xls" => Some(SourceKind::LegacySpreadsheet),
            "xlsx" => Some(SourceKind::ModernSpreadsheet),
            _ => None,
        }
    }
}

/// Validates an upload against the allow-list and size limit, then parses it.
#[derive(Debug, Clone)]
pub struct Ingestor {
    allowed_extensions: Vec<String>,
    max_upload_bytes: usize,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new()
            .with_allowed_extensions(config.allowed_extensions())
            .with_max_upload_mb(config.max_upload_mb())
    }

    /// Restricts the allow-list. Extensions the readers do not understand are
    /// dropped.
    pub fn with_allowed_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.allowed_extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| SourceKind::from_extension(e).is_some())
            .collect();
        self
    }

    pub fn with_max_upload_mb(mut self, mb: usize) -> Self {
        self.max_upload_bytes = mb.saturating_mul(1024).saturating_mul(1024);
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Resolves the reader for `file_name`, failing before any parsing when
    /// the extension is not allowed.
    pub fn source_kind(&self, file_name: &str) -> IngestResult<SourceKind> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(IngestionError::UnsupportedExtension {
                extension: if extension.is_empty() {
                    "<none>".to_string()
                } else {
                    extension
                },
                allowed: self.allowed_extensions.join(", "),
            });
        }

        SourceKind::from_extension(&extension).ok_or_else(|| IngestionError::UnsupportedExtension {
            extension,
            allowed: self.allowed_extensions.join(", "),
        })
    }

    pub fn ingest(&self, file_name: &str, bytes: &[u8]) -> IngestResult<Table> {
        let kind = self.source_kind(file_name)?;

        if bytes.len() > self.max_upload_bytes {
            return Err(IngestionError::TooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
                limit_mb: self.max_upload_bytes / (1024 * 1024),
            });
        }

        tracing::debug!(file = file_name, bytes = bytes.len(), ?kind, "Ingesting upload");

        let table = match kind {
            SourceKind::DelimitedText => read_csv(bytes)?,
            SourceKind::ModernSpreadsheet => read_xlsx(bytes)?,
            SourceKind::LegacySpreadsheet => read_xls(bytes)?,
        };

        tracing::info!(
            file = file_name,
            rows = table.row_count(),
            columns = table.column_count(),
            "Upload ingested"
        );
        Ok(table)
    }
}

/// Decodes text input. A UTF-8 BOM is stripped; a UTF-16 BOM switches the
/// decoder. Malformed sequences are an error rather than replaced.
fn decode_text(bytes: &[u8]) -> IngestResult<Cow<'_, str>> {
    let (text, encoding, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if had_errors {
        let detail = match std::str::from_utf8(bytes) {
            Err(e) if encoding == encoding_rs::UTF_8 => e.to_string(),
            _ => format!("invalid {} byte sequence", encoding.name()),
        };
        return Err(IngestionError::Encoding { message: detail });
    }
    if encoding != encoding_rs::UTF_8 {
        tracing::debug!(encoding = encoding.name(), "Decoded text using byte-order mark");
    }
    Ok(text)
}

/// Parses delimited text with a header row.
pub fn read_csv(bytes: &[u8]) -> IngestResult<Table> {
    let text = decode_text(bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => {
            return Err(IngestionError::Malformed {
                message: "No columns to parse from file".to_string(),
            })
        }
    };
    let names = normalize_headers(header.iter());
    let width = names.len();

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
    for record in records {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() && width > 1 {
            continue;
        }
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(IngestionError::Malformed {
                message: format!(
                    "Expected {} fields in line {}, saw {}",
                    width,
                    line,
                    record.len()
                ),
            });
        }
        for (index, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(index).unwrap_or("").to_string());
        }
    }

    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_text_column(name, cells))
        .collect();
    Table::new(columns)
}

pub fn read_xlsx(bytes: &[u8]) -> IngestResult<Table> {
    let workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(spreadsheet_error)?;
    read_workbook(workbook)
}

pub fn read_xls(bytes: &[u8]) -> IngestResult<Table> {
    let workbook: Xls<_> = Xls::new(Cursor::new(bytes)).map_err(spreadsheet_error)?;
    read_workbook(workbook)
}

fn spreadsheet_error<E: std::fmt::Display>(e: E) -> IngestionError {
    IngestionError::Spreadsheet {
        message: e.to_string(),
    }
}

/// First worksheet only, first row as header.
fn read_workbook<'a, R>(mut workbook: R) -> IngestResult<Table>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestionError::Spreadsheet {
            message: "workbook has no worksheets".to_string(),
        })?
        .map_err(spreadsheet_error)?;

    table_from_range(&range)
}

fn table_from_range(range: &Range<Data>) -> IngestResult<Table> {
    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(Table::empty()),
    };
    let names = normalize_headers(header.iter().map(|cell| match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }));

    let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(range.height()); names.len()];
    for row in rows {
        for (index, column) in cells.iter_mut().enumerate() {
            column.push(row.get(index).map(cell_value).unwrap_or(Value::Missing));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, values)| unify_typed_column(name, values, true))
        .collect();
    Table::new(columns)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Missing,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => Value::Float(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if is_na_token(s) => Value::Missing,
        Data::String(s) => Value::Text(s.clone()),
        other => other
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::Text(other.to_string())),
    }
}

impl Table {
    /// Reads an array of JSON objects, the layout the structured-record
    /// export writes. Key order of first appearance gives column order.
    pub fn from_json_records(bytes: &[u8]) -> IngestResult<Table> {
        let text = decode_text(bytes)?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(&text)?;

        let mut names: Vec<&String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|record| json_value(record.get(name.as_str())))
                    .collect();
                unify_typed_column(name.clone(), values, false)
            })
            .collect();
        Table::new(columns)
    }
}

fn json_value(value: Option<&serde_json::Value>) -> Value {
    match value {
        None | Some(serde_json::Value::Null) => Value::Missing,
        Some(serde_json::Value::Bool(b)) => Value::Bool(*b),
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) if !n.is_f64() => Value::Int(i),
            _ => n.as_f64().map(Value::Float).unwrap_or(Value::Missing),
        },
        Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
        Some(other) => Value::Text(other.to_string()),
    }
}
