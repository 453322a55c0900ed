//! Re-encodes a table into a downloadable container. Values are written as
//! ingested; nothing is recomputed or reformatted beyond the container's
//! own encoding rules.

use crate::core::xlsx::write_workbook;
use crate::domain::export::{ExportFormat, ExportPayload};
use crate::domain::model::Table;
use crate::domain::ports::{Clock, ConfigProvider, SystemClock};
use crate::utils::error::Result;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub const DEFAULT_LABEL: &str = "data_analysis";
pub const DEFAULT_SHEET_NAME: &str = "البيانات";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 CSV with a byte-order mark so spreadsheet tools pick the right
/// encoding for right-to-left scripts.
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        if table.column_count() > 0 {
            writer.write_record(table.column_names())?;
        }
        for row in table.rows() {
            writer.write_record(row.iter().map(|v| v.to_field()))?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

struct Records<'a>(&'a Table);

struct Record<'a> {
    table: &'a Table,
    row: usize,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.row_count()))?;
        for row in 0..self.0.row_count() {
            seq.serialize_element(&Record { table: self.0, row })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for column in self.table.columns() {
            map.serialize_entry(&column.name, &column.values[self.row])?;
        }
        map.end()
    }
}

/// Array of records keyed by column name, in column order. Non-ASCII text is
/// written as-is.
pub fn to_json(table: &Table) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&Records(table))?)
}

/// Builds download payloads with timestamped filenames.
#[derive(Debug, Clone)]
pub struct Exporter<K: Clock = SystemClock> {
    label: String,
    sheet_name: String,
    clock: K,
}

impl Default for Exporter<SystemClock> {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            clock: SystemClock,
        }
    }
}

impl Exporter<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new()
            .with_label(config.export_label())
            .with_sheet_name(config.sheet_name())
    }
}

impl<K: Clock> Exporter<K> {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: &str) -> Self {
        self.sheet_name = sheet_name.to_string();
        self
    }

    pub fn with_clock<K2: Clock>(self, clock: K2) -> Exporter<K2> {
        Exporter {
            label: self.label,
            sheet_name: self.sheet_name,
            clock,
        }
    }

    pub fn export(&self, table: &Table, format: ExportFormat) -> Result<ExportPayload> {
        let bytes = match format {
            ExportFormat::Xlsx => write_workbook(table, &self.sheet_name)?,
            ExportFormat::Csv => to_csv(table)?,
            ExportFormat::Json => to_json(table)?,
        };
        let filename = format.filename(&self.label, self.clock.now());

        tracing::info!(
            format = %format,
            filename = %filename,
            bytes = bytes.len(),
            "Export ready"
        );

        Ok(ExportPayload {
            format,
            filename,
            content_type: format.content_type(),
            bytes,
        })
    }
}
