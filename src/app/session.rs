use crate::core::export::Exporter;
use crate::core::ingest::Ingestor;
use crate::core::{describe, profile, report};
use crate::domain::export::{ExportFormat, ExportPayload};
use crate::domain::model::{Table, Value};
use crate::domain::ports::{Clock, ConfigProvider, SystemClock};
use crate::domain::report::{AnalysisKind, Profile, Report, Summary};
use crate::utils::error::{PipelineError, Result};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Empty,
    Ingested {
        file_name: String,
        table: Arc<Table>,
    },
    Failed {
        file_name: String,
        message: String,
    },
}

/// First rows of a table, as shown next to the profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// One user's walk through upload, analysis and export.
///
/// A new upload always replaces the previous table, successful or not.
pub struct Session<K: Clock = SystemClock> {
    ingestor: Ingestor,
    exporter: Exporter<K>,
    preview_rows: usize,
    state: SessionState,
}

impl Session<SystemClock> {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            ingestor: Ingestor::from_config(config),
            exporter: Exporter::from_config(config),
            preview_rows: config.preview_rows(),
            state: SessionState::Empty,
        }
    }
}

impl<K: Clock> Session<K> {
    pub fn with_clock<K2: Clock>(self, clock: K2) -> Session<K2> {
        Session {
            ingestor: self.ingestor,
            exporter: self.exporter.with_clock(clock),
            preview_rows: self.preview_rows,
            state: self.state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Empty => None,
            SessionState::Ingested { file_name, .. } | SessionState::Failed { file_name, .. } => {
                Some(file_name)
            }
        }
    }

    /// Ingests `bytes` and makes the result the current table. On failure
    /// the previous table is dropped and the error is returned.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<Arc<Table>> {
        match self.ingestor.ingest(file_name, bytes) {
            Ok(table) => {
                let table = Arc::new(table);
                self.state = SessionState::Ingested {
                    file_name: file_name.to_string(),
                    table: Arc::clone(&table),
                };
                Ok(table)
            }
            Err(e) => {
                tracing::warn!(file_name, error = %e, "Upload rejected");
                self.state = SessionState::Failed {
                    file_name: file_name.to_string(),
                    message: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    pub fn table(&self) -> Result<&Arc<Table>> {
        match &self.state {
            SessionState::Ingested { table, .. } => Ok(table),
            _ => Err(PipelineError::NoTable),
        }
    }

    pub fn profile(&self) -> Result<Profile> {
        Ok(profile::profile(self.table()?))
    }

    pub fn preview(&self) -> Result<Preview> {
        let table = self.table()?;
        Ok(Preview {
            columns: table.column_names().into_iter().map(String::from).collect(),
            rows: table
                .head(self.preview_rows)
                .into_iter()
                .map(|row| row.into_iter().cloned().collect())
                .collect(),
        })
    }

    pub fn summarize(&self) -> Result<Summary> {
        Ok(describe::summarize(self.table()?))
    }

    pub fn analyze(&self, kind: AnalysisKind) -> Result<Report> {
        Ok(report::analyze(self.table()?, kind))
    }

    pub fn export(&self, format: ExportFormat) -> Result<ExportPayload> {
        self.exporter.export(self.table()?, format)
    }
}
