pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub use crate::config::{cli::LocalStorage, CliConfig};

pub use crate::app::engine::{AnalysisEngine, AnalysisOutcome, AnalysisRequest};
pub use crate::app::session::{Preview, Session};
pub use crate::config::AppConfig;
pub use crate::core::export::Exporter;
pub use crate::core::ingest::Ingestor;
pub use crate::domain::export::{ExportFormat, ExportPayload};
pub use crate::domain::model::{Column, ColumnType, Table, Value};
pub use crate::domain::report::{AnalysisKind, Profile, Report, Summary};
pub use crate::utils::error::{IngestionError, PipelineError, Result};
