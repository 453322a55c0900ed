use crate::app::session::{Preview, Session};
use crate::domain::export::ExportFormat;
use crate::domain::ports::{Clock, ConfigProvider, Storage, SystemClock};
use crate::domain::report::{AnalysisKind, Profile, Report};
use crate::utils::error::Result;
use crate::utils::monitor::StageMonitor;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Path handed to the source storage.
    pub input: String,
    pub analysis: Option<AnalysisKind>,
    pub export: Option<ExportFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub file_name: String,
    pub profile: Profile,
    pub preview: Preview,
    pub report: Option<Report>,
    pub exported: Option<ExportedFile>,
}

/// Reads one file from `source`, runs it through a [`Session`] and writes
/// the requested export to `sink`.
pub struct AnalysisEngine<S: Storage, K: Clock = SystemClock> {
    source: S,
    sink: S,
    session: Session<K>,
    monitor: StageMonitor,
}

impl<S: Storage> AnalysisEngine<S, SystemClock> {
    pub fn new<C: ConfigProvider + ?Sized>(source: S, sink: S, config: &C) -> Self {
        Self::new_with_monitoring(source, sink, config, false)
    }

    pub fn new_with_monitoring<C: ConfigProvider + ?Sized>(
        source: S,
        sink: S,
        config: &C,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            source,
            sink,
            session: Session::new(config),
            monitor: StageMonitor::new(monitor_enabled),
        }
    }
}

impl<S: Storage, K: Clock> AnalysisEngine<S, K> {
    pub fn with_clock<K2: Clock>(self, clock: K2) -> AnalysisEngine<S, K2> {
        AnalysisEngine {
            source: self.source,
            sink: self.sink,
            session: self.session.with_clock(clock),
            monitor: self.monitor,
        }
    }

    pub fn session(&self) -> &Session<K> {
        &self.session
    }

    pub fn monitor(&self) -> &StageMonitor {
        &self.monitor
    }

    pub async fn run(&mut self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        tracing::info!(input = %request.input, "Starting analysis");
        self.monitor.begin();

        let bytes = self.source.read_file(&request.input).await?;
        self.monitor.record("read");
        let file_name = Path::new(&request.input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| request.input.clone());

        self.session.upload(&file_name, &bytes)?;
        self.monitor.record("ingest");

        let profile = self.session.profile()?;
        let preview = self.session.preview()?;
        self.monitor.record("profile");

        let report = match request.analysis {
            Some(kind) => {
                let report = self.session.analyze(kind)?;
                self.monitor.record("analyze");
                Some(report)
            }
            None => None,
        };

        let exported = match request.export {
            Some(format) => {
                let payload = self.session.export(format)?;
                self.sink.write_file(&payload.filename, &payload.bytes).await?;
                self.monitor.record("export");
                Some(ExportedFile {
                    filename: payload.filename,
                    bytes: payload.bytes.len(),
                })
            }
            None => None,
        };

        self.monitor.log_summary();

        Ok(AnalysisOutcome {
            file_name,
            profile,
            preview,
            report,
            exported,
        })
    }
}
