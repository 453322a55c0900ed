pub mod toml_config;

#[cfg(feature = "cli")]
pub mod cli;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use crate::domain::{export::ExportFormat, report::AnalysisKind};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sheetstat")]
#[command(about = "Profile, summarize and export a CSV or Excel file")]
#[command(version)]
pub struct CliConfig {
    /// File to analyze (.csv, .xlsx or .xls)
    pub input: String,

    /// Report to print: info, describe, missing or quick
    #[arg(long, short = 'a')]
    pub analysis: Option<AnalysisKind>,

    /// Write the table out as xlsx, csv or json
    #[arg(long, short = 'e')]
    pub export: Option<ExportFormat>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Base name of the exported file
    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub preview_rows: Option<usize>,

    /// TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Defaults, then the TOML file, then flags given on the command line.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(output_path) = &self.output_path {
            config.export.output_path = output_path.clone();
        }
        if let Some(label) = &self.label {
            config.export.label = label.clone();
        }
        if let Some(preview_rows) = self.preview_rows {
            config.report.preview_rows = preview_rows;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }

        config.validate_config()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        self.resolve().map(|_| ())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_flags() {
        let cli = CliConfig::parse_from([
            "sheetstat",
            "data.csv",
            "--analysis",
            "describe",
            "--export",
            "json",
            "--preview-rows",
            "3",
        ]);
        assert_eq!(cli.input, "data.csv");
        assert_eq!(cli.analysis, Some(AnalysisKind::Descriptive));
        assert_eq!(cli.export, Some(ExportFormat::Json));
        assert_eq!(cli.preview_rows, Some(3));
    }

    #[test]
    fn test_unknown_analysis_is_rejected() {
        let parsed = CliConfig::try_parse_from(["sheetstat", "data.csv", "--analysis", "median"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[export]\nlabel = \"from_file\"\n[report]\npreview_rows = 8\n")
            .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let cli = CliConfig::parse_from([
            "sheetstat",
            "data.csv",
            "--config",
            path.as_str(),
            "--label",
            "from_flag",
        ]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.export.label, "from_flag");
        assert_eq!(config.report.preview_rows, 8);
    }

    #[test]
    fn test_resolve_validates() {
        let cli = CliConfig::parse_from(["sheetstat", "data.csv", "--preview-rows", "0"]);
        assert!(cli.resolve().is_err());
        assert!(cli.validate().is_err());

        let cli = CliConfig::parse_from(["sheetstat", "data.csv"]);
        assert!(cli.validate().is_ok());
    }
}
