use crate::core::export::{DEFAULT_LABEL, DEFAULT_SHEET_NAME};
use crate::core::ingest::{DEFAULT_EXTENSIONS, DEFAULT_MAX_UPLOAD_MB};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PipelineError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PREVIEW_ROWS: usize = 5;
pub const DEFAULT_PORT: u16 = 10000;

/// Resolved application settings. Every section is optional in the file and
/// falls back to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub report: ReportConfig,
    pub export: ExportConfig,
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub allowed_extensions: Vec<String>,
    pub max_upload_mb: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub label: String,
    pub sheet_name: String,
    pub output_path: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_path: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PipelineError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PipelineError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PipelineError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_upload_extensions(
            "ingest.allowed_extensions",
            &self.ingest.allowed_extensions,
        )?;
        validation::validate_positive_number("ingest.max_upload_mb", self.ingest.max_upload_mb, 1)?;
        validation::validate_range("report.preview_rows", self.report.preview_rows, 1, 1000)?;
        validation::validate_filename_label("export.label", &self.export.label)?;
        validation::validate_sheet_name("export.sheet_name", &self.export.sheet_name)?;
        validation::validate_path("export.output_path", &self.export.output_path)?;
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        validation::validate_range("server.port", self.server.port, 1, u16::MAX)?;
        Ok(())
    }

    pub fn output_path(&self) -> &str {
        &self.export.output_path
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for AppConfig {
    fn allowed_extensions(&self) -> &[String] {
        &self.ingest.allowed_extensions
    }

    fn max_upload_mb(&self) -> usize {
        self.ingest.max_upload_mb
    }

    fn preview_rows(&self) -> usize {
        self.report.preview_rows
    }

    fn export_label(&self) -> &str {
        &self.export.label
    }

    fn sheet_name(&self) -> &str {
        &self.export.sheet_name
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
