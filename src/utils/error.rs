use thiserror::Error;

/// Failure while turning an uploaded file into a table.
///
/// Every variant carries the underlying cause; callers never receive a
/// partially built table alongside one of these.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Unsupported file extension '{extension}'. Allowed extensions: {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },

    #[error("File is {size_mb:.1}MB, the upload limit is {limit_mb}MB")]
    TooLarge { size_mb: f64, limit_mb: usize },

    #[error("File is not valid UTF-8 text: {message}")]
    Encoding { message: String },

    #[error("Malformed file: {message}")]
    Malformed { message: String },

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet could not be read: {message}")]
    Spreadsheet { message: String },

    #[error("JSON records could not be read: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestionError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown {kind} '{value}'. Expected one of: {expected}")]
    InvalidSelector {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("Export failed: {message}")]
    ExportError { message: String },

    #[error("No file has been ingested yet")]
    NoTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Ingestion(_) | PipelineError::NoTable => ErrorCategory::Input,
            PipelineError::ConfigError { .. }
            | PipelineError::InvalidConfigValueError { .. }
            | PipelineError::InvalidSelector { .. } => ErrorCategory::Configuration,
            PipelineError::ZipError(_)
            | PipelineError::CsvError(_)
            | PipelineError::SerializationError(_)
            | PipelineError::ExportError { .. } => ErrorCategory::Output,
            PipelineError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PipelineError::Ingestion(IngestionError::UnsupportedExtension { .. }) => {
                "Upload a .csv, .xlsx or .xls file"
            }
            PipelineError::Ingestion(IngestionError::TooLarge { .. }) => {
                "Split the file or raise ingest.max_upload_mb"
            }
            PipelineError::Ingestion(_) => "Check the file is valid and not corrupted",
            PipelineError::NoTable => "Upload a file before requesting an analysis",
            PipelineError::ConfigError { .. } | PipelineError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags"
            }
            PipelineError::InvalidSelector { .. } => "Pick one of the listed options",
            PipelineError::IoError(_) => "Check the output path exists and is writable",
            _ => "Retry the export; if it keeps failing, report the file that triggers it",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PipelineError::Ingestion(e) => format!("Could not read the uploaded file: {}", e),
            PipelineError::NoTable => "No file loaded".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
