use crate::core::ingest::SourceKind;
use crate::utils::error::{PipelineError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Every entry must name a container the ingestion stage can read.
pub fn validate_upload_extensions(field_name: &str, extensions: &[String]) -> Result<()> {
    if extensions.is_empty() {
        return Err(invalid(field_name, "[]", "At least one extension is required"));
    }

    for extension in extensions {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        if SourceKind::from_extension(&normalized).is_none() {
            return Err(invalid(
                field_name,
                extension,
                "Unsupported file extension. Readable extensions: csv, xlsx, xls",
            ));
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Labels end up in download filenames.
pub fn validate_filename_label(field_name: &str, label: &str) -> Result<()> {
    validate_non_empty_string(field_name, label)?;
    if label
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':' | '"' | '\0') || c.is_control())
    {
        return Err(invalid(
            field_name,
            label,
            "Label cannot contain path separators, quotes or control characters",
        ));
    }
    Ok(())
}

/// Worksheet names: 1 to 31 characters, none of `[ ] : * ? / \`.
pub fn validate_sheet_name(field_name: &str, name: &str) -> Result<()> {
    let length = name.chars().count();
    if length == 0 || length > 31 {
        return Err(invalid(
            field_name,
            name,
            "Sheet name must be between 1 and 31 characters",
        ));
    }
    if name
        .chars()
        .any(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
    {
        return Err(invalid(
            field_name,
            name,
            "Sheet name cannot contain any of [ ] : * ? / \\",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("ingest.max_upload_mb", 5, 1).is_ok());
        assert!(validate_positive_number("ingest.max_upload_mb", 0, 1).is_err());
    }

    #[test]
    fn test_validate_upload_extensions() {
        let ok = vec!["csv".to_string(), ".XLSX".to_string()];
        assert!(validate_upload_extensions("ingest.allowed_extensions", &ok).is_ok());

        let invalid = vec!["txt".to_string()];
        assert!(validate_upload_extensions("ingest.allowed_extensions", &invalid).is_err());
        assert!(validate_upload_extensions("ingest.allowed_extensions", &[]).is_err());
    }

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("export.sheet_name", "البيانات").is_ok());
        assert!(validate_sheet_name("export.sheet_name", "").is_err());
        assert!(validate_sheet_name("export.sheet_name", "a/b").is_err());
        assert!(validate_sheet_name("export.sheet_name", &"x".repeat(32)).is_err());
    }

    #[test]
    fn test_validate_filename_label() {
        assert!(validate_filename_label("export.label", "data_analysis").is_ok());
        assert!(validate_filename_label("export.label", "../etc").is_err());
        assert!(validate_filename_label("export.label", "  ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("server.port", 8080u32, 1, 65535).is_ok());
        assert!(validate_range("report.preview_rows", 0usize, 1, 1000).is_err());
    }
}
