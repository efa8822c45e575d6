use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    #[error("{format} parsing failed: {source}")]
    Parse {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{format} input produced no usable records")]
    EmptyResult { format: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PrepError {
    /// Wrap a format-specific parser failure, keeping the underlying cause.
    pub fn parse(
        format: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Parse {
            format: format.into(),
            source: source.into(),
        }
    }

    pub fn empty(format: impl Into<String>) -> Self {
        Self::EmptyResult {
            format: format.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnsupportedFormat { .. } | Self::EmptyResult { .. } => ErrorSeverity::Medium,
            Self::Parse { .. } | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::SerializationError(_) => ErrorSeverity::High,
            Self::IoError(_)
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::UnsupportedFormat { format } => {
                format!("This file format ({}) is not supported", format)
            }
            Self::Parse { format, .. } => {
                format!("The file could not be read as {}", format)
            }
            Self::EmptyResult { format } => {
                format!("The {} file contained no rows to work with", format)
            }
            Self::IoError(e) => format!("File access failed: {}", e),
            Self::SerializationError(e) => format!("Data could not be serialized: {}", e),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Option '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Option '{}' is required", field),
            Self::ProcessingError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => {
                "Convert the file to CSV, TSV, JSON, YAML, TOML, XML or Excel and retry"
            }
            Self::Parse { .. } => "Check the file for truncation or syntax errors and re-upload",
            Self::EmptyResult { .. } => "Make sure the file contains at least one data row",
            Self::IoError(_) => "Verify the path exists and is readable",
            Self::SerializationError(_) => "Re-run with --verbose and report the offending file",
            Self::InvalidConfigValueError { .. } | Self::MissingConfigError { .. } => {
                "Run with --help to see accepted options and defaults"
            }
            Self::ProcessingError { .. } => "Re-run with --verbose to see the failing transform",
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_format_and_cause() {
        let err = PrepError::parse("csv", anyhow::anyhow!("row 3 is ragged"));
        assert_eq!(err.to_string(), "csv parsing failed: row 3 is ragged");
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(
            PrepError::UnsupportedFormat {
                format: "parquet".into()
            }
            .severity(),
            ErrorSeverity::Medium
        );
        assert_eq!(PrepError::empty("json").severity(), ErrorSeverity::Medium);
        assert_eq!(
            PrepError::MissingConfigError {
                field: "inputs".into()
            }
            .severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = [
            PrepError::UnsupportedFormat { format: "orc".into() },
            PrepError::empty("yaml"),
            PrepError::ProcessingError {
                message: "bad transform".into(),
            },
        ];
        for err in errors {
            assert!(!err.user_friendly_message().is_empty());
            assert!(!err.recovery_suggestion().is_empty());
        }
    }
}
