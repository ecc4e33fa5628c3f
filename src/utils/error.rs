use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Format error: {message}")]
    FormatError { message: String },

    #[error("Operation error: {message}")]
    OperationError { message: String },

    #[error("Lookup error: unmapped {family} term '{term}'")]
    LookupError { family: &'static str, term: String },

    #[error("Missing field: {field}")]
    MissingFieldError { field: String },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },

    #[error("Invalid configuration value for '{field}': {reason} (value: '{value}')")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Format,
    Operation,
    Mapping,
    Persistence,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::FormatError {
            message: message.into(),
        }
    }

    pub fn operation(message: impl Into<String>) -> Self {
        Self::OperationError {
            message: message.into(),
        }
    }

    pub fn lookup(family: &'static str, term: impl Into<String>) -> Self {
        Self::LookupError {
            family,
            term: term.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingFieldError {
            field: field.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    /// 錯誤的人類可讀訊息（不含分類前綴）
    pub fn message(&self) -> String {
        match self {
            Self::ConfigurationError { message }
            | Self::FormatError { message }
            | Self::OperationError { message }
            | Self::PersistenceError { message } => message.clone(),
            Self::LookupError { family, term } => {
                format!("no {} value for feed term '{}'", family, term)
            }
            Self::MissingFieldError { field } => format!("'{}' is absent from the listing", field),
            Self::InvalidConfigValueError { field, reason, .. } => format!("{}: {}", field, reason),
            Self::IoError(e) => e.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::FormatError { .. } => ErrorCategory::Format,
            Self::OperationError { .. } => ErrorCategory::Operation,
            Self::LookupError { .. } | Self::MissingFieldError { .. } => ErrorCategory::Mapping,
            Self::PersistenceError { .. } => ErrorCategory::Persistence,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Mapping => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Format | ErrorCategory::Operation => {
                ErrorSeverity::High
            }
            ErrorCategory::Persistence | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid import setup: {}", self.message()),
            ErrorCategory::Format => format!("The feed could not be read: {}", self.message()),
            ErrorCategory::Operation => format!("The input cannot be processed: {}", self.message()),
            ErrorCategory::Mapping => format!("A listing could not be mapped: {}", self.message()),
            ErrorCategory::Persistence => format!("Saving imported data failed: {}", self.message()),
            ErrorCategory::System => format!("System error: {}", self.message()),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigurationError { .. } => "Supply exactly one of a feed file or an input stream",
            Self::InvalidConfigValueError { .. } => "Fix the highlighted value in the configuration file",
            Self::FormatError { .. } => {
                "Check that the feed is well-formed UTF-8 XML or a zip/gzip/bzip2 archive containing it"
            }
            Self::OperationError { .. } => "Provide the feed as a file or a seekable stream",
            Self::LookupError { .. } => {
                "Extend the vocabulary table or rerun with --skip-invalid to skip unknown listings"
            }
            Self::MissingFieldError { .. } => {
                "Ask the feed publisher to include the field or rerun with --skip-invalid"
            }
            Self::PersistenceError { .. } => "Check the output location and rerun the import",
            Self::IoError(_) => "Check that the path exists and is readable",
        }
    }
}

impl From<zip::result::ZipError> for ImportError {
    fn from(e: zip::result::ZipError) -> Self {
        ImportError::format(format!("invalid zip archive: {}", e))
    }
}

impl From<roxmltree::Error> for ImportError {
    fn from(e: roxmltree::Error) -> Self {
        ImportError::format(format!("malformed XML: {}", e))
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        ImportError::persistence(format!("snapshot serialization failed: {}", e))
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        ImportError::persistence(format!("CSV export failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_severity() {
        let err = ImportError::lookup("offer kind", "обмен");
        assert_eq!(err.category(), ErrorCategory::Mapping);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.to_string().contains("обмен"));

        let err = ImportError::configuration("no file nor a stream supplied for import");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.message(), "no file nor a stream supplied for import");

        let err = ImportError::persistence("disk full");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_xml_errors_are_format_errors() {
        let err: ImportError = roxmltree::Document::parse("<a>").unwrap_err().into();
        assert!(matches!(err, ImportError::FormatError { .. }));
    }
}
