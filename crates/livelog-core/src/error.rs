//! Error types for livelog

use thiserror::Error;

/// Main error type for livelog operations
#[derive(Error, Debug)]
pub enum LogError {
    /// Filter rule text does not follow the predicate grammar
    #[error("Invalid filter rule: {0}")]
    PredicateSyntax(String),

    /// A high-frequency pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration could not be interpreted
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LogError {
    /// Whether this error is a filter rule syntax error
    pub fn is_syntax(&self) -> bool {
        matches!(self, LogError::PredicateSyntax(_))
    }
}

/// Result type alias using LogError
pub type LogResult<T> = Result<T, LogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::PredicateSyntax("not a rule".to_string());
        assert_eq!(format!("{}", err), "Invalid filter rule: not a rule");
        assert!(err.is_syntax());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LogError = io_err.into();
        assert!(matches!(err, LogError::Io(_)));
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_error_from_regex() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let err: LogError = regex_err.into();
        assert!(matches!(err, LogError::Pattern(_)));
    }
}
