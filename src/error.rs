use std::path::PathBuf;

use thiserror::Error;

use crate::index::AttrKind;

/// Main error type for Sieve operations
#[derive(Error, Debug)]
pub enum SieveError {
    #[error("Unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("Too many documents: {count} already indexed, no 32-bit ordinal left")]
    TooManyDocuments { count: usize },

    #[error("Cannot open file {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Truncated read in {}: need {needed} bytes at offset {offset}", .path.display())]
    Truncated {
        path: PathBuf,
        offset: usize,
        needed: usize,
    },

    #[error("Document count mismatch in {kind} attributes: expected {expected}, got {actual}")]
    DocCountMismatch {
        kind: AttrKind,
        expected: usize,
        actual: usize,
    },

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

impl SieveError {
    /// Errors that leave a loaded index unusable
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            SieveError::MissingFile(_)
                | SieveError::Truncated { .. }
                | SieveError::DocCountMismatch { .. }
                | SieveError::CorruptRecord(_)
        )
    }

    /// Errors that abort an index build
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            SieveError::UnknownColumn { .. } | SieveError::TooManyDocuments { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SieveError::UnknownColumn {
            column: "price".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown column 'price'");

        let err = SieveError::DocCountMismatch {
            kind: AttrKind::Float,
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Document count mismatch in float attributes: expected 3, got 2"
        );
    }

    #[test]
    fn test_error_classes() {
        assert!(SieveError::MissingFile(PathBuf::from("x.lci")).is_load_error());
        assert!(SieveError::CorruptRecord("bad".into()).is_load_error());
        assert!(!SieveError::InvalidRequest("bad".into()).is_load_error());
        assert!(SieveError::UnknownColumn { column: "a".into() }.is_build_error());
        assert!(SieveError::TooManyDocuments { count: 1 }.is_build_error());
        assert!(!SieveError::Tokenizer("x".into()).is_build_error());
    }
}
