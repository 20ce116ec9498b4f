//! Error types for catalog-index

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or reading the catalog index
///
/// Every variant is fatal to an initialization run. The builder converts
/// them into the `Failed` state and never lets them escape.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Catalog source does not exist
    #[error("Catalog file not found: {}", .0.display())]
    CatalogNotFound(PathBuf),

    /// Catalog lacks required columns
    #[error("Missing columns: {missing:?}. Available: {available:?}")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hub handshake rejected or unreachable
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Model loading error
    #[error("Model error: {0}")]
    Model(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Encoding(String),

    /// Records and vectors do not line up
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// Vector length differs from the index dimensionality
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Worker task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create an invalid index error
    pub fn invalid_index(msg: impl Into<String>) -> Self {
        Self::InvalidIndex(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Errors returned by `QueryEngine::predict`
#[derive(Debug, Error)]
pub enum QueryError {
    /// No index has been published yet
    #[error("Model not initialized")]
    NotReady,

    /// Query text is unusable
    #[error("{0}")]
    InvalidInput(String),

    /// Unexpected fault while encoding or scoring
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IndexError> for QueryError {
    fn from(err: IndexError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_display() {
        let err = IndexError::MissingColumns {
            missing: vec!["Nama".to_string()],
            available: vec!["id".to_string(), "DeskripsiObat".to_string()],
        };
        assert_eq!(
            err.to_string(),
            r#"Missing columns: ["Nama"]. Available: ["id", "DeskripsiObat"]"#
        );
    }

    #[test]
    fn test_catalog_not_found_display() {
        let err = IndexError::CatalogNotFound(PathBuf::from("data/missing.csv"));
        assert_eq!(err.to_string(), "Catalog file not found: data/missing.csv");
    }

    #[test]
    fn test_query_error_from_index_error_is_internal() {
        let err: QueryError = IndexError::DimensionMismatch {
            expected: 3,
            actual: 4,
        }
        .into();
        match err {
            QueryError::Internal(msg) => assert!(msg.contains("expected 3, got 4")),
            other => panic!("Expected QueryError::Internal, got {other:?}"),
        }
    }

    #[test]
    fn test_not_ready_display() {
        assert_eq!(QueryError::NotReady.to_string(), "Model not initialized");
    }
}
