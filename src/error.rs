//! Error types for the retrieval core
//!
//! This module provides structured error types using thiserror so that every
//! failure surfaces its specific kind to the caller with an actionable message.

use crate::types::QuestionId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, loading, querying or joining the similarity index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid input: {reason}")]
    Validation { reason: String },

    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Query with the same embedding model the index was built with"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Similarity index not found at '{path}': {reason}")]
    IndexNotFound { path: PathBuf, reason: String },

    #[error("Similarity index contains no vectors")]
    EmptyIndex,

    #[error(
        "Question {id} is referenced by the index but missing from the metadata store\nSuggestion: Re-import the questions or rebuild the index"
    )]
    Consistency { id: QuestionId },

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Failed to write index to '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),
}

impl IndexError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::IndexNotFound { .. } => "INDEX_NOT_FOUND",
            Self::EmptyIndex => "EMPTY_INDEX",
            Self::Consistency { .. } => "CONSISTENCY_ERROR",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::Write { .. } => "WRITE_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::IndexNotFound { .. } => vec![
                "Run 'qgen build' to create the similarity index",
                "Check [index].path in .qgen/settings.toml",
            ],
            Self::EmptyIndex => vec!["Import questions and rebuild with 'qgen build'"],
            Self::DimensionMismatch { .. } => vec![
                "Rebuild the index with the currently configured embedding model",
            ],
            Self::Consistency { .. } => vec![
                "Run 'qgen import' for the same CSV the index was built from",
                "Rebuild the index from the store with 'qgen build'",
            ],
            Self::Embedding(_) => vec![
                "The embedding model is downloaded on first use; check network access",
            ],
            _ => vec![],
        }
    }
}

/// Errors raised by the metadata store backends
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Question {id} already exists; ids are never reused")]
    DuplicateId { id: QuestionId },

    #[error("Store appears to be corrupted: {reason}")]
    Corrupted { reason: String },
}

/// Errors raised by the CSV import path
///
/// `Validation`, `Csv` and `Store` are row-scoped: the import records them
/// against the offending row and continues.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("CSV header is missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("Malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to store question: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ImportError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::Csv(_) => "CSV_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::Read { .. } => "FILE_READ_ERROR",
        }
    }

    /// Whether this error invalidates only a single row.
    pub fn is_row_scoped(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Csv(_) | Self::Store(_))
    }
}

/// Errors raised by the question generation pipeline
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Language model API returned status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Language model returned an empty response")]
    EmptyResponse,

    #[error(
        "API key not found in environment variable '{var}'\nSuggestion: export {var}=<key> or point [generator].api_key_env at another variable"
    )]
    MissingApiKey { var: String },

    #[error("Generated question was rejected in all {rounds} validation rounds")]
    Exhausted { rounds: u32, last_feedback: String },

    #[error("Invalid generator configuration: {reason}")]
    Config { reason: String },
}

impl GenerationError {
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Http(_) => "HTTP_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::MissingApiKey { .. } => "MISSING_API_KEY",
            Self::Exhausted { .. } => "VALIDATION_EXHAUSTED",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(IndexError::EmptyIndex.status_code(), "EMPTY_INDEX");
        assert_eq!(
            IndexError::DimensionMismatch {
                expected: 384,
                actual: 2
            }
            .status_code(),
            "DIMENSION_MISMATCH"
        );
        assert_eq!(
            ImportError::MissingColumn { column: "id" }.status_code(),
            "MISSING_COLUMN"
        );
    }

    #[test]
    fn test_row_scope() {
        let validation = ImportError::Validation {
            field: "answer",
            reason: "must not be empty".to_string(),
        };
        assert!(validation.is_row_scoped());
        assert!(!ImportError::MissingColumn { column: "answer" }.is_row_scoped());
    }

    #[test]
    fn test_consistency_message_names_the_id() {
        let err = IndexError::Consistency {
            id: QuestionId::new(42).unwrap(),
        };
        assert!(err.to_string().contains("Question 42"));
        assert!(!err.recovery_suggestions().is_empty());
    }
}
