//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - operation completed (an empty result is acceptable)
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - store and index disagree, automation should halt
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{GenerationError, ImportError, IndexError, StoreError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// Entity not found but command executed successfully (code 3)
    NotFound = 3,

    /// Input rows or files failed validation (code 4)
    ValidationError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,

    /// Index artifact missing or unreadable (code 7)
    IndexUnavailable = 7,

    /// Query and index embeddings are incompatible (code 8)
    IncompatibleIndex = 8,

    /// Language model unavailable or rejected the request (code 9)
    ModelError = 9,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Determine exit code for a lookup based on result presence.
    pub fn from_retrieve_result<T>(result: &Option<T>) -> Self {
        match result {
            Some(_) => ExitCode::Success,
            None => ExitCode::NotFound,
        }
    }

    /// Convert an `IndexError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &IndexError) -> Self {
        match error {
            IndexError::IndexNotFound { .. } => ExitCode::IndexUnavailable,
            IndexError::EmptyIndex => ExitCode::NotFound,
            IndexError::DimensionMismatch { .. } => ExitCode::IncompatibleIndex,
            IndexError::Validation { .. } => ExitCode::ValidationError,
            IndexError::Write { .. } => ExitCode::IoError,

            // Store and index disagree: results can't be trusted
            IndexError::Consistency { .. } => ExitCode::BlockingError,
            IndexError::Store(StoreError::Corrupted { .. }) => ExitCode::BlockingError,

            _ => ExitCode::GeneralError,
        }
    }

    pub fn from_import_error(error: &ImportError) -> Self {
        match error {
            ImportError::MissingColumn { .. }
            | ImportError::Validation { .. }
            | ImportError::Csv(_) => ExitCode::ValidationError,
            ImportError::Read { .. } => ExitCode::IoError,
            ImportError::Store(StoreError::Corrupted { .. }) => ExitCode::BlockingError,
            ImportError::Store(_) => ExitCode::GeneralError,
        }
    }

    pub fn from_generation_error(error: &GenerationError) -> Self {
        match error {
            GenerationError::MissingApiKey { .. } | GenerationError::Config { .. } => {
                ExitCode::ConfigError
            }
            GenerationError::Exhausted { .. } => ExitCode::ValidationError,
            GenerationError::Http(_)
            | GenerationError::Api { .. }
            | GenerationError::EmptyResponse => ExitCode::ModelError,
        }
    }

    /// Find the most specific exit code for an error chain built by anyhow.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if let Some(e) = cause.downcast_ref::<IndexError>() {
                return Self::from_error(e);
            }
            if let Some(e) = cause.downcast_ref::<ImportError>() {
                return Self::from_import_error(e);
            }
            if let Some(e) = cause.downcast_ref::<GenerationError>() {
                return Self::from_generation_error(e);
            }
            if cause.downcast_ref::<std::io::Error>().is_some() {
                return ExitCode::IoError;
            }
        }
        ExitCode::GeneralError
    }

    /// Check if this exit code indicates a blocking error.
    ///
    /// Blocking errors should halt automation pipelines.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not found",
            ExitCode::ValidationError => "Validation error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::IndexUnavailable => "Index unavailable",
            ExitCode::IncompatibleIndex => "Incompatible index",
            ExitCode::ModelError => "Language model error",
        }
    }
}
