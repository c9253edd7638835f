//! Output handling for the CLI.
//!
//! This module provides:
//! - Output formatting (text, JSON envelope)
//! - Consistent exit codes derived from library errors

pub mod exit_code;
pub mod format;

pub use exit_code::ExitCode;
pub use format::{ErrorDetails, JsonResponse, OutputFormat, ResponseMeta};
