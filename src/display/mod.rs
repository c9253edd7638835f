//! Rich terminal display utilities for CLI output.
//!
//! Provides styled tables, progress bars, and formatted status lines.

pub mod progress;
pub mod tables;
pub mod theme;

pub use progress::{create_progress_bar, create_spinner, with_spinner};
pub use tables::{
    TableBuilder, create_import_summary_table, create_match_table, create_record_table, excerpt,
};
pub use theme::{THEME, Theme};
