//! Table formatting utilities for structured output.

use crate::import::ImportReport;
use crate::retrieve::Match;
use crate::types::QuestionRecord;
use comfy_table::{
    Attribute, Cell, Color, ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS,
    presets::UTF8_FULL,
};

/// Longest passage excerpt shown in result tables.
const EXCERPT_CHARS: usize = 60;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        Self { table: new_table() }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// First line of `text`, cut to [`EXCERPT_CHARS`] characters.
pub fn excerpt(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > EXCERPT_CHARS {
        let cut: String = first_line.chars().take(EXCERPT_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        first_line.to_string()
    }
}

/// Create a table of nearest-neighbour results.
pub fn create_match_table(matches: &[Match]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["#", "ID", "Type", "Distance", "Question"]);
    for (rank, hit) in matches.iter().enumerate() {
        builder = builder.add_row(vec![
            (rank + 1).to_string(),
            hit.record.id.to_string(),
            hit.record.question_type.to_string(),
            format!("{:.4}", hit.distance),
            excerpt(&hit.record.question_text),
        ]);
    }
    builder.build()
}

/// Create a field/value table for a single question.
pub fn create_record_table(record: &QuestionRecord) -> String {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Field").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    let options = record
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}) {option}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    table.add_row(vec!["ID".to_string(), record.id.to_string()]);
    table.add_row(vec!["Type".to_string(), record.question_type.to_string()]);
    table.add_row(vec!["Question".to_string(), record.question_text.clone()]);
    table.add_row(vec!["Options".to_string(), options]);
    table.add_row(vec!["Vocabulary".to_string(), record.vocabulary.clone()]);
    table.add_row(vec![
        Cell::new("Answer"),
        Cell::new(&record.answer).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec!["Explanation".to_string(), record.explanation.clone()]);

    table.to_string()
}

/// Create a summary table for an import run, listing each failed row.
pub fn create_import_summary_table(report: &ImportReport) -> String {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Line").add_attribute(Attribute::Bold),
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("Detail").add_attribute(Attribute::Bold),
    ]);

    for failure in &report.failures {
        table.add_row(vec![
            Cell::new(failure.line),
            Cell::new(failure.error.status_code()).fg(Color::Yellow),
            Cell::new(failure.error.to_string()),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").add_attribute(Attribute::Bold),
        Cell::new(format!("{} imported", report.imported.len()))
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} of {} rows failed",
            report.failures.len(),
            report.total_rows()
        ))
        .add_attribute(Attribute::Bold),
    ]);

    table.to_string()
}
