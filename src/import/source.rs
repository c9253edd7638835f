//! CSV reader for the question import source.
//!
//! The first row is a header naming the columns. Columns are matched by
//! name, so their order in the file does not matter:
//!
//! ```csv
//! id,question_type,question_text,options,vocabulary,answer,explanation
//! 1,underlined,"The ability ① to understand ...",,,③,"..."
//! ```

use crate::error::{ImportError, ImportResult};
use crate::types::{QuestionId, QuestionRecord, QuestionType, parse_options};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every import source must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "id",
    "question_type",
    "question_text",
    "options",
    "vocabulary",
    "answer",
    "explanation",
];

/// Older exports name the passage column `question`.
const QUESTION_TEXT_ALIAS: &str = "question";

/// Positions of the contract columns within a record.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    id: usize,
    question_type: usize,
    question_text: usize,
    options: usize,
    vocabulary: usize,
    answer: usize,
    explanation: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> ImportResult<Self> {
        let find = |name: &'static str| -> ImportResult<usize> {
            let position = headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name));
            let position = match (position, name) {
                (None, "question_text") => headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(QUESTION_TEXT_ALIAS)),
                (found, _) => found,
            };
            position.ok_or(ImportError::MissingColumn { column: name })
        };

        Ok(Self {
            id: find(REQUIRED_COLUMNS[0])?,
            question_type: find(REQUIRED_COLUMNS[1])?,
            question_text: find(REQUIRED_COLUMNS[2])?,
            options: find(REQUIRED_COLUMNS[3])?,
            vocabulary: find(REQUIRED_COLUMNS[4])?,
            answer: find(REQUIRED_COLUMNS[5])?,
            explanation: find(REQUIRED_COLUMNS[6])?,
        })
    }
}

/// One data row of the source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub id: String,
    pub question_type: String,
    pub question_text: String,
    pub options: String,
    pub vocabulary: String,
    pub answer: String,
    pub explanation: String,
}

impl RawRow {
    /// Validate the row and convert it into a record.
    pub fn into_record(self) -> ImportResult<QuestionRecord> {
        let id_cell = required("id", self.id)?;
        let id: QuestionId = id_cell.parse().map_err(|reason| ImportError::Validation {
            field: "id",
            reason,
        })?;

        let question_type = QuestionType::from(required("question_type", self.question_type)?);
        let question_text = required("question_text", self.question_text)?;
        let answer = required("answer", self.answer)?;

        Ok(QuestionRecord {
            id,
            question_type,
            question_text,
            options: parse_options(&self.options),
            vocabulary: self.vocabulary,
            answer,
            explanation: self.explanation,
        })
    }
}

fn required(field: &'static str, value: String) -> ImportResult<String> {
    if value.trim().is_empty() {
        Err(ImportError::Validation {
            field,
            reason: "required field is empty".to_string(),
        })
    } else {
        Ok(value)
    }
}

/// A data row together with its 1-based line number in the file.
#[derive(Debug)]
pub struct SourceRow {
    pub line: u64,
    pub row: ImportResult<RawRow>,
}

/// Reader over a CSV import source.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    columns: ColumnMap,
}

impl CsvSource<File> {
    /// Open a CSV file and validate its header.
    pub fn open(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvSource<R> {
    /// Wrap any reader and validate its header.
    pub fn from_reader(input: R) -> ImportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(false)
            .from_reader(input);

        let headers = reader.headers()?.clone();
        let columns = ColumnMap::from_headers(&headers)?;

        Ok(Self { reader, columns })
    }

    /// Iterate the data rows. Malformed records are yielded as row errors.
    pub fn rows(&mut self) -> impl Iterator<Item = SourceRow> + '_ {
        let columns = self.columns;
        self.reader.records().map(move |result| match result {
            Ok(record) => SourceRow {
                line: record.position().map_or(0, |p| p.line()),
                row: Ok(Self::raw_row(&record, &columns)),
            },
            Err(err) => SourceRow {
                line: err.position().map_or(0, |p| p.line()),
                row: Err(ImportError::Csv(err)),
            },
        })
    }

    fn raw_row(record: &StringRecord, columns: &ColumnMap) -> RawRow {
        let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
        RawRow {
            id: cell(columns.id),
            question_type: cell(columns.question_type),
            question_text: cell(columns.question_text),
            options: cell(columns.options),
            vocabulary: cell(columns.vocabulary),
            answer: cell(columns.answer),
            explanation: cell(columns.explanation),
        }
    }
}
