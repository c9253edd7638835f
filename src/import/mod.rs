//! Bulk import of questions from a tabular source into the metadata store.
//!
//! Failures are row-scoped: a malformed or incomplete row is reported in the
//! [`ImportReport`] and the remaining rows are still imported. Only a header
//! that lacks a contract column aborts the whole import.

mod source;

pub use source::{CsvSource, REQUIRED_COLUMNS, RawRow, SourceRow};

use crate::error::{ImportError, StoreError};
use crate::store::MetadataStore;
use crate::types::{QuestionId, QuestionRecord};
use std::collections::HashSet;
use std::io::Read;
use tracing::{debug, info, warn};

/// A row that could not be imported.
#[derive(Debug)]
pub struct RowFailure {
    /// 1-based line of the record in the source file.
    pub line: u64,
    pub error: ImportError,
}

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids of the records created, in source order.
    pub imported: Vec<QuestionId>,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.imported.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Import every row of `source` into `store`.
pub fn import_all<R: Read>(source: &mut CsvSource<R>, store: &dyn MetadataStore) -> ImportReport {
    import_all_with_progress(source, store, |_| {})
}

/// Like [`import_all`], calling `on_row` with the running row count.
pub fn import_all_with_progress<R: Read>(
    source: &mut CsvSource<R>,
    store: &dyn MetadataStore,
    mut on_row: impl FnMut(usize),
) -> ImportReport {
    let mut report = ImportReport::default();

    for (seen, SourceRow { line, row }) in source.rows().enumerate() {
        let created = row
            .and_then(RawRow::into_record)
            .and_then(|record| store.create(&record).map(|()| record.id).map_err(Into::into));

        match created {
            Ok(id) => {
                debug!("Imported question {id} from line {line}");
                report.imported.push(id);
            }
            Err(error) => {
                warn!("Skipping line {line}: {error}");
                report.failures.push(RowFailure { line, error });
            }
        }
        on_row(seen + 1);
    }

    info!(
        "Imported {} of {} questions ({} failed)",
        report.imported.len(),
        report.total_rows(),
        report.failures.len()
    );
    report
}

/// Read and validate every row without touching a store.
///
/// Applies the same rules as [`import_all`], including rejecting a repeated
/// id, so the returned records are exactly the ones an import would accept.
pub fn collect_records<R: Read>(
    source: &mut CsvSource<R>,
) -> (Vec<QuestionRecord>, Vec<RowFailure>) {
    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut seen_ids = HashSet::new();

    for SourceRow { line, row } in source.rows() {
        let record = row.and_then(RawRow::into_record).and_then(|record| {
            if seen_ids.insert(record.id) {
                Ok(record)
            } else {
                Err(StoreError::DuplicateId { id: record.id }.into())
            }
        });

        match record {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!("Skipping line {line}: {error}");
                failures.push(RowFailure { line, error });
            }
        }
    }

    (records, failures)
}
