//! CSV import into the durable store.

use crate::common::{TestWorkspace, id, sample_csv};
use qgen::error::{ImportError, StoreError};
use qgen::import::import_all;
use qgen::{CsvSource, MetadataStore, QuestionType, SledStore};

#[test]
fn test_import_then_get_returns_equal_records() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file("questions.csv", sample_csv::REALISTIC);

    let store = SledStore::open(ws.store_path()).unwrap();
    let mut source = CsvSource::open(&csv).unwrap();
    let report = import_all(&mut source, &store);

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(report.imported, vec![id(10), id(11), id(12)]);

    let blank = store.get(id(12)).unwrap().unwrap();
    assert_eq!(blank.question_type, QuestionType::Blank);
    assert_eq!(
        blank.question_text,
        "He has been ______ the project for several months."
    );
    assert_eq!(blank.options, vec!["work", "working", "works", "worked"]);
    assert_eq!(blank.answer, "working");

    let underlined = store.get(id(10)).unwrap().unwrap();
    assert!(underlined.options.is_empty());
    assert_eq!(underlined.vocabulary, "ability: 능력");

    // Records are durable across reopen and compare equal field by field.
    let before = store.records().unwrap();
    drop(store);
    let reopened = SledStore::open(ws.store_path()).unwrap();
    assert_eq!(reopened.records().unwrap(), before);
}

#[test]
fn test_row_failures_do_not_affect_siblings() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file(
        "questions.csv",
        &format!(
            "{}1,box,First,,,a,\n2,,Missing type,,,a,\n3,box,,,,a,\n0,box,Zero id,,,a,\n4,box,Fourth,,,d,\n",
            sample_csv::HEADER
        ),
    );

    let store = SledStore::temporary().unwrap();
    let report = import_all(&mut CsvSource::open(&csv).unwrap(), &store);

    assert_eq!(report.imported, vec![id(1), id(4)]);
    let failed: Vec<(u64, &str)> = report
        .failures
        .iter()
        .map(|f| match &f.error {
            ImportError::Validation { field, .. } => (f.line, *field),
            other => panic!("unexpected error {other:?}"),
        })
        .collect();
    assert_eq!(
        failed,
        vec![(3, "question_type"), (4, "question_text"), (5, "id")]
    );
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn test_reimport_rejects_existing_ids() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file("questions.csv", sample_csv::ABC);
    let store = SledStore::open(ws.store_path()).unwrap();

    let first = import_all(&mut CsvSource::open(&csv).unwrap(), &store);
    assert_eq!(first.imported.len(), 3);

    let second = import_all(&mut CsvSource::open(&csv).unwrap(), &store);
    assert!(second.imported.is_empty());
    assert_eq!(second.failures.len(), 3);
    assert!(second.failures.iter().all(|f| matches!(
        f.error,
        ImportError::Store(StoreError::DuplicateId { .. })
    )));
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn test_missing_header_column_fails_whole_import() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file(
        "broken.csv",
        "id,question_type,question_text,options,answer,explanation\n1,box,text,,a,\n",
    );

    let err = CsvSource::open(&csv).err().unwrap();
    assert!(matches!(
        err,
        ImportError::MissingColumn {
            column: "vocabulary"
        }
    ));
    assert!(!err.is_row_scoped());
}

#[test]
fn test_unreadable_source() {
    let ws = TestWorkspace::new();
    let err = CsvSource::open(ws.path().join("absent.csv")).err().unwrap();
    assert!(matches!(err, ImportError::Read { .. }));
}
