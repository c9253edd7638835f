//! Persisted index artifact: reopen, overwrite and damaged files.

use crate::common::{TestWorkspace, abc_embedder, id, record};
use qgen::{IndexBuilder, IndexError, SimilarityIndex, StubEmbedder};
use std::fs;

#[test]
fn test_reopened_index_matches_built_index() {
    let ws = TestWorkspace::new();
    let embedder = abc_embedder();
    let built = IndexBuilder::new()
        .build(&[record(1, "A"), record(2, "B"), record(3, "C")], &embedder)
        .unwrap();
    built.save(ws.index_path()).unwrap();

    let reopened = SimilarityIndex::open(ws.index_path()).unwrap();
    assert_eq!(reopened, built);
    assert_eq!(reopened.model_name(), "stub");
    assert_eq!(reopened.ids(), &[id(1), id(2), id(3)]);
}

#[test]
fn test_save_creates_missing_directories() {
    let ws = TestWorkspace::new();
    let nested = ws.path().join(".qgen").join("index").join("questions.qvec");
    IndexBuilder::new()
        .build(&[record(7, "A")], &abc_embedder())
        .unwrap()
        .save(&nested)
        .unwrap();

    assert!(nested.exists());
    assert_eq!(SimilarityIndex::open(&nested).unwrap().len(), 1);
}

#[test]
fn test_rebuild_replaces_previous_artifact() {
    let ws = TestWorkspace::new();
    let embedder = abc_embedder();

    IndexBuilder::new()
        .build(&[record(1, "A"), record(2, "B"), record(3, "C")], &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();
    IndexBuilder::new()
        .build(&[record(9, "C")], &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();

    let index = SimilarityIndex::open(ws.index_path()).unwrap();
    assert_eq!(index.ids(), &[id(9)]);
    let hits = index.query("A", &embedder, 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].distance, 50.0);
}

#[test]
fn test_missing_artifact_is_index_not_found() {
    let ws = TestWorkspace::new();
    let err = SimilarityIndex::open(ws.path().join("never-built.qvec")).unwrap_err();
    assert!(matches!(err, IndexError::IndexNotFound { .. }));
    assert!(!err.recovery_suggestions().is_empty());
}

#[test]
fn test_damaged_artifacts_are_index_not_found() {
    let ws = TestWorkspace::new();
    let embedder = StubEmbedder::new(4);
    IndexBuilder::new()
        .build(&[record(1, "one"), record(2, "two")], &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();
    let good = fs::read(ws.index_path()).unwrap();

    let mut wrong_magic = good.clone();
    wrong_magic[..4].copy_from_slice(b"JUNK");
    let truncated = good[..good.len() - 3].to_vec();
    let mut trailing = good.clone();
    trailing.extend_from_slice(&[0, 0, 0, 0]);

    for (name, bytes) in [
        ("magic.qvec", wrong_magic),
        ("truncated.qvec", truncated),
        ("trailing.qvec", trailing),
        ("text.qvec", b"id,question_text\n1,hello\n".to_vec()),
    ] {
        let path = ws.path().join(name);
        fs::write(&path, bytes).unwrap();
        match SimilarityIndex::open(&path) {
            Err(IndexError::IndexNotFound { .. }) => {}
            other => panic!("{name}: expected IndexNotFound, got {other:?}"),
        }
    }
}

#[test]
fn test_wrong_length_query_vector_against_reopened_index() {
    let ws = TestWorkspace::new();
    IndexBuilder::new()
        .build(&[record(1, "A"), record(2, "B")], &abc_embedder())
        .unwrap()
        .save(ws.index_path())
        .unwrap();
    let index = SimilarityIndex::open(ws.index_path()).unwrap();

    assert!(matches!(
        index.search_vector(&[0.0, 0.0, 0.0], 1),
        Err(IndexError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
    assert!(index.search_vector(&[0.0, 0.0], 0).unwrap().is_empty());
}
