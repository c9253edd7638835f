//! Retrieval with the real sentence-transformer.
//!
//! These tests download the model on first run.

use crate::common::{TestWorkspace, id, record};
use qgen::embedding::DEFAULT_MODEL;
use qgen::{Embedder, FastEmbedder, IndexBuilder, SimilarityIndex};

#[test]
#[ignore = "Downloads 86MB model - run with --ignored for embedding tests"]
fn test_semantically_close_question_ranks_first() {
    let ws = TestWorkspace::new();
    let embedder =
        FastEmbedder::new(DEFAULT_MODEL, ws.path().join("models"), false).unwrap();
    assert_eq!(embedder.dimension(), 384);

    let records = vec![
        record(1, "Plastic waste has become a serious environmental concern."),
        record(2, "He has been working on the project for several months."),
        record(3, "The ability to understand emotions is essential for relationships."),
    ];
    IndexBuilder::new()
        .build(&records, &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();

    let index = SimilarityIndex::open(ws.index_path()).unwrap();
    assert_eq!(index.model_name(), DEFAULT_MODEL);

    let hits = index
        .query("Pollution from plastic is harming the environment.", &embedder, 3)
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].id, id(1));
    assert!(hits[0].distance < hits[1].distance);
}

#[test]
#[ignore = "Downloads 86MB model - run with --ignored for embedding tests"]
fn test_same_text_embeds_identically_within_a_session() {
    let ws = TestWorkspace::new();
    let embedder =
        FastEmbedder::new(DEFAULT_MODEL, ws.path().join("models"), false).unwrap();

    let text = "Scientists have long debated the origin of language.";
    let first = embedder.embed(text).unwrap();
    let second = embedder.embed(text).unwrap();
    assert_eq!(first, second);
}
