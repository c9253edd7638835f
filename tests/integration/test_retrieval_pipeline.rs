//! Import → build → query → join, end to end with a deterministic embedder.

use crate::common::{TestWorkspace, abc_embedder, id, record, sample_csv};
use qgen::import::{collect_records, import_all};
use qgen::{
    CsvSource, IndexBuilder, IndexError, MemoryStore, MetadataStore, Retriever, SimilarityIndex,
    SledStore, StubEmbedder,
};

#[test]
fn test_three_question_scenario() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file("questions.csv", sample_csv::ABC);
    let embedder = abc_embedder();

    let store = SledStore::open(ws.store_path()).unwrap();
    let report = import_all(&mut CsvSource::open(&csv).unwrap(), &store);
    assert!(report.is_clean());

    let index = IndexBuilder::new()
        .build(&store.records().unwrap(), &embedder)
        .unwrap();
    index.save(ws.index_path()).unwrap();

    let index = SimilarityIndex::open(ws.index_path()).unwrap();
    assert_eq!(index.len(), 3);

    let top = index.query("A", &embedder, 1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].id, id(1));

    let hits = index.search_vector(&[0.9, 0.0], 2).unwrap();
    assert_eq!(hits.iter().map(|n| n.id).collect::<Vec<_>>(), vec![id(2), id(1)]);
    assert!((hits[0].distance - 0.01).abs() < 1e-5);
    assert!((hits[1].distance - 0.81).abs() < 1e-5);

    let retriever = Retriever::new(&index, &store);
    let matches = retriever.find_similar("C", &embedder, 3).unwrap();
    let texts: Vec<&str> = matches
        .iter()
        .map(|m| m.record.question_text.as_str())
        .collect();
    assert_eq!(texts, vec!["C", "B", "A"]);
    assert_eq!(matches[0].record.options, vec!["work", "working"]);
}

#[test]
fn test_identical_text_is_its_own_nearest_neighbour() {
    // Hash-derived vectors: no lookup table involved.
    let embedder = StubEmbedder::new(16);
    let texts = [
        "The ability to understand emotions is essential.",
        "Plastic waste has become a serious concern.",
        "He has been working on the project for months.",
        "Scientists have long debated the origin of language.",
    ];
    let records: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| record(i as u32 + 1, text))
        .collect();
    let index = IndexBuilder::new().build(&records, &embedder).unwrap();

    for r in &records {
        let hits = index.query(&r.question_text, &embedder, 1).unwrap();
        assert_eq!(hits[0].id, r.id);
        assert_eq!(hits[0].distance, 0.0);
    }
}

#[test]
fn test_querying_twice_is_idempotent() {
    let ws = TestWorkspace::new();
    let embedder = abc_embedder();
    let records = vec![record(1, "A"), record(2, "B"), record(3, "C")];
    IndexBuilder::new()
        .build(&records, &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();

    let index = SimilarityIndex::open(ws.index_path()).unwrap();
    let first = index.query("B", &embedder, 3).unwrap();
    let second = index.query("B", &embedder, 3).unwrap();
    assert_eq!(first, second);

    let reloaded = SimilarityIndex::open(ws.index_path()).unwrap();
    assert_eq!(reloaded.query("B", &embedder, 3).unwrap(), first);
}

#[test]
fn test_index_built_from_zero_rows_rejects_queries() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file("empty.csv", sample_csv::HEADER);
    let embedder = abc_embedder();

    let (records, failures) = collect_records(&mut CsvSource::open(&csv).unwrap());
    assert!(records.is_empty() && failures.is_empty());

    IndexBuilder::new()
        .build(&records, &embedder)
        .unwrap()
        .save(ws.index_path())
        .unwrap();
    let index = SimilarityIndex::open(ws.index_path()).unwrap();

    assert!(index.is_empty());
    assert_eq!(index.dimension(), 2);
    assert!(matches!(
        index.query("A", &embedder, 1),
        Err(IndexError::EmptyIndex)
    ));
}

#[test]
fn test_equal_distances_prefer_earlier_insertion() {
    let embedder = StubEmbedder::new(2)
        .with("left", vec![-1.0, 0.0])
        .with("right", vec![1.0, 0.0])
        .with("far", vec![0.0, 9.0]);
    // Insertion order deliberately differs from id order.
    let records = vec![record(30, "right"), record(10, "left"), record(20, "far")];
    let index = IndexBuilder::new().build(&records, &embedder).unwrap();

    let hits = index.search_vector(&[0.0, 0.0], 2).unwrap();
    assert_eq!(hits[0].distance, hits[1].distance);
    assert_eq!(hits.iter().map(|n| n.id).collect::<Vec<_>>(), vec![id(30), id(10)]);
}

#[test]
fn test_query_with_incompatible_embedder() {
    let embedder = abc_embedder();
    let index = IndexBuilder::new()
        .build(&[record(1, "A"), record(2, "B")], &embedder)
        .unwrap();

    let wider = StubEmbedder::new(384);
    match index.query("A", &wider, 1) {
        Err(IndexError::DimensionMismatch { expected, actual }) => {
            assert_eq!((expected, actual), (2, 384));
        }
        other => panic!("expected dimension mismatch, got {other:?}"),
    }
}

#[test]
fn test_divergent_store_is_a_consistency_error() {
    let embedder = abc_embedder();
    let records = vec![record(1, "A"), record(2, "B"), record(3, "C")];

    // Verified build refuses records the store doesn't know.
    let partial = MemoryStore::new();
    partial.create(&records[0]).unwrap();
    assert!(matches!(
        IndexBuilder::new().build_verified(&records, &embedder, &partial),
        Err(IndexError::Consistency { .. })
    ));

    // An unverified index joined against the partial store surfaces the gap.
    let index = IndexBuilder::new().build(&records, &embedder).unwrap();
    let retriever = Retriever::new(&index, &partial);
    assert!(retriever.find_similar("A", &embedder, 1).is_ok());
    match retriever.find_similar("C", &embedder, 1) {
        Err(IndexError::Consistency { id: missing }) => assert_eq!(missing, id(3)),
        other => panic!("expected consistency error, got {other:?}"),
    }
}

#[test]
fn test_parallel_queries_share_one_index() {
    let embedder = StubEmbedder::new(8);
    let records: Vec<_> = (1..=50)
        .map(|i| record(i, &format!("question number {i}")))
        .collect();
    let index = IndexBuilder::new().build(&records, &embedder).unwrap();
    let expected = index.query("question number 7", &embedder, 5).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| index.query("question number 7", &embedder, 5).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
