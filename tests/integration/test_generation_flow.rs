//! Retrieval feeding the generation pipeline, with a scripted language model.

use crate::common::{TestWorkspace, abc_embedder, id, sample_csv};
use qgen::generator::{
    GenerationError, GenerationPipeline, GenerationResult, LanguageModel, Stage,
    example_from_record,
};
use qgen::{CsvSource, IndexBuilder, MetadataStore, Retriever, SledStore, import_all};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies and records every prompt it receives.
struct ScriptedModel {
    replies: Mutex<VecDeque<&'static str>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str) -> GenerationResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(str::to_string)
            .ok_or(GenerationError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[test]
fn test_nearest_question_becomes_the_example() {
    let ws = TestWorkspace::new();
    let csv = ws.add_file("questions.csv", sample_csv::ABC);
    let embedder = abc_embedder();

    let store = SledStore::open(ws.store_path()).unwrap();
    assert!(import_all(&mut CsvSource::open(&csv).unwrap(), &store).is_clean());
    let index = IndexBuilder::new()
        .build(&store.records().unwrap(), &embedder)
        .unwrap();

    let retriever = Retriever::new(&index, &store);
    let nearest = retriever.find_similar("C", &embedder, 1).unwrap();
    assert_eq!(nearest[0].record.id, id(3));
    let example = example_from_record(&nearest[0].record);

    let model = ScriptedModel::new(&[
        "Type: blank. Tests present perfect progressive.",
        "She has been ______ all morning.\n1) study\n2) studying\nAnswer: 2",
        "VERDICT: PASS\nClear and unambiguous.",
    ]);
    let mut seen = Vec::new();
    let generated = GenerationPipeline::new(&model, 3)
        .run_with_observer(&example, |t| seen.push(t.to))
        .unwrap();

    assert_eq!(generated.rounds, 1);
    assert!(generated.question.starts_with("She has been"));
    assert_eq!(generated.review, "Clear and unambiguous.");
    assert_eq!(
        seen,
        vec![Stage::Generating, Stage::Validating, Stage::Done]
    );

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[0].contains("[blank]"));
    assert!(prompts[0].contains("1) work\n2) working"));
    assert!(prompts[1].contains("Tests present perfect progressive."));
    assert!(prompts[2].contains("She has been ______ all morning."));
}

#[test]
fn test_rejected_question_is_regenerated_with_feedback() {
    let model = ScriptedModel::new(&[
        "analysis",
        "first draft",
        "VERDICT: FAIL\nTwo options are grammatical.",
        "second draft",
        "VERDICT: PASS",
    ]);

    let generated = GenerationPipeline::new(&model, 3).run("example").unwrap();
    assert_eq!(generated.rounds, 2);
    assert_eq!(generated.question, "second draft");

    let prompts = model.prompts();
    assert!(!prompts[1].contains("Two options are grammatical."));
    assert!(prompts[3].contains("Two options are grammatical."));
    assert_eq!(
        generated.transitions.last().map(|t| (t.to, t.round)),
        Some((Stage::Done, 2))
    );
}

#[test]
fn test_round_limit_ends_in_failure() {
    let model = ScriptedModel::new(&[
        "analysis",
        "draft",
        "VERDICT: FAIL\nToo easy.",
    ]);

    match GenerationPipeline::new(&model, 1).run("example") {
        Err(GenerationError::Exhausted {
            rounds,
            last_feedback,
        }) => {
            assert_eq!(rounds, 1);
            assert_eq!(last_feedback, "Too easy.");
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(model.prompts().len(), 3);
}

#[test]
fn test_model_failure_stops_pipeline() {
    // Runs out of replies after the analysis.
    let model = ScriptedModel::new(&["analysis"]);
    let err = GenerationPipeline::new(&model, 3).run("example").unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse));
    assert_eq!(model.prompts().len(), 2);
}
