//! Question generation from a retrieved example.
//!
//! A [`GenerationPipeline`] asks a [`LanguageModel`] to analyze the example
//! question, write a new one in the same style, and review it. Rejected
//! questions are regenerated with the reviewer's feedback until one passes or
//! the round limit is reached.

mod model;
mod pipeline;
pub mod prompts;

pub use crate::error::{GenerationError, GenerationResult};
pub use model::{LanguageModel, OpenAiChatModel};
pub use pipeline::{GeneratedQuestion, GenerationPipeline, Review, Stage, Transition, Verdict};

use crate::types::QuestionRecord;

/// Text given to the pipeline for a retrieved question: passage, numbered
/// options and the answer key.
pub fn example_from_record(record: &QuestionRecord) -> String {
    format!(
        "[{}]\n{}\nAnswer: {}",
        record.question_type,
        record.as_prompt_text(),
        record.answer
    )
}
