//! Analyze → generate → validate state machine.
//!
//! ```text
//! Analyzing ──ok──▶ Generating ──ok──▶ Validating ──PASS──▶ Done
//!     │                 ▲   │              │
//!     │                 └───┼──FAIL, rounds left
//!     ▼                     ▼              ▼
//!   Failed ◀────────────────┴────── FAIL, no rounds left / error
//! ```

use super::model::LanguageModel;
use super::prompts::{self, VERDICT_PREFIX};
use crate::error::{GenerationError, GenerationResult};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Observable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analyzing,
    Generating,
    Validating,
    Done,
    Failed,
}

/// A stage change, reported to observers as it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
    /// Generation attempt the transition belongs to, starting at 1.
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Parsed validator reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub verdict: Verdict,
    pub feedback: String,
}

impl Review {
    /// Parse a reply that should open with `VERDICT: PASS` or `VERDICT: FAIL`.
    ///
    /// Anything else counts as a failure whose feedback is the whole reply.
    pub fn parse(reply: &str) -> Self {
        let reply = reply.trim();
        let (first_line, rest) = reply.split_once('\n').unwrap_or((reply, ""));

        let verdict = first_line
            .trim()
            .get(..VERDICT_PREFIX.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(VERDICT_PREFIX))
            .map(|_| first_line.trim()[VERDICT_PREFIX.len()..].trim().to_ascii_uppercase())
            .and_then(|word| {
                if word.starts_with("PASS") {
                    Some(Verdict::Pass)
                } else if word.starts_with("FAIL") {
                    Some(Verdict::Fail)
                } else {
                    None
                }
            });

        match verdict {
            Some(verdict) => Self {
                verdict,
                feedback: rest.trim().to_string(),
            },
            None => Self {
                verdict: Verdict::Fail,
                feedback: reply.to_string(),
            },
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedQuestion {
    pub analysis: String,
    pub question: String,
    /// The accepting validator's reply, without the verdict line.
    pub review: String,
    /// Generation attempts used.
    pub rounds: u32,
    pub transitions: Vec<Transition>,
}

/// Internal state, carrying what each stage needs.
enum State {
    Analyzing,
    Generating {
        analysis: String,
        feedback: Option<String>,
        round: u32,
    },
    Validating {
        analysis: String,
        question: String,
        round: u32,
    },
    Done(GeneratedQuestion),
    Failed(GenerationError),
}

impl State {
    fn stage(&self) -> Stage {
        match self {
            Self::Analyzing => Stage::Analyzing,
            Self::Generating { .. } => Stage::Generating,
            Self::Validating { .. } => Stage::Validating,
            Self::Done(_) => Stage::Done,
            Self::Failed(_) => Stage::Failed,
        }
    }

    fn round(&self) -> u32 {
        match self {
            Self::Generating { round, .. } | Self::Validating { round, .. } => *round,
            Self::Done(generated) => generated.rounds,
            Self::Analyzing | Self::Failed(_) => 0,
        }
    }
}

/// Drives one example question through analysis, generation and validation.
pub struct GenerationPipeline<'a> {
    model: &'a dyn LanguageModel,
    max_rounds: u32,
}

impl<'a> GenerationPipeline<'a> {
    /// `max_rounds` below one is treated as one.
    pub fn new(model: &'a dyn LanguageModel, max_rounds: u32) -> Self {
        Self {
            model,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn run(&self, example_question: &str) -> GenerationResult<GeneratedQuestion> {
        self.run_with_observer(example_question, |_| {})
    }

    /// Run to completion, calling `on_transition` for every stage change.
    ///
    /// # Errors
    /// [`GenerationError::Exhausted`] when every round was rejected, or the
    /// first model error encountered.
    pub fn run_with_observer(
        &self,
        example_question: &str,
        mut on_transition: impl FnMut(&Transition),
    ) -> GenerationResult<GeneratedQuestion> {
        let mut transitions = Vec::new();
        let mut state = State::Analyzing;

        loop {
            let from = state.stage();
            state = self.step(state, example_question);

            let transition = Transition {
                from,
                to: state.stage(),
                round: state.round(),
            };
            debug!(
                "Pipeline {:?} -> {:?} (round {})",
                transition.from, transition.to, transition.round
            );
            on_transition(&transition);
            transitions.push(transition);

            match state {
                State::Done(mut generated) => {
                    generated.transitions = transitions;
                    info!(
                        "Question accepted by {} after {} round(s)",
                        self.model.name(),
                        generated.rounds
                    );
                    return Ok(generated);
                }
                State::Failed(error) => {
                    warn!("Question generation failed: {error}");
                    return Err(error);
                }
                _ => {}
            }
        }
    }

    fn step(&self, state: State, example_question: &str) -> State {
        match state {
            State::Analyzing => match self.model.complete(&prompts::analysis(example_question)) {
                Ok(analysis) => State::Generating {
                    analysis,
                    feedback: None,
                    round: 1,
                },
                Err(error) => State::Failed(error),
            },

            State::Generating {
                analysis,
                feedback,
                round,
            } => match self
                .model
                .complete(&prompts::generation(&analysis, feedback.as_deref()))
            {
                Ok(question) => State::Validating {
                    analysis,
                    question,
                    round,
                },
                Err(error) => State::Failed(error),
            },

            State::Validating {
                analysis,
                question,
                round,
            } => {
                let reply = match self.model.complete(&prompts::validation(&question)) {
                    Ok(reply) => reply,
                    Err(error) => return State::Failed(error),
                };
                let review = Review::parse(&reply);

                match review.verdict {
                    Verdict::Pass => State::Done(GeneratedQuestion {
                        analysis,
                        question,
                        review: review.feedback,
                        rounds: round,
                        transitions: Vec::new(),
                    }),
                    Verdict::Fail if round < self.max_rounds => {
                        debug!("Round {round} rejected: {}", review.feedback);
                        State::Generating {
                            analysis,
                            feedback: Some(review.feedback),
                            round: round + 1,
                        }
                    }
                    Verdict::Fail => State::Failed(GenerationError::Exhausted {
                        rounds: round,
                        last_feedback: review.feedback,
                    }),
                }
            }

            terminal @ (State::Done(_) | State::Failed(_)) => terminal,
        }
    }
}
