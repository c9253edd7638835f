//! Prompt templates for the three pipeline stages.

/// Marker the validator must open its reply with.
pub const VERDICT_PREFIX: &str = "VERDICT:";

pub fn analysis(example_question: &str) -> String {
    format!(
        "The following is a question from the Korean college entrance exam (수능) English section:\n\
         \n\
         {example_question}\n\
         \n\
         Analyze this question. Identify its question type, the core grammar \
         structure it tests, the topic of the passage and its difficulty."
    )
}

pub fn generation(analysis: &str, feedback: Option<&str>) -> String {
    let mut prompt = format!(
        "The following is an analysis of a 수능 English exam question:\n\
         \n\
         {analysis}\n\
         \n\
         Write a new question based on this analysis. Keep the same question \
         type and difficulty but use a new passage. Include the answer \
         choices and mark the correct answer."
    );
    if let Some(feedback) = feedback {
        prompt.push_str(&format!(
            "\n\nA previous attempt was rejected by the reviewer with this feedback:\n\
             \n\
             {feedback}\n\
             \n\
             Address every point in the feedback."
        ));
    }
    prompt
}

pub fn validation(generated_question: &str) -> String {
    format!(
        "The following English question was generated for the 수능 exam:\n\
         \n\
         {generated_question}\n\
         \n\
         Check its grammar, that exactly one answer is correct, and whether \
         it is suitable as a 수능 question. Begin your reply with exactly \
         `{VERDICT_PREFIX} PASS` or `{VERDICT_PREFIX} FAIL` on its own line, \
         then explain your decision and list concrete improvements."
    )
}
