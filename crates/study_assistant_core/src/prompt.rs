//! crates/study_assistant_core/src/prompt.rs
//!
//! Builds the fixed instruction payload sent to the analysis model.
//! Construction is pure: the same input text always yields a
//! byte-identical request, and no truncation happens here.

use crate::domain::AnalysisRequest;

const ANALYSIS_TEMPLATE: &str = r#"Analyze the following study text and produce:

1. SUMMARY - the main points and key information (3-5 bullet points)
2. QUIZ QUESTIONS - 5 multiple-choice questions with options labeled A, B, C, D, each with the correct answer
3. FLASHCARDS - 5 question/answer pairs for practice

Respond with a single JSON object in this format:
{
    "summary": ["point1", "point2", "point3"],
    "questions": [
        {
            "question": "question text",
            "options": ["A) option1", "B) option2", "C) option3", "D) option4"],
            "correct": "A"
        }
    ],
    "flashcards": [
        {
            "question": "question",
            "answer": "answer"
        }
    ]
}

Respond with the JSON object only, no surrounding prose.

Text to analyze:
{text}"#;

/// Embeds the study text verbatim into the instruction template.
///
/// Empty input is not rejected here; whether an empty document is worth
/// analyzing is the caller's concern.
pub fn build_request(text: &str) -> AnalysisRequest {
    AnalysisRequest {
        prompt: ANALYSIS_TEMPLATE.replace("{text}", text),
    }
}
