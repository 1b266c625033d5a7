//! services/api/src/adapters/analysis_llm.rs
//!
//! This module contains the adapter for the study-text analysis LLM.
//! It implements the `TextAnalysisService` port from the `core` crate.
//!
//! The model is an untrusted collaborator: its output is decoded against
//! the documented schema and anything that does not validate, along with
//! every transport-level fault, collapses into the uniform error-marked
//! result. Callers never see a raw client or parsing error.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use study_assistant_core::{
    domain::{AnalysisRequest, AnalysisResult, Flashcard, QuizQuestion},
    ports::TextAnalysisService,
};

const ANALYSIS_TEMPERATURE: f32 = 0.7;
const OPTIONS_PER_QUESTION: usize = 4;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAnalysisAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiAnalysisAdapter {
    /// Creates a new `OpenAiAnalysisAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }

    /// Runs one chat completion and returns the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map_err(|e| e.to_string())?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(ANALYSIS_TEMPERATURE)
            .build()
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "model returned no choices".to_string())?;

        choice
            .message
            .content
            .ok_or_else(|| "model response contained no text content".to_string())
    }
}

//=========================================================================================
// `TextAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextAnalysisService for OpenAiAnalysisAdapter {
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        let completion =
            match tokio::time::timeout(self.timeout, self.complete(&request.prompt)).await {
                Ok(Ok(content)) => content,
                Ok(Err(e)) => {
                    warn!("analysis call failed: {}", e);
                    return AnalysisResult::failed(format!("Analysis failed: {}", e));
                }
                Err(_) => {
                    warn!("analysis call exceeded {:?}", self.timeout);
                    return AnalysisResult::failed(format!(
                        "Analysis timed out after {} seconds",
                        self.timeout.as_secs()
                    ));
                }
            };

        match parse_analysis(&completion) {
            Ok(result) => result,
            Err(e) => {
                warn!("model response failed validation: {}", e);
                AnalysisResult::failed(format!("Analysis failed: {}", e))
            }
        }
    }
}

//=========================================================================================
// Response Decoding and Validation
//=========================================================================================

// Raw deserialization targets. Field presence and types come from serde;
// the counts are checked explicitly below.

#[derive(Deserialize)]
struct RawAnalysis {
    summary: Vec<String>,
    questions: Vec<RawQuestion>,
    flashcards: Vec<RawFlashcard>,
}

#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct: String,
}

#[derive(Deserialize)]
struct RawFlashcard {
    question: String,
    answer: String,
}

/// Decodes and validates one model response against the documented schema.
///
/// Returns a fully populated result or an error; it never lets partially
/// valid data through.
fn parse_analysis(content: &str) -> Result<AnalysisResult, String> {
    let raw: RawAnalysis = serde_json::from_str(content)
        .map_err(|e| format!("response is not the documented JSON shape: {}", e))?;

    let mut questions = Vec::with_capacity(raw.questions.len());
    for (index, question) in raw.questions.into_iter().enumerate() {
        if question.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "question {} has {} options, expected {}",
                index + 1,
                question.options.len(),
                OPTIONS_PER_QUESTION
            ));
        }
        questions.push(QuizQuestion {
            question: question.question,
            options: question.options,
            correct: question.correct,
        });
    }

    let flashcards = raw
        .flashcards
        .into_iter()
        .map(|card| Flashcard {
            question: card.question,
            answer: card.answer,
        })
        .collect();

    Ok(AnalysisResult {
        summary: raw.summary,
        questions,
        flashcards,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RESPONSE: &str = r#"{
        "summary": ["Light becomes chemical energy."],
        "questions": [
            {
                "question": "What does photosynthesis produce?",
                "options": ["A) Light", "B) Glucose", "C) Nitrogen", "D) Heat"],
                "correct": "B"
            }
        ],
        "flashcards": [
            {"question": "Where does photosynthesis happen?", "answer": "In chloroplasts."}
        ]
    }"#;

    #[test]
    fn valid_response_parses_into_a_full_result() {
        let result = parse_analysis(VALID_RESPONSE).unwrap();

        assert!(!result.is_failed());
        assert_eq!(result.summary.len(), 1);
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].correct, "B");
        assert_eq!(result.flashcards.len(), 1);
    }

    #[test]
    fn prose_instead_of_json_is_rejected() {
        let result = parse_analysis("Sure! Here is your summary: ...");
        assert!(result.is_err());
    }

    #[test]
    fn missing_keys_are_rejected() {
        let result = parse_analysis(r#"{"summary": ["only a summary"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_option_count_is_rejected() {
        let payload = r#"{
            "summary": [],
            "questions": [
                {"question": "q", "options": ["A) yes", "B) no"], "correct": "A"}
            ],
            "flashcards": []
        }"#;
        let result = parse_analysis(payload);
        assert!(result.unwrap_err().contains("2 options"));
    }

    #[test]
    fn wrongly_typed_fields_are_rejected() {
        let payload = r#"{"summary": [1, 2, 3], "questions": [], "flashcards": []}"#;
        assert!(parse_analysis(payload).is_err());
    }
}
