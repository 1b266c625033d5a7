//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport concern;
//! `AnalysisResult` additionally carries serde derives because it is the
//! documented JSON shape returned to clients and stored with a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
}

/// A single multiple-choice quiz question produced by the analysis.
///
/// `options` always holds exactly four entries labeled "A)" through "D)";
/// `correct` is the label of the right one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
}

/// A question/answer pair for rote practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// The validated outcome of analyzing a study text.
///
/// Either all three collections come from a fully validated model
/// response, or `error` is set and every collection is empty. The two
/// states are never mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: Vec<String>,
    pub questions: Vec<QuizQuestion>,
    pub flashcards: Vec<Flashcard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Builds the uniform failure shape: an error marker and nothing else.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            summary: Vec::new(),
            questions: Vec::new(),
            flashcards: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// An immutable instruction payload for the analysis service.
///
/// Built once by [`crate::prompt::build_request`] and passed by reference
/// from there on.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub prompt: String,
}

/// Represents one completed study session, persisted for time tracking.
///
/// `materials_analyzed` holds the serialized [`AnalysisResult`] and is
/// only present when the analysis itself succeeded; a session recorded
/// after a failed analysis keeps the field empty on purpose.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic: String,
    pub subject: Option<String>,
    pub duration_minutes: i32,
    pub questions_answered: i32,
    pub materials_analyzed: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// The insert shape for a new study session.
#[derive(Debug, Clone)]
pub struct NewStudySession {
    pub user_id: Uuid,
    pub topic: String,
    pub subject: Option<String>,
    /// Whole minutes of wall-clock study time, floored at 1.
    pub duration_minutes: i32,
    pub result: AnalysisResult,
}

/// Cumulative per-user-per-subject learning metrics.
///
/// One row per (user, subject) pair; only ever created or updated, never
/// deleted by the pipeline.
#[derive(Debug, Clone)]
pub struct SubjectProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub total_study_time: i32,
    pub sessions_count: i32,
    pub average_accuracy: f64,
    pub last_activity: DateTime<Utc>,
}

impl SubjectProgress {
    /// Folds one finished session into the aggregates.
    ///
    /// The running average weighs the prior value by the prior session
    /// count against the new sample's weight of 1.
    pub fn absorb_session(&mut self, duration_minutes: i32, accuracy: f64) {
        let prior_count = self.sessions_count;
        self.sessions_count += 1;
        self.total_study_time += duration_minutes;
        self.average_accuracy = if prior_count == 0 {
            accuracy
        } else {
            (self.average_accuracy * prior_count as f64 + accuracy) / self.sessions_count as f64
        };
        self.last_activity = Utc::now();
    }
}
