//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::{
    AnalysisRequest, AnalysisResult, NewStudySession, StudySession, SubjectProgress, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User>;

    // --- Study Sessions and Progress ---

    /// Persists a study session and, when the session names a subject,
    /// folds it into that subject's progress row. The insert and the
    /// progress update happen in one transaction; a failure anywhere
    /// leaves no partial state behind.
    async fn record_study_session(&self, new_session: NewStudySession)
        -> PortResult<StudySession>;

    async fn get_sessions_by_user(&self, user_id: Uuid) -> PortResult<Vec<StudySession>>;

    async fn get_progress_by_user(&self, user_id: Uuid) -> PortResult<Vec<SubjectProgress>>;

    /// Removes everything owned by a user: progress rows first, then
    /// sessions, then the user row, all in one transaction.
    async fn delete_user_data(&self, user_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait TextAnalysisService: Send + Sync {
    /// Runs the study-text analysis for a prepared request.
    ///
    /// This call never fails structurally: transport faults, bad
    /// credentials, rate limits, and malformed model output are all
    /// absorbed into an [`AnalysisResult`] carrying an error marker and
    /// empty collections.
    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult;
}

#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Looks up the stored text for a (subject, topic) pair.
    async fn lookup(&self, subject: &str, topic: &str) -> PortResult<String>;

    /// Lists every subject with its topic names, for the picker UI.
    async fn list(&self) -> PortResult<BTreeMap<String, Vec<String>>>;
}
