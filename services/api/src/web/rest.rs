//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Authentication lives outside this service; the authenticated user's id
//! arrives on the `x-user-id` header and is the only thing we know about
//! the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::analyze_task::{run_analysis, AnalysisSource};
use crate::web::state::AppState;
use study_assistant_core::domain::{AnalysisResult, StudySession, SubjectProgress};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_handler,
        list_materials_handler,
        list_sessions_handler,
        list_progress_handler,
        delete_account_data_handler,
        health_handler,
    ),
    components(
        schemas(
            AnalysisResponse,
            QuizQuestionDto,
            FlashcardDto,
            MaterialsResponse,
            SessionDto,
            ProgressDto,
            HealthResponse
        )
    ),
    tags(
        (name = "Study Assistant API", description = "Document analysis and study tracking endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct QuizQuestionDto {
    question: String,
    options: Vec<String>,
    correct: String,
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardDto {
    question: String,
    answer: String,
}

/// The analysis outcome returned to the client. On failure, `error` is
/// set and the collections are empty; a session has still been recorded
/// either way.
#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    summary: Vec<String>,
    questions: Vec<QuizQuestionDto>,
    flashcards: Vec<FlashcardDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<AnalysisResult> for AnalysisResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            summary: result.summary,
            questions: result
                .questions
                .into_iter()
                .map(|q| QuizQuestionDto {
                    question: q.question,
                    options: q.options,
                    correct: q.correct,
                })
                .collect(),
            flashcards: result
                .flashcards
                .into_iter()
                .map(|card| FlashcardDto {
                    question: card.question,
                    answer: card.answer,
                })
                .collect(),
            error: result.error,
        }
    }
}

/// Available static study materials: subject names mapped to topic names.
#[derive(Serialize, ToSchema)]
pub struct MaterialsResponse {
    subjects: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionDto {
    id: Uuid,
    topic: String,
    subject: Option<String>,
    duration_minutes: i32,
    questions_answered: i32,
    #[schema(value_type = Object)]
    #[serde(skip_serializing_if = "Option::is_none")]
    materials_analyzed: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl From<StudySession> for SessionDto {
    fn from(session: StudySession) -> Self {
        Self {
            id: session.id,
            topic: session.topic,
            subject: session.subject,
            duration_minutes: session.duration_minutes,
            questions_answered: session.questions_answered,
            materials_analyzed: session.materials_analyzed,
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProgressDto {
    subject: String,
    total_study_time: i32,
    sessions_count: i32,
    average_accuracy: f64,
    last_activity: DateTime<Utc>,
}

impl From<SubjectProgress> for ProgressDto {
    fn from(progress: SubjectProgress) -> Self {
        Self {
            subject: progress.subject,
            total_study_time: progress.total_study_time,
            sessions_count: progress.sessions_count,
            average_accuracy: progress.average_accuracy,
            last_activity: progress.last_activity,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Pulls the authenticated user's id off the `x-user-id` header.
fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))?;

    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid x-user-id format".to_string()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Analyze an uploaded document or a stored study material.
///
/// Accepts multipart/form-data carrying either a `file` part (txt, pdf or
/// docx; an optional `subject` text part tags the session) or `subject` +
/// `topic` text parts referencing the static material store.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body(content_type = "multipart/form-data", description = "A `file` part, or `subject` + `topic` parts."),
    responses(
        (status = 200, description = "Analysis outcome (may carry an error marker)", body = AnalysisResponse),
        (status = 400, description = "No file or study material selected"),
        (status = 404, description = "Referenced material does not exist"),
        (status = 415, description = "Unsupported file type"),
        (status = 422, description = "Document could not be decoded"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn analyze_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;

    let mut file: Option<(String, Bytes)> = None;
    let mut subject: Option<String> = None;
    let mut topic: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                // A file input submitted empty has no filename; treat it
                // as absent, like an unchecked form field.
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    continue;
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((filename, data));
            }
            "subject" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
                subject = Some(value).filter(|s| !s.is_empty());
            }
            "topic" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
                topic = Some(value).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    let source = match (file, subject, topic) {
        (Some((filename, bytes)), subject, _) => AnalysisSource::Upload {
            filename,
            bytes,
            subject,
        },
        (None, Some(subject), Some(topic)) => AnalysisSource::Material { subject, topic },
        _ => {
            return Err(ApiError::BadRequest(
                "No file or study material selected".to_string(),
            ))
        }
    };

    let result = run_analysis(app_state, user_id, source).await?;
    Ok(Json(AnalysisResponse::from(result)))
}

/// List the static study materials available for analysis.
#[utoipa::path(
    get,
    path = "/materials",
    responses(
        (status = 200, description = "Subjects and their topics", body = MaterialsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_materials_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let subjects = app_state.materials.list().await?;
    Ok(Json(MaterialsResponse { subjects }))
}

/// List the caller's recorded study sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "The caller's study sessions", body = [SessionDto]),
        (status = 400, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let sessions = app_state.db.get_sessions_by_user(user_id).await?;
    let payload: Vec<SessionDto> = sessions.into_iter().map(SessionDto::from).collect();
    Ok(Json(payload))
}

/// List the caller's per-subject progress aggregates.
#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "The caller's subject progress", body = [ProgressDto]),
        (status = 400, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    let progress = app_state.db.get_progress_by_user(user_id).await?;
    let payload: Vec<ProgressDto> = progress.into_iter().map(ProgressDto::from).collect();
    Ok(Json(payload))
}

/// Delete everything stored for the caller: progress, sessions, user row.
#[utoipa::path(
    delete,
    path = "/account/data",
    responses(
        (status = 204, description = "All stored data removed"),
        (status = 400, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_account_data_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from_headers(&headers)?;
    app_state.db.delete_user_data(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
