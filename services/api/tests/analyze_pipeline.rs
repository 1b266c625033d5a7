//! Integration tests for the analysis pipeline: the real router and
//! orchestrator, with fake implementations behind the service ports.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use study_assistant_core::domain::{
    AnalysisRequest, AnalysisResult, Flashcard, NewStudySession, QuizQuestion, StudySession,
    SubjectProgress, User,
};
use study_assistant_core::ports::{
    DatabaseService, MaterialStore, PortError, PortResult, TextAnalysisService,
};

//=========================================================================================
// Fake Port Implementations
//=========================================================================================

#[derive(Default)]
struct FakeDb {
    sessions: Mutex<Vec<NewStudySession>>,
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        Ok(User { user_id })
    }

    async fn record_study_session(
        &self,
        new_session: NewStudySession,
    ) -> PortResult<StudySession> {
        let session = StudySession {
            id: Uuid::new_v4(),
            user_id: new_session.user_id,
            topic: new_session.topic.clone(),
            subject: new_session.subject.clone(),
            duration_minutes: new_session.duration_minutes,
            questions_answered: new_session.result.questions.len() as i32,
            materials_analyzed: if new_session.result.is_failed() {
                None
            } else {
                Some(serde_json::to_value(&new_session.result).unwrap())
            },
            created_at: Utc::now(),
        };
        self.sessions.lock().await.push(new_session);
        Ok(session)
    }

    async fn get_sessions_by_user(&self, _user_id: Uuid) -> PortResult<Vec<StudySession>> {
        Ok(Vec::new())
    }

    async fn get_progress_by_user(&self, _user_id: Uuid) -> PortResult<Vec<SubjectProgress>> {
        Ok(Vec::new())
    }

    async fn delete_user_data(&self, _user_id: Uuid) -> PortResult<()> {
        Ok(())
    }
}

/// Always answers with the configured result, like a canned model.
struct FakeAnalysis {
    result: AnalysisResult,
}

#[async_trait]
impl TextAnalysisService for FakeAnalysis {
    async fn analyze(&self, _request: &AnalysisRequest) -> AnalysisResult {
        self.result.clone()
    }
}

struct FakeMaterials {
    materials: BTreeMap<String, BTreeMap<String, String>>,
}

impl FakeMaterials {
    fn with_biology() -> Self {
        let mut topics = BTreeMap::new();
        topics.insert(
            "photosynthesis".to_string(),
            "Photosynthesis converts light to chemical energy.".to_string(),
        );
        let mut materials = BTreeMap::new();
        materials.insert("biology".to_string(), topics);
        Self { materials }
    }
}

#[async_trait]
impl MaterialStore for FakeMaterials {
    async fn lookup(&self, subject: &str, topic: &str) -> PortResult<String> {
        self.materials
            .get(subject)
            .and_then(|topics| topics.get(topic))
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("No stored material for {} / {}", subject, topic))
            })
    }

    async fn list(&self) -> PortResult<BTreeMap<String, Vec<String>>> {
        Ok(self
            .materials
            .iter()
            .map(|(subject, topics)| (subject.clone(), topics.keys().cloned().collect()))
            .collect())
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct TestApp {
    router: Router,
    db: Arc<FakeDb>,
    upload_dir: tempfile::TempDir,
}

fn test_config(upload_dir: &Path) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        materials_path: PathBuf::from("./unused.json"),
        upload_dir: upload_dir.to_path_buf(),
        openai_api_key: None,
        analysis_model: "test-model".to_string(),
        analysis_timeout: Duration::from_secs(5),
    }
}

fn build_app(analysis_result: AnalysisResult) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let db = Arc::new(FakeDb::default());
    let state = Arc::new(AppState {
        db: db.clone(),
        analysis: Arc::new(FakeAnalysis {
            result: analysis_result,
        }),
        materials: Arc::new(FakeMaterials::with_biology()),
        config: Arc::new(test_config(upload_dir.path())),
    });

    TestApp {
        router: router(state),
        db,
        upload_dir,
    }
}

fn one_question_result() -> AnalysisResult {
    AnalysisResult {
        summary: vec!["Light becomes chemical energy.".to_string()],
        questions: vec![QuizQuestion {
            question: "What does photosynthesis produce?".to_string(),
            options: vec![
                "A) Light".to_string(),
                "B) Glucose".to_string(),
                "C) Nitrogen".to_string(),
                "D) Heat".to_string(),
            ],
            correct: "B".to_string(),
        }],
        flashcards: vec![Flashcard {
            question: "Where does photosynthesis happen?".to_string(),
            answer: "In chloroplasts.".to_string(),
        }],
        error: None,
    }
}

const BOUNDARY: &str = "test-boundary";

fn file_part(filename: &str, content: &[u8]) -> Vec<u8> {
    let mut part = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, filename
    )
    .into_bytes();
    part.extend_from_slice(content);
    part.extend_from_slice(b"\r\n");
    part
}

fn text_part(name: &str, value: &str) -> Vec<u8> {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
    .into_bytes()
}

fn close_multipart(mut body: Vec<u8>) -> Vec<u8> {
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn analyze_request(body: Vec<u8>, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header("x-user-id", user_id.to_string())
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn spool_files_left(app: &TestApp) -> usize {
    std::fs::read_dir(app.upload_dir.path()).unwrap().count()
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn txt_upload_flows_through_analysis_and_recording() {
    let app = build_app(one_question_result());
    let user_id = Uuid::new_v4();

    let mut body = file_part(
        "notes.txt",
        "Photosynthesis converts light to chemical energy.".as_bytes(),
    );
    body.extend(text_part("subject", "biology"));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(close_multipart(body), user_id))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["summary"].as_array().unwrap().len(), 1);
    assert_eq!(json["questions"].as_array().unwrap().len(), 1);
    assert!(json.get("error").is_none());

    let sessions = app.db.sessions.lock().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_id, user_id);
    assert_eq!(sessions[0].topic, "notes.txt");
    assert_eq!(sessions[0].subject.as_deref(), Some("biology"));
    assert_eq!(sessions[0].duration_minutes, 1);
    assert_eq!(sessions[0].result.questions.len(), 1);

    drop(sessions);
    assert_eq!(spool_files_left(&app), 0);
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_anything_happens() {
    let app = build_app(one_question_result());

    let body = close_multipart(file_part("malware.exe", b"MZ..."));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(body, Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(app.db.sessions.lock().await.is_empty());
    assert_eq!(spool_files_left(&app), 0);
}

#[tokio::test]
async fn undecodable_text_fails_but_leaves_no_spool_file() {
    let app = build_app(one_question_result());

    // Invalid UTF-8 and unmapped in the legacy code page.
    let body = close_multipart(file_part("legacy.txt", &[0x81, 0x81, 0x81]));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(body, Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.db.sessions.lock().await.is_empty());
    assert_eq!(spool_files_left(&app), 0);
}

#[tokio::test]
async fn failed_analysis_still_records_the_session() {
    let app = build_app(AnalysisResult::failed("Analysis failed: connection refused"));

    let body = close_multipart(file_part("notes.txt", b"Some study text."));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(body, Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
    assert!(json["questions"].as_array().unwrap().is_empty());

    // Study time is tracked even though the analysis came back empty.
    let sessions = app.db.sessions.lock().await;
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].result.is_failed());
}

#[tokio::test]
async fn stored_material_is_resolved_by_subject_and_topic() {
    let app = build_app(one_question_result());

    let mut body = text_part("subject", "biology");
    body.extend(text_part("topic", "photosynthesis"));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(close_multipart(body), Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let sessions = app.db.sessions.lock().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].topic, "photosynthesis");
    assert_eq!(sessions[0].subject.as_deref(), Some("biology"));
}

#[tokio::test]
async fn missing_material_is_not_found_and_not_recorded() {
    let app = build_app(one_question_result());

    let mut body = text_part("subject", "biology");
    body.extend(text_part("topic", "mitosis"));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(close_multipart(body), Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.db.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn a_request_with_no_source_is_rejected() {
    let app = build_app(one_question_result());

    let body = close_multipart(text_part("subject", "biology"));
    let response = app
        .router
        .clone()
        .oneshot(analyze_request(body, Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.db.sessions.lock().await.is_empty());
}

#[tokio::test]
async fn a_request_without_the_user_header_is_rejected() {
    let app = build_app(one_question_result());

    let body = close_multipart(file_part("notes.txt", b"text"));
    let request = Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn materials_listing_reflects_the_store() {
    let app = build_app(one_question_result());

    let request = Request::builder()
        .uri("/materials")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["subjects"]["biology"][0], "photosynthesis");
}
