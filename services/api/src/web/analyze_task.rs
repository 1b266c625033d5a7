//! services/api/src/web/analyze_task.rs
//!
//! This module contains the worker function responsible for one full
//! document-analysis cycle: resolve the text source, extract plain text,
//! run the analysis, and record the study session.
//!
//! A failed analysis does not abort the cycle - the session is still
//! recorded (with no stored payload) so the user's study time is kept.
//! Everything before the analysis step fails the request outright and
//! leaves no state behind.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use std::io::Write;
use tokio::task;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::ingest::{self, DocumentKind, IngestError};
use crate::web::state::AppState;
use study_assistant_core::{
    domain::{AnalysisResult, NewStudySession},
    prompt,
};

/// Where the study text for one request comes from.
///
/// Exactly one source per request: an uploaded document, or a reference
/// into the static material store.
pub enum AnalysisSource {
    Upload {
        filename: String,
        bytes: Bytes,
        subject: Option<String>,
    },
    Material {
        subject: String,
        topic: String,
    },
}

/// The main task for handling a single analysis request.
pub async fn run_analysis(
    app_state: Arc<AppState>,
    user_id: Uuid,
    source: AnalysisSource,
) -> Result<AnalysisResult, ApiError> {
    let started = Instant::now();

    let (text, topic, subject) = match source {
        AnalysisSource::Upload {
            filename,
            bytes,
            subject,
        } => {
            // Resolve the format from the declared extension before any
            // byte of the upload touches disk.
            let kind = DocumentKind::from_filename(&filename)
                .ok_or_else(|| ApiError::Ingest(IngestError::Unsupported(filename.clone())))?;

            let upload_dir = app_state.config.upload_dir.clone();
            let text = task::spawn_blocking(move || extract_upload(&upload_dir, kind, &bytes))
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))??;

            info!(
                "extracted {} characters from upload '{}'",
                text.chars().count(),
                filename
            );
            (text, filename, subject)
        }
        AnalysisSource::Material { subject, topic } => {
            let text = app_state.materials.lookup(&subject, &topic).await?;
            info!("using stored material {} / {}", subject, topic);
            (text, topic, Some(subject))
        }
    };

    let request = prompt::build_request(&text);
    let result = app_state.analysis.analyze(&request).await;
    if let Some(error) = &result.error {
        warn!("analysis returned an error marker: {}", error);
    }

    // Wall-clock time floored to whole minutes, never less than 1.
    let duration_minutes = (started.elapsed().as_secs() / 60).max(1) as i32;

    app_state.db.get_or_create_user(user_id).await?;
    app_state
        .db
        .record_study_session(NewStudySession {
            user_id,
            topic,
            subject,
            duration_minutes,
            result: result.clone(),
        })
        .await?;

    Ok(result)
}

/// Spools the upload into a scoped temporary file and extracts its text.
///
/// The spool file is tied to the `NamedTempFile` guard and is removed when
/// this function returns, on the success and failure paths alike.
fn extract_upload(
    upload_dir: &Path,
    kind: DocumentKind,
    bytes: &[u8],
) -> Result<String, IngestError> {
    std::fs::create_dir_all(upload_dir)?;
    let mut spool = tempfile::NamedTempFile::new_in(upload_dir)?;
    spool.write_all(bytes)?;
    spool.flush()?;
    ingest::extract_text(spool.path(), kind)
}
