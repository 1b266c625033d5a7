pub mod analyze_task;
pub mod rest;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use state::AppState;

/// Maximum accepted upload size.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Builds the API router. Deployment-specific layers (CORS, Swagger UI)
/// are added by the binary on top of this.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(rest::analyze_handler))
        .route("/materials", get(rest::list_materials_handler))
        .route("/sessions", get(rest::list_sessions_handler))
        .route("/progress", get(rest::list_progress_handler))
        .route("/account/data", delete(rest::delete_account_data_handler))
        .route("/health", get(rest::health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(app_state)
}
