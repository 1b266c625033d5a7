//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_assistant_core::ports::{DatabaseService, MaterialStore, TextAnalysisService};

/// The shared application state, created once at startup and passed to all handlers.
///
/// Each request works against these ports independently; there is no
/// cross-request mutable state here beyond what the database itself holds.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub analysis: Arc<dyn TextAnalysisService>,
    pub materials: Arc<dyn MaterialStore>,
    pub config: Arc<Config>,
}
