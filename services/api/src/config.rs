//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. There is no ambient global state: the
//! loaded `Config` is passed by reference into every adapter that needs it.

use std::path::PathBuf;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// JSON file holding the static subject/topic study materials.
    pub materials_path: PathBuf,
    /// Directory for per-request upload spool files.
    pub upload_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub analysis_model: String,
    /// Upper bound on one analysis round trip.
    pub analysis_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let materials_path = std::env::var("MATERIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./study_materials.json"));

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        // --- Load API Key (as optional; checked when the client is built) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let analysis_model =
            std::env::var("ANALYSIS_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let timeout_str =
            std::env::var("ANALYSIS_TIMEOUT_SECS").unwrap_or_else(|_| "60".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "ANALYSIS_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a number of seconds", timeout_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            materials_path,
            upload_dir,
            openai_api_key,
            analysis_model,
            analysis_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
