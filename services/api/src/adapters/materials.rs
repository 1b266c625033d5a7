//! services/api/src/adapters/materials.rs
//!
//! This module contains the adapter for the static study-material store:
//! a JSON file mapping subject -> topic -> text. The file is re-read on
//! every call; the pipeline keeps no in-memory cache, so edits to the
//! file show up on the next request.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use study_assistant_core::ports::{MaterialStore, PortError, PortResult};

type Materials = BTreeMap<String, BTreeMap<String, String>>;

/// A `MaterialStore` backed by a single JSON file on disk.
pub struct JsonMaterialStore {
    path: PathBuf,
}

impl JsonMaterialStore {
    /// Creates a new `JsonMaterialStore`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A missing file behaves as an empty store; a malformed one is an error.
    async fn load(&self) -> PortResult<Materials> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| PortError::Unexpected(format!("invalid material store file: {}", e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Materials::new()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[async_trait]
impl MaterialStore for JsonMaterialStore {
    async fn lookup(&self, subject: &str, topic: &str) -> PortResult<String> {
        self.load()
            .await?
            .get(subject)
            .and_then(|topics| topics.get(topic))
            .cloned()
            .ok_or_else(|| {
                PortError::NotFound(format!("No stored material for {} / {}", subject, topic))
            })
    }

    async fn list(&self) -> PortResult<BTreeMap<String, Vec<String>>> {
        let materials = self.load().await?;
        Ok(materials
            .into_iter()
            .map(|(subject, topics)| (subject, topics.into_keys().collect()))
            .collect())
    }
}
