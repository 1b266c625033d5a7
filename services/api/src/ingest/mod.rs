//! services/api/src/ingest/mod.rs
//!
//! Turns an uploaded document into plain text. Format support is a fixed
//! allow-set keyed on the declared file extension; anything else is
//! rejected here, before a single byte of the file is inspected.

mod docx;
mod pdf;
mod text;

use std::path::Path;

/// Errors produced while converting an upload into plain text.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
    #[error("Failed to decode document: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Maps a bare extension (without the dot) onto a supported format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    /// Resolves the format from a full filename, e.g. `notes.txt`.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        Self::from_extension(extension)
    }
}

/// Extracts the plain text of the document at `path`.
///
/// The file's lifecycle (creation, cleanup) belongs to the caller; this
/// function only reads.
pub fn extract_text(path: &Path, kind: DocumentKind) -> Result<String, IngestError> {
    match kind {
        DocumentKind::Text => text::read(path),
        DocumentKind::Pdf => pdf::read(path),
        DocumentKind::Docx => docx::read(path),
    }
}
