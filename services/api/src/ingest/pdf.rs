//! services/api/src/ingest/pdf.rs
//!
//! PDF text extraction, page by page. A page that yields no text (scanned
//! image, broken content stream) contributes an empty line instead of
//! failing the whole document; a file that cannot be opened at all does fail.

use std::path::Path;

use lopdf::Document;

use super::IngestError;

pub(crate) fn read(path: &Path) -> Result<String, IngestError> {
    let document = Document::load(path)
        .map_err(|e| IngestError::Decode(format!("failed to open PDF: {}", e)))?;

    let mut text = String::new();
    for (page_number, _page_id) in document.get_pages() {
        let page_text = document.extract_text(&[page_number]).unwrap_or_default();
        text.push_str(&page_text);
        text.push('\n');
    }
    Ok(text)
}
