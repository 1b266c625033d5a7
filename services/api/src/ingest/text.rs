//! services/api/src/ingest/text.rs
//!
//! Plain-text decoding. Source documents are usually UTF-8, but older
//! ones were saved under Windows-1250, so decoding tries UTF-8 first and
//! falls back to the legacy code page. A file that survives neither is a
//! decode error; it must never come back as mojibake or empty text.

use std::path::Path;

use encoding_rs::WINDOWS_1250;

use super::IngestError;

pub(crate) fn read(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<String, IngestError> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            let (decoded, _, had_errors) = WINDOWS_1250.decode(bytes);
            if had_errors {
                Err(IngestError::Decode(
                    "text is neither valid UTF-8 nor Windows-1250".to_string(),
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}
