//! services/api/src/ingest/docx.rs
//!
//! DOCX text extraction. A DOCX file is a ZIP archive whose main content
//! lives in `word/document.xml`; text runs (`w:t`) are collected in
//! document order, one line per paragraph (`w:p`).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::IngestError;

pub(crate) fn read(path: &Path) -> Result<String, IngestError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| IngestError::Decode(format!("not a DOCX archive: {}", e)))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| IngestError::Decode(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut document_xml)
        .map_err(|e| IngestError::Decode(format!("unreadable word/document.xml: {}", e)))?;

    parse_document_xml(&document_xml)
}

fn parse_document_xml(xml: &str) -> Result<String, IngestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let run = t
                    .unescape()
                    .map_err(|e| IngestError::Decode(format!("invalid document.xml: {}", e)))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IngestError::Decode(format!("invalid document.xml: {}", e)))
            }
            _ => {}
        }
    }

    Ok(text)
}
