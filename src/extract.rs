//! Per-format text extraction for source documents.
//!
//! The ingestion pipeline hands this module a file path; dispatch is by
//! extension. Structured JSON is flattened to its string leaf values, PDF
//! and DOCX go through their respective text layers, and everything else is
//! read as plain UTF-8 text. Extraction failures are returned to the
//! pipeline, which skips the file and keeps going.

use std::io::Read;
use std::path::Path;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb
/// protection for DOCX archives).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. Never panics; the pipeline logs and skips the file.
#[derive(Debug)]
pub enum ExtractError {
    Unreadable(String),
    Json(String),
    Pdf(String),
    Docx(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unreadable(e) => write!(f, "unreadable file: {}", e),
            ExtractError::Json(e) => write!(f, "JSON extraction failed: {}", e),
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Docx(e) => write!(f, "DOCX extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract plain text from a source file, dispatching on its extension.
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| ExtractError::Unreadable(e.to_string()))?;
            extract_json(&raw)
        }
        "pdf" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
            extract_pdf(&bytes)
        }
        "docx" => {
            let bytes = std::fs::read(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;
            extract_docx(&bytes)
        }
        _ => std::fs::read_to_string(path).map_err(|e| ExtractError::Unreadable(e.to_string())),
    }
}

/// Flatten a JSON document to its string leaf values, joined with spaces.
/// Keys, numbers, and booleans carry no prose and are dropped.
pub fn extract_json(raw: &str) -> Result<String, ExtractError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ExtractError::Json(e.to_string()))?;
    let mut leaves = Vec::new();
    collect_string_leaves(&value, &mut leaves);
    Ok(leaves.join(" "))
}

fn collect_string_leaves(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_string_leaves(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_string_leaves(item, out);
            }
        }
        _ => {}
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Docx(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Docx(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Docx(
            "word/document.xml not found".to_string(),
        ));
    }
    extract_w_t_elements(&doc_xml)
}

/// Pull the text runs (`<w:t>` elements) out of a DOCX document body.
fn extract_w_t_elements(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        if !out.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_flattens_string_leaves() {
        let raw = r#"{
            "name": "Nutri Coach",
            "age": 34,
            "goals": ["lose weight", "eat better"],
            "profile": { "bio": "busy parent", "active": true }
        }"#;
        let text = extract_json(raw).unwrap();
        assert!(text.contains("Nutri Coach"));
        assert!(text.contains("lose weight"));
        assert!(text.contains("eat better"));
        assert!(text.contains("busy parent"));
        // Non-string scalars are dropped.
        assert!(!text.contains("34"));
        assert!(!text.contains("true"));
    }

    #[test]
    fn test_json_invalid_returns_error() {
        let err = extract_json("not json").unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
    }

    #[test]
    fn test_plain_text_fallback() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(b"plain body text").unwrap();
        let text = extract_file(f.path()).unwrap();
        assert_eq!(text, "plain body text");
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let mut f = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        f.write_all(b"not a pdf").unwrap();
        let err = extract_file(f.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn test_invalid_docx_returns_error() {
        let mut f = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        f.write_all(b"not a zip").unwrap();
        let err = extract_file(f.path()).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = extract_file(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }
}
