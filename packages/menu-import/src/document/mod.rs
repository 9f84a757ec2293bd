//! Document text extraction.
//!
//! Converts uploaded bytes into a single text blob the model can read:
//! - xlsx: every sheet rendered as CSV under a `## Sheet: <name>` header
//! - csv: re-rendered as a padded pipe table
//! - json: pretty-printed
//! - md / txt: passed through, trimmed
//!
//! One global cap applies afterwards, whatever the format.

mod delimited;
mod spreadsheet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::types::config::MAX_TEXT_CHARS;
use crate::types::job::FileType;

pub use delimited::render_pipe_table;

/// What the extractor learned about the document while decoding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Number of sheets (xlsx only)
    pub sheet_count: Option<usize>,
    /// Data rows, summed across sheets
    pub row_count: Option<usize>,
    /// Header columns detected (csv only)
    pub header_count: Option<usize>,
    /// Characters before the cap was applied
    pub original_length: usize,
    pub truncated: bool,
}

/// Decoded document text plus metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Decode `bytes` according to a declared type string.
///
/// Unknown declared types fail with [`ImportError::UnsupportedFileType`]
/// before any decoding is attempted.
pub fn extract_text(bytes: &[u8], declared_type: &str) -> Result<ExtractedDocument> {
    let file_type: FileType = declared_type.parse()?;
    extract_document(bytes, file_type, MAX_TEXT_CHARS)
}

/// Decode `bytes` as `file_type` and cap the result at `max_chars`.
pub fn extract_document(
    bytes: &[u8],
    file_type: FileType,
    max_chars: usize,
) -> Result<ExtractedDocument> {
    let (text, mut metadata) = match file_type {
        FileType::Xlsx => spreadsheet::extract(bytes)?,
        FileType::Csv => delimited::extract(bytes)?,
        FileType::Json => extract_json(bytes)?,
        FileType::Md | FileType::Txt => extract_plain(bytes),
    };

    let (text, truncated, original_length) = cap_length(text, max_chars);
    metadata.original_length = original_length;
    metadata.truncated = truncated;

    if truncated {
        warn!(
            file_type = %file_type,
            original_length,
            max_chars,
            "Document text exceeded cap and was truncated"
        );
    }
    debug!(
        file_type = %file_type,
        chars = original_length.min(max_chars),
        rows = ?metadata.row_count,
        sheets = ?metadata.sheet_count,
        "Extracted document text"
    );

    Ok(ExtractedDocument { text, metadata })
}

fn extract_json(bytes: &[u8]) -> Result<(String, DocumentMetadata)> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| ImportError::Document(format!("invalid JSON document: {}", e)))?;
    let text = serde_json::to_string_pretty(&value)?;
    Ok((text, DocumentMetadata::default()))
}

fn extract_plain(bytes: &[u8]) -> (String, DocumentMetadata) {
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    (text, DocumentMetadata::default())
}

/// Truncate to `max_chars` characters. Returns (text, truncated, original_length).
fn cap_length(text: String, max_chars: usize) -> (String, bool, usize) {
    let original_length = text.chars().count();
    if original_length <= max_chars {
        return (text, false, original_length);
    }
    let truncated: String = text.chars().take(max_chars).collect();
    (truncated, true, original_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_oversized_input() {
        let input = "a".repeat(250_000);
        let doc = extract_text(input.as_bytes(), "txt").unwrap();

        assert!(doc.metadata.truncated);
        assert_eq!(doc.text.chars().count(), 200_000);
        assert_eq!(doc.metadata.original_length, 250_000);
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        let input = "é".repeat(10);
        let doc = extract_document(input.as_bytes(), FileType::Txt, 4).unwrap();
        assert_eq!(doc.text, "éééé");
        assert!(doc.metadata.truncated);
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        let doc = extract_text(b"\n\n  Burger 9.50\n  ", "md").unwrap();
        assert_eq!(doc.text, "Burger 9.50");
        assert!(!doc.metadata.truncated);
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let doc = extract_text(br#"{"drinks":[{"name":"Cola","price":2.5}]}"#, "json").unwrap();
        assert!(doc.text.contains("\n  \"drinks\": ["));
    }

    #[test]
    fn test_invalid_json_is_a_document_error() {
        let err = extract_text(b"{not json", "json").unwrap_err();
        assert!(matches!(err, ImportError::Document(_)));
    }

    #[test]
    fn test_unsupported_type_fails_fast() {
        let err = extract_text(b"%PDF-1.4", "pdf").unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFileType { file_type } if file_type == "pdf"));
    }

    #[test]
    fn test_invalid_xlsx_is_a_document_error() {
        let err = extract_text(b"definitely not a zip archive", "xlsx").unwrap_err();
        assert!(matches!(err, ImportError::Document(_)));
    }
}
