//! Document parsers (L4) and extension-based dispatch (L5).
//!
//! Every parser returns a [`ParsedDoc`], regardless of source format, so
//! everything downstream (chunking, classification, extraction) is
//! format-agnostic.

pub mod csv_parser;
pub mod docx;
pub mod gsheet;
#[cfg(feature = "ocr")]
pub mod ocr;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

use std::path::Path;

use crate::error::ParseError;
use crate::models::FileType;

/// A table extracted from a document, row-major. Empty cells are empty
/// strings, never `null` — this keeps downstream equality checks clean.
pub type Table = Vec<Vec<String>>;

/// A heading-delimited section of a document's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub level: u8,
    pub content: String,
}

/// The normalized output of every parser.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDoc {
    pub text: String,
    pub page_count: u32,
    pub metadata: std::collections::HashMap<String, String>,
    pub tables: Vec<Table>,
    pub sections: Vec<Section>,
    pub was_ocr: bool,
}

/// Implemented by every concrete document parser.
pub trait Parser {
    /// Parse raw document bytes into a [`ParsedDoc`].
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError>;
}

const SUPPORTED_EXTENSIONS: &str = "pdf, docx, xlsx, csv, pptx";

/// Dispatch on a filename's extension to the matching parser and parse
/// `bytes`. Returns [`ParseError::UnsupportedFormat`] for anything else.
pub fn parse_document(filename: &str, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => pdf::PdfParser::default().parse(bytes),
        "docx" => docx::DocxParser.parse(bytes),
        "xlsx" => xlsx::XlsxParser.parse(bytes),
        "csv" => csv_parser::CsvParser.parse(bytes),
        "pptx" => pptx::PptxParser.parse(bytes),
        other => Err(ParseError::UnsupportedFormat {
            extension: other.to_string(),
            supported: SUPPORTED_EXTENSIONS.to_string(),
        }),
    }
}

/// Map a [`FileType`] back to the canonical extension used for dispatch and
/// for naming generated artifacts.
pub fn extension_for(file_type: FileType) -> &'static str {
    file_type.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_lists_supported_formats() {
        let err = parse_document("ransom.note", b"").unwrap_err();
        match err {
            ParseError::UnsupportedFormat { extension, supported } => {
                assert_eq!(extension, "note");
                assert!(supported.contains("pdf"));
            }
            _ => panic!("expected UnsupportedFormat"),
        }
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        let result = parse_document("doc.CSV", b"a,b\n1,2\n");
        assert!(result.is_ok());
    }
}
