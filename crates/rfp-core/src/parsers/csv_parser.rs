//! CSV parser: a single table, UTF-8 with a Latin-1 fallback.

use std::collections::HashMap;

use crate::error::ParseError;

use super::{ParsedDoc, Parser};

pub struct CsvParser;

impl Parser for CsvParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
        let text = decode(bytes);
        let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(text.as_bytes());

        let mut table = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| ParseError::Malformed {
                format: "csv".to_string(),
                message: e.to_string(),
            })?;
            table.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(ParsedDoc {
            text,
            page_count: 1,
            metadata: HashMap::new(),
            tables: vec![table],
            sections: Vec::new(),
            was_ocr: false,
        })
    }
}

/// Decode bytes as UTF-8, falling back to Latin-1 (Windows-1252-adjacent)
/// on invalid sequences.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}
