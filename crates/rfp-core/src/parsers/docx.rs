//! DOCX parser: paragraph/heading walk builds `sections`, tables are
//! extracted as row-major strings.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParseError;

use super::{ParsedDoc, Parser, Section, Table};

pub struct DocxParser;

impl Parser for DocxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ParseError::Malformed {
            format: "docx".to_string(),
            message: e.to_string(),
        })?;

        let mut document_xml = Vec::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ParseError::Malformed {
                format: "docx".to_string(),
                message: format!("missing word/document.xml: {e}"),
            })?
            .read_to_end(&mut document_xml)
            .map_err(ParseError::Io)?;

        let body = parse_body(&document_xml)?;

        let text = body
            .sections
            .iter()
            .map(|s| format!("{}\n{}", s.heading, s.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ParsedDoc {
            text,
            page_count: 1,
            metadata: HashMap::new(),
            tables: body.tables,
            sections: body.sections,
            was_ocr: false,
        })
    }
}

struct Body {
    sections: Vec<Section>,
    tables: Vec<Table>,
}

/// Heading style IDs that map paragraph style → heading level, per the
/// default Word style naming convention (`Heading1`..`Heading6`).
fn heading_level(style_id: &str) -> Option<u8> {
    style_id.strip_prefix("Heading").and_then(|n| n.trim().parse::<u8>().ok()).filter(|lvl| *lvl <= 6)
}

fn parse_body(xml: &[u8]) -> Result<Body, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut sections = Vec::new();
    let mut current_heading = String::new();
    let mut current_level: u8 = 0;
    let mut current_content = String::new();

    let mut tables = Vec::new();
    let mut current_table: Option<Table> = None;
    let mut current_row: Option<Vec<String>> = None;
    let mut current_cell_text = String::new();
    let mut in_table = false;

    let mut paragraph_style: Option<String> = None;
    let mut paragraph_text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"tbl" => {
                in_table = true;
                current_table = Some(Vec::new());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"tbl" => {
                in_table = false;
                if let Some(table) = current_table.take() {
                    tables.push(table);
                }
            }
            Ok(Event::Start(e)) if in_table && e.local_name().as_ref() == b"tr" => {
                current_row = Some(Vec::new());
            }
            Ok(Event::End(e)) if in_table && e.local_name().as_ref() == b"tr" => {
                if let (Some(row), Some(table)) = (current_row.take(), current_table.as_mut()) {
                    table.push(row);
                }
            }
            Ok(Event::End(e)) if in_table && e.local_name().as_ref() == b"tc" => {
                if let Some(row) = current_row.as_mut() {
                    row.push(std::mem::take(&mut current_cell_text));
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"pStyle" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"val" {
                        paragraph_style = Some(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"pStyle" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"val" {
                        paragraph_style = Some(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Text(t)) if in_text => {
                let decoded = t.unescape().unwrap_or_default().into_owned();
                if in_table {
                    current_cell_text.push_str(&decoded);
                } else {
                    paragraph_text.push_str(&decoded);
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"p" && !in_table => {
                paragraph_style = None;
                paragraph_text.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" && !in_table => {
                let level = paragraph_style.as_deref().and_then(heading_level);
                match level {
                    Some(level) => {
                        if !current_heading.is_empty() || !current_content.trim().is_empty() {
                            sections.push(Section {
                                heading: std::mem::take(&mut current_heading),
                                level: current_level,
                                content: std::mem::take(&mut current_content),
                            });
                        }
                        current_heading = paragraph_text.clone();
                        current_level = level;
                    }
                    None => {
                        if !paragraph_text.trim().is_empty() {
                            current_content.push_str(&paragraph_text);
                            current_content.push('\n');
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::Malformed {
                    format: "docx".to_string(),
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    if !current_heading.is_empty() || !current_content.trim().is_empty() {
        sections.push(Section {
            heading: current_heading,
            level: current_level,
            content: current_content,
        });
    }

    Ok(Body { sections, tables })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_level_parses_word_default_style_ids() {
        assert_eq!(heading_level("Heading1"), Some(1));
        assert_eq!(heading_level("Heading6"), Some(6));
        assert_eq!(heading_level("Heading7"), None);
        assert_eq!(heading_level("Normal"), None);
    }

    #[test]
    fn parse_body_groups_paragraphs_under_headings() {
        let xml = br#"<w:document><w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Scope</w:t></w:r></w:p>
            <w:p><w:r><w:t>This document covers scope.</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let body = parse_body(xml).unwrap();
        assert_eq!(body.sections.len(), 1);
        assert_eq!(body.sections[0].heading, "Scope");
        assert!(body.sections[0].content.contains("covers scope"));
    }

    #[test]
    fn parse_body_extracts_table_rows() {
        let xml = br#"<w:document><w:body>
            <w:tbl>
                <w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Score</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Acme</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>9</w:t></w:r></w:p></w:tc></w:tr>
            </w:tbl>
        </w:body></w:document>"#;
        let body = parse_body(xml).unwrap();
        assert_eq!(body.tables.len(), 1);
        assert_eq!(body.tables[0][0], vec!["Name".to_string(), "Score".to_string()]);
        assert_eq!(body.tables[0][1], vec!["Acme".to_string(), "9".to_string()]);
    }
}
