//! PPTX parser: one logical "page" per slide; table shapes are extracted.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParseError;

use super::{ParsedDoc, Parser, Table};

pub struct PptxParser;

impl Parser for PptxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ParseError::Malformed {
            format: "pptx".to_string(),
            message: e.to_string(),
        })?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(String::from)
            .collect();
        slide_names.sort_by_key(|name| slide_number(name));

        let mut text_parts = Vec::with_capacity(slide_names.len());
        let mut tables = Vec::new();

        for name in &slide_names {
            let mut xml = Vec::new();
            archive
                .by_name(name)
                .map_err(|e| ParseError::Malformed {
                    format: "pptx".to_string(),
                    message: e.to_string(),
                })?
                .read_to_end(&mut xml)
                .map_err(ParseError::Io)?;

            let slide = parse_slide(&xml)?;
            text_parts.push(slide.text);
            tables.extend(slide.tables);
        }

        Ok(ParsedDoc {
            text: text_parts.join("\n\n"),
            page_count: slide_names.len() as u32,
            metadata: HashMap::new(),
            tables,
            sections: Vec::new(),
            was_ocr: false,
        })
    }
}

fn slide_number(name: &str) -> u32 {
    name.trim_start_matches("ppt/slides/slide")
        .trim_end_matches(".xml")
        .parse()
        .unwrap_or(u32::MAX)
}

struct Slide {
    text: String,
    tables: Vec<Table>,
}

fn parse_slide(xml: &[u8]) -> Result<Slide, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut text_parts = Vec::new();
    let mut in_text = false;

    let mut tables = Vec::new();
    let mut in_table = false;
    let mut current_table: Option<Table> = None;
    let mut current_row: Option<Vec<String>> = None;
    let mut current_cell = String::new();

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
                    row.push(std::mem::take(&mut current_cell));
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_text = false,
            Ok(Event::Text(t)) if in_text => {
                let decoded = t.unescape().unwrap_or_default().into_owned();
                if in_table {
                    current_cell.push_str(&decoded);
                } else {
                    text_parts.push(decoded);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::Malformed {
                    format: "pptx".to_string(),
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    Ok(Slide {
        text: text_parts.join(" "),
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_number_parses_numeric_suffix() {
        assert_eq!(slide_number("ppt/slides/slide1.xml"), 1);
        assert_eq!(slide_number("ppt/slides/slide12.xml"), 12);
    }

    #[test]
    fn parse_slide_collects_shape_text_and_table() {
        let xml = br#"<p:sld><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>Title slide</a:t></a:r></a:p></p:txBody></p:sp>
            <a:tbl>
                <a:tr><a:tc><a:txBody><a:p><a:r><a:t>Col A</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
            </a:tbl>
        </p:spTree></p:cSld></p:sld>"#;
        let slide = parse_slide(xml).unwrap();
        assert_eq!(slide.text, "Title slide");
        assert_eq!(slide.tables.len(), 1);
        assert_eq!(slide.tables[0][0], vec!["Col A".to_string()]);
    }
}
