//! XLSX parser: one table per worksheet, cached formula values, blank
//! rows dropped.
//!
//! OOXML spreadsheets are a zip package of XML parts; this reads the
//! workbook/shared-strings/worksheet parts directly with `quick-xml`
//! rather than pulling in a dedicated spreadsheet crate, matching the
//! zip+quick-xml idiom the rest of this crate's document parsers use.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ParseError;

use super::{ParsedDoc, Parser, Table};

pub struct XlsxParser;

impl Parser for XlsxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
        let workbook = Workbook::read(bytes)?;

        let mut tables = Vec::with_capacity(workbook.sheets.len());
        let mut text_parts = Vec::new();
        for sheet in &workbook.sheets {
            let table = parse_sheet_xml(&sheet.xml, &workbook.shared_strings)?;
            for row in &table {
                text_parts.push(row.join(" "));
            }
            tables.push(table);
        }

        let mut metadata = HashMap::new();
        metadata.insert("sheet_names".to_string(), workbook.sheets.iter().map(|s| s.name.clone()).collect::<Vec<_>>().join(","));

        Ok(ParsedDoc {
            text: text_parts.join("\n"),
            page_count: workbook.sheets.len() as u32,
            metadata,
            tables,
            sections: Vec::new(),
            was_ocr: false,
        })
    }
}

/// A single worksheet: its declared name and raw XML bytes.
pub(super) struct SheetEntry {
    pub name: String,
    pub xml: Vec<u8>,
}

/// A parsed workbook package: ordered sheets plus the shared-strings table.
pub(super) struct Workbook {
    pub sheets: Vec<SheetEntry>,
    pub shared_strings: Vec<String>,
}

impl Workbook {
    pub(super) fn read(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ParseError::Malformed {
            format: "xlsx".to_string(),
            message: e.to_string(),
        })?;

        let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?;
        let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
        let shared_strings_xml = read_part(&mut archive, "xl/sharedStrings.xml").unwrap_or_default();

        let sheet_refs = parse_workbook_sheet_list(&workbook_xml)?;
        let rel_targets = parse_relationship_targets(&rels_xml);
        let shared_strings = parse_shared_strings(&shared_strings_xml)?;

        let mut sheets = Vec::with_capacity(sheet_refs.len());
        for (name, rel_id) in sheet_refs {
            let target = rel_targets.get(&rel_id).cloned().unwrap_or_else(|| format!("worksheets/sheet{}.xml", sheets.len() + 1));
            let path = format!("xl/{target}");
            let xml = read_part(&mut archive, &path)?;
            sheets.push(SheetEntry { name, xml });
        }

        Ok(Workbook { sheets, shared_strings })
    }
}

fn read_part(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, path: &str) -> Result<Vec<u8>, ParseError> {
    let mut file = archive.by_name(path).map_err(|e| ParseError::Malformed {
        format: "xlsx".to_string(),
        message: format!("missing part '{path}': {e}"),
    })?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(ParseError::Io)?;
    Ok(buf)
}

/// Parse `xl/workbook.xml`'s `<sheets><sheet name=".." r:id=".."/></sheets>`.
fn parse_workbook_sheet_list(xml: &[u8]) -> Result<Vec<(String, String)>, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut rel_id = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"name" => name = String::from_utf8_lossy(&attr.value).into_owned(),
                        b"id" => rel_id = String::from_utf8_lossy(&attr.value).into_owned(),
                        _ => {}
                    }
                }
                sheets.push((name, rel_id));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::Malformed {
                    format: "xlsx".to_string(),
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Parse `xl/_rels/workbook.xml.rels`: relationship id → target path.
fn parse_relationship_targets(xml: &[u8]) -> HashMap<String, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = String::from_utf8_lossy(&attr.value).into_owned(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).into_owned(),
                        _ => {}
                    }
                }
                if !id.is_empty() {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
        buf.clear();
    }

    targets
}

/// Parse `xl/sharedStrings.xml`'s `<si>` entries, concatenating `<t>` runs.
fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, ParseError> {
    if xml.is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"si" => {
                in_si = true;
                current.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"si" => {
                in_si = false;
                strings.push(std::mem::take(&mut current));
            }
            Ok(Event::Start(e)) if in_si && e.local_name().as_ref() == b"t" => in_t = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => in_t = false,
            Ok(Event::Text(t)) if in_si && in_t => {
                current.push_str(&t.unescape().unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::Malformed {
                    format: "xlsx".to_string(),
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    Ok(strings)
}

/// Parse one `xl/worksheets/sheetN.xml` part into a row-major table.
/// Blank rows (no non-empty cell) are dropped. Formula cells use their
/// cached `<v>` value.
pub(super) fn parse_sheet_xml(xml: &[u8], shared_strings: &[String]) -> Result<Table, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut table = Vec::new();
    let mut buf = Vec::new();

    let mut current_row: Vec<(u32, String)> = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut cell_col: u32 = 0;
    let mut in_value = false;
    let mut value_buf = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"row" => {
                current_row.clear();
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                cell_type = None;
                cell_col = 0;
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"t" => cell_type = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                        b"r" => cell_col = column_index(&String::from_utf8_lossy(&attr.value)),
                        _ => {}
                    }
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"v" || e.local_name().as_ref() == b"t" => {
                in_value = true;
                value_buf.clear();
            }
            Ok(Event::Text(t)) if in_value => {
                value_buf.push_str(&t.unescape().unwrap_or_default());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"v" || e.local_name().as_ref() == b"t" => {
                in_value = false;
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"c" => {
                let resolved = match cell_type.as_deref() {
                    Some("s") => value_buf
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default(),
                    _ => std::mem::take(&mut value_buf),
                };
                current_row.push((cell_col, resolved));
                value_buf.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"row" => {
                let row = materialize_row(&current_row);
                if row.iter().any(|cell| !cell.trim().is_empty()) {
                    table.push(row);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ParseError::Malformed {
                    format: "xlsx".to_string(),
                    message: e.to_string(),
                })
            }
        }
        buf.clear();
    }

    Ok(table)
}

/// Fill gaps between sparse cell references with empty strings so the row
/// is dense and positionally correct.
fn materialize_row(cells: &[(u32, String)]) -> Vec<String> {
    let width = cells.iter().map(|(col, _)| *col + 1).max().unwrap_or(0);
    let mut row = vec![String::new(); width as usize];
    for (col, value) in cells {
        row[*col as usize] = value.clone();
    }
    row
}

/// Parse an `A1`-style cell reference's column letters into a zero-based index.
fn column_index(reference: &str) -> u32 {
    let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    letters.chars().fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_parses_single_and_double_letters() {
        assert_eq!(column_index("A1"), 0);
        assert_eq!(column_index("C5"), 2);
        assert_eq!(column_index("AA1"), 26);
    }

    #[test]
    fn materialize_row_fills_gaps_with_empty_strings() {
        let row = materialize_row(&[(0, "a".to_string()), (2, "c".to_string())]);
        assert_eq!(row, vec!["a".to_string(), String::new(), "c".to_string()]);
    }

    #[test]
    fn parse_sheet_xml_drops_blank_rows() {
        let xml = br#"<sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c></row>
            <row r="2"></row>
            <row r="3"><c r="A3"><v>42</v></c></row>
        </sheetData>"#;
        let shared = vec!["Header".to_string()];
        let table = parse_sheet_xml(xml, &shared).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0][0], "Header");
        assert_eq!(table[1][0], "42");
    }
}
