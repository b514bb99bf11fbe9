//! In-memory worksheet model shared by structure detection, question
//! extraction, and answer write-back.
//!
//! This is a richer representation than [`crate::parsers::xlsx`]'s plain
//! table: it keeps formula/merge metadata the write-back step needs, at
//! the cost of re-reading the worksheet XML independently rather than
//! reusing the document parser's table output.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::SpreadsheetError;

/// A single worksheet cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: String,
    pub is_formula: bool,
}

/// An inclusive merged-cell range, zero-based rows/columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl MergeRange {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        row == self.start_row && col == self.start_col
    }

    pub fn column_span(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    pub fn is_horizontal(&self) -> bool {
        self.start_row == self.end_row
    }
}

/// One worksheet: a dense row-major cell grid plus its merge ranges.
#[derive(Debug, Clone, Default)]
pub struct SheetModel {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub merges: Vec<MergeRange>,
}

impl SheetModel {
    pub fn max_row(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn max_col(&self) -> u32 {
        self.rows.iter().map(|r| r.len() as u32).max().unwrap_or(0)
    }

    /// Cell value at zero-based `(row, col)`, or empty if out of range.
    pub fn cell(&self, row: u32, col: u32) -> Cell {
        self.rows
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// The merge range covering `(row, col)`, if any.
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.merges.iter().find(|m| m.contains(row, col))
    }
}

/// Convert a zero-based column index to spreadsheet letters (`0` → `"A"`).
pub fn col_letter(mut index: u32) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Convert spreadsheet column letters to a zero-based index (`"A"` → `0`).
pub fn col_index(letters: &str) -> u32 {
    letters
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .fold(0u32, |acc, c| acc * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
        .saturating_sub(1)
}

/// Parse an `A1`-style cell reference into zero-based `(row, col)`.
pub fn parse_reference(reference: &str) -> Option<(u32, u32)> {
    let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = reference.chars().skip_while(|c| c.is_ascii_alphabetic()).collect();
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col_index(&letters)))
}

/// Load every worksheet from raw xlsx bytes into [`SheetModel`]s, in
/// workbook-declared order.
pub fn load_workbook(bytes: &[u8]) -> Result<Vec<SheetModel>, SpreadsheetError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?;
    let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let shared_strings_xml = read_part(&mut archive, "xl/sharedStrings.xml").unwrap_or_default();

    let sheet_refs = parse_sheet_list(&workbook_xml)?;
    let targets = parse_relationship_targets(&rels_xml);
    let shared_strings = parse_shared_strings(&shared_strings_xml)?;

    let mut sheets = Vec::with_capacity(sheet_refs.len());
    for (index, (name, rel_id)) in sheet_refs.into_iter().enumerate() {
        let target = targets.get(&rel_id).cloned().unwrap_or_else(|| format!("worksheets/sheet{}.xml", index + 1));
        let xml = read_part(&mut archive, &format!("xl/{target}"))?;
        sheets.push(parse_sheet(&name, &xml, &shared_strings)?);
    }

    Ok(sheets)
}

fn read_part(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, path: &str) -> Result<Vec<u8>, SpreadsheetError> {
    let mut file = archive.by_name(path).map_err(|e| SpreadsheetError::Package(format!("missing part '{path}': {e}")))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
    Ok(buf)
}

fn parse_sheet_list(xml: &[u8]) -> Result<Vec<(String, String)>, SpreadsheetError> {
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
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }
    Ok(sheets)
}

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

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, SpreadsheetError> {
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
            Ok(Event::Text(t)) if in_si && in_t => current.push_str(&t.unescape().unwrap_or_default()),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }
    Ok(strings)
}

fn parse_sheet(name: &str, xml: &[u8], shared_strings: &[String]) -> Result<SheetModel, SpreadsheetError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut merges = Vec::new();

    let mut current_row: Vec<(u32, Cell)> = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut cell_col: u32 = 0;
    let mut cell_is_formula = false;
    let mut in_value = false;
    let mut value_buf = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"mergeCell" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"ref" {
                        let reference = String::from_utf8_lossy(&attr.value).into_owned();
                        if let Some((start, end)) = reference.split_once(':') {
                            if let (Some((sr, sc)), Some((er, ec))) = (parse_reference(start), parse_reference(end)) {
                                merges.push(MergeRange {
                                    start_row: sr,
                                    start_col: sc,
                                    end_row: er,
                                    end_col: ec,
                                });
                            }
                        }
                    }
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"row" => {
                current_row.clear();
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                cell_type = None;
                cell_col = 0;
                cell_is_formula = false;
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"t" => cell_type = Some(String::from_utf8_lossy(&attr.value).into_owned()),
                        b"r" => cell_col = parse_reference(&String::from_utf8_lossy(&attr.value)).map(|(_, c)| c).unwrap_or(0),
                        _ => {}
                    }
                }
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"f" => cell_is_formula = true,
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"v" || e.local_name().as_ref() == b"t" => {
                in_value = true;
                value_buf.clear();
            }
            Ok(Event::Text(t)) if in_value => value_buf.push_str(&t.unescape().unwrap_or_default()),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"v" || e.local_name().as_ref() == b"t" => in_value = false,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"c" => {
                let resolved = match cell_type.as_deref() {
                    Some("s") => value_buf.trim().parse::<usize>().ok().and_then(|i| shared_strings.get(i).cloned()).unwrap_or_default(),
                    _ => std::mem::take(&mut value_buf),
                };
                current_row.push((
                    cell_col,
                    Cell {
                        value: resolved,
                        is_formula: cell_is_formula,
                    },
                ));
                value_buf.clear();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"row" => {
                let width = current_row.iter().map(|(c, _)| *c + 1).max().unwrap_or(0);
                let mut row = vec![Cell::default(); width as usize];
                for (col, cell) in &current_row {
                    row[*col as usize] = cell.clone();
                }
                rows.push(row);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }

    Ok(SheetModel {
        name: name.to_string(),
        rows,
        merges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn col_letter_round_trips_with_col_index() {
        for i in [0, 1, 25, 26, 27, 51, 52, 701] {
            assert_eq!(col_index(&col_letter(i)), i);
        }
    }

    #[test]
    fn parse_reference_is_zero_based() {
        assert_eq!(parse_reference("A1"), Some((0, 0)));
        assert_eq!(parse_reference("C5"), Some((4, 2)));
    }

    #[test]
    fn merge_range_contains_and_anchor() {
        let range = MergeRange {
            start_row: 2,
            start_col: 0,
            end_row: 2,
            end_col: 3,
        };
        assert!(range.contains(2, 1));
        assert!(!range.contains(3, 1));
        assert!(range.is_anchor(2, 0));
        assert!(!range.is_anchor(2, 1));
        assert_eq!(range.column_span(), 4);
        assert!(range.is_horizontal());
    }
}
