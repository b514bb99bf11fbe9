//! Answer write-back (L10): patch a worksheet's response/score cells in
//! place and return a report of what changed.
//!
//! This works directly on the xlsx zip package rather than through
//! [`super::model::SheetModel`], since write-back has to preserve every
//! other part of the package (styles, other sheets, shared strings) byte
//! for byte and only touch the target worksheet.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::SpreadsheetError;

use super::model::{col_index, load_workbook, parse_reference};

/// A single answer (and optional score) to write into a worksheet row.
#[derive(Debug, Clone)]
pub struct AnswerWrite {
    pub row: u32,
    pub response_col_letter: String,
    pub answer: String,
    pub score: Option<f64>,
    pub score_col_letter: Option<String>,
}

/// What happened when [`write_answers`] applied a batch of writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: usize,
    pub unmerged: usize,
    pub skipped_formula: usize,
}

/// Write `answers` into `sheet_name` of the workbook at `bytes`, returning
/// the modified package bytes and a report of what happened.
pub fn write_answers(bytes: &[u8], sheet_name: &str, answers: &[AnswerWrite]) -> Result<(Vec<u8>, WriteReport), SpreadsheetError> {
    let sheets = load_workbook(bytes)?;
    let sheet = sheets
        .iter()
        .find(|s| s.name == sheet_name)
        .ok_or_else(|| SpreadsheetError::SheetNotFound {
            sheet: sheet_name.to_string(),
        })?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")?;
    let rels_xml = read_part(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let sheet_path = resolve_sheet_path(&workbook_xml, &rels_xml, sheet_name)?;

    let mut cell_writes: HashMap<(u32, u32), CellWrite> = HashMap::new();
    let mut remove_ranges: HashSet<(u32, u32, u32, u32)> = HashSet::new();
    let mut report = WriteReport::default();

    for answer in answers {
        let response_col = col_index(&answer.response_col_letter);
        mark_unmerge(sheet, answer.row, response_col, &mut remove_ranges, &mut report);
        cell_writes.insert(
            (answer.row, response_col),
            CellWrite {
                text: answer.answer.clone(),
            },
        );
        report.written += 1;

        if let (Some(score), Some(score_col_letter)) = (answer.score, &answer.score_col_letter) {
            let score_col = col_index(score_col_letter);
            let is_formula = sheet.cell(answer.row, score_col).is_formula;
            if is_formula {
                report.skipped_formula += 1;
            } else {
                mark_unmerge(sheet, answer.row, score_col, &mut remove_ranges, &mut report);
                cell_writes.insert(
                    (answer.row, score_col),
                    CellWrite {
                        text: format_score(score),
                    },
                );
            }
        }
    }

    let style_index = match read_part(&mut archive, "xl/styles.xml") {
        Ok(xml) => Some(ensure_wrap_style(&xml)?),
        Err(_) => None,
    };

    let rewritten_sheet = rewrite_sheet_xml(&read_part(&mut archive, &sheet_path)?, &cell_writes, &remove_ranges, style_index.as_ref().map(|(_, idx)| *idx))?;

    let mut output = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut output);
        let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            let name = entry.name().to_string();
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf).map_err(|e| SpreadsheetError::Package(e.to_string()))?;

            let bytes_to_write: Vec<u8> = if name == sheet_path {
                rewritten_sheet.clone()
            } else if name == "xl/styles.xml" {
                match &style_index {
                    Some((xml, _)) => xml.clone(),
                    None => buf,
                }
            } else {
                buf
            };

            writer.start_file(&name, options).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            writer.write_all(&bytes_to_write).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
        }

        writer.finish().map_err(|e| SpreadsheetError::Package(e.to_string()))?;
    }

    Ok((output.into_inner(), report))
}

struct CellWrite {
    text: String,
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score}")
    }
}

/// Unmerge the range covering `(row, col)`, if any -- writing to either the
/// anchor cell or any other member of a merged range splits the merge, since
/// the written value must not silently apply to the whole range.
fn mark_unmerge(sheet: &super::model::SheetModel, row: u32, col: u32, remove: &mut HashSet<(u32, u32, u32, u32)>, report: &mut WriteReport) {
    if let Some(range) = sheet.merge_at(row, col) {
        let key = (range.start_row, range.start_col, range.end_row, range.end_col);
        if remove.insert(key) {
            report.unmerged += 1;
        }
    }
}

fn read_part(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, path: &str) -> Result<Vec<u8>, SpreadsheetError> {
    let mut file = archive.by_name(path).map_err(|e| SpreadsheetError::Package(format!("missing part '{path}': {e}")))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
    Ok(buf)
}

fn resolve_sheet_path(workbook_xml: &[u8], rels_xml: &[u8], sheet_name: &str) -> Result<String, SpreadsheetError> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut rel_id = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let mut name = String::new();
                let mut id = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"name" => name = String::from_utf8_lossy(&attr.value).into_owned(),
                        b"id" => id = String::from_utf8_lossy(&attr.value).into_owned(),
                        _ => {}
                    }
                }
                if name == sheet_name {
                    rel_id = Some(id);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }

    let rel_id = rel_id.ok_or_else(|| SpreadsheetError::SheetNotFound {
        sheet: sheet_name.to_string(),
    })?;

    let mut reader = Reader::from_reader(rels_xml);
    reader.config_mut().trim_text(true);
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
                if id == rel_id {
                    return Ok(format!("xl/{target}"));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }

    Err(SpreadsheetError::SheetNotFound {
        sheet: sheet_name.to_string(),
    })
}

/// Append a wrap-text + top-vertical-alignment `<xf>` to `styles.xml`'s
/// `cellXfs` table, returning the rewritten XML and the new style index.
fn ensure_wrap_style(styles_xml: &[u8]) -> Result<(Vec<u8>, u32), SpreadsheetError> {
    let xml = String::from_utf8_lossy(styles_xml).into_owned();
    let insert_at = xml.find("</cellXfs>").ok_or_else(|| SpreadsheetError::Package("styles.xml has no cellXfs table".to_string()))?;

    let count_marker = "<cellXfs count=\"";
    let new_index = xml
        .find(count_marker)
        .and_then(|pos| {
            let rest = &xml[pos + count_marker.len()..];
            let end = rest.find('"')?;
            rest[..end].parse::<u32>().ok()
        })
        .unwrap_or(0);

    let new_xf = r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf>"#;

    let mut patched = String::with_capacity(xml.len() + new_xf.len());
    patched.push_str(&xml[..insert_at]);
    patched.push_str(new_xf);
    patched.push_str(&xml[insert_at..]);

    let bumped = if let Some(pos) = patched.find(count_marker) {
        let rest = &patched[pos + count_marker.len()..];
        if let Some(end) = rest.find('"') {
            let old_count: u32 = rest[..end].parse().unwrap_or(new_index);
            let mut bumped = String::with_capacity(patched.len());
            bumped.push_str(&patched[..pos + count_marker.len()]);
            bumped.push_str(&(old_count + 1).to_string());
            bumped.push_str(&patched[pos + count_marker.len() + end..]);
            bumped
        } else {
            patched
        }
    } else {
        patched
    };

    Ok((bumped.into_bytes(), new_index))
}

/// Stream the worksheet XML, substituting target cell contents and
/// dropping merge ranges slated for removal.
fn rewrite_sheet_xml(
    xml: &[u8],
    cell_writes: &HashMap<(u32, u32), CellWrite>,
    remove_ranges: &HashSet<(u32, u32, u32, u32)>,
    style_index: Option<u32>,
) -> Result<Vec<u8>, SpreadsheetError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut out = Cursor::new(Vec::new());
    let mut writer = Writer::new(&mut out);
    let mut buf = Vec::new();

    let mut current_row_num: u32 = 0;
    let mut target: Option<(u32, u32)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"row" => {
                current_row_num = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"r")
                    .and_then(|a| String::from_utf8_lossy(&a.value).parse::<u32>().ok())
                    .map(|n| n - 1)
                    .unwrap_or(current_row_num);
                writer.write_event(Event::Start(e)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            }
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"mergeCell" => {
                let reference = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"ref")
                    .map(|a| String::from_utf8_lossy(&a.value).into_owned())
                    .unwrap_or_default();
                let range = reference.split_once(':').and_then(|(start, end)| {
                    let (sr, sc) = parse_reference(start)?;
                    let (er, ec) = parse_reference(end)?;
                    Some((sr, sc, er, ec))
                });
                if range.map(|r| remove_ranges.contains(&r)).unwrap_or(false) {
                    continue;
                }
                writer.write_event(Event::Empty(e)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            }
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"c" => {
                let col = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"r")
                    .and_then(|a| parse_reference(&String::from_utf8_lossy(&a.value)))
                    .map(|(_, c)| c)
                    .unwrap_or(0);

                if let Some(write) = cell_writes.get(&(current_row_num, col)) {
                    target = Some((current_row_num, col));
                    let mut start = BytesStart::new("c");
                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"t" => continue,
                            b"s" if style_index.is_some() => continue,
                            _ => start.push_attribute((attr.key.as_ref(), attr.value.as_ref())),
                        }
                    }
                    if let Some(idx) = style_index {
                        start.push_attribute(("s", idx.to_string().as_str()));
                    }
                    start.push_attribute(("t", "inlineStr"));
                    writer.write_event(Event::Start(start)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Start(BytesStart::new("is")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Start(BytesStart::new("t")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Text(BytesText::new(&write.text)))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("t")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("is")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                } else {
                    writer.write_event(Event::Start(e)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                }
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"c" => {
                let col = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.local_name().as_ref() == b"r")
                    .and_then(|a| parse_reference(&String::from_utf8_lossy(&a.value)))
                    .map(|(_, c)| c)
                    .unwrap_or(0);

                if let Some(write) = cell_writes.get(&(current_row_num, col)) {
                    let mut start = BytesStart::new("c");
                    for attr in e.attributes().flatten() {
                        match attr.key.local_name().as_ref() {
                            b"t" => continue,
                            b"s" if style_index.is_some() => continue,
                            _ => start.push_attribute((attr.key.as_ref(), attr.value.as_ref())),
                        }
                    }
                    if let Some(idx) = style_index {
                        start.push_attribute(("s", idx.to_string().as_str()));
                    }
                    start.push_attribute(("t", "inlineStr"));
                    writer.write_event(Event::Start(start)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Start(BytesStart::new("is")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Start(BytesStart::new("t")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::Text(BytesText::new(&write.text)))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("t")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("is")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                    writer
                        .write_event(Event::End(quick_xml::events::BytesEnd::new("c")))
                        .map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                } else {
                    writer.write_event(Event::Empty(e)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"c" => {
                target = None;
                writer.write_event(Event::End(e)).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            }
            Ok(_) if target.is_some() => {
                // Original <v>/<f>/<t> children of a rewritten cell are dropped.
            }
            Ok(Event::Eof) => break,
            Ok(event) => {
                writer.write_event(event).map_err(|e| SpreadsheetError::Package(e.to_string()))?;
            }
            Err(e) => return Err(SpreadsheetError::Package(e.to_string())),
        }
        buf.clear();
    }

    Ok(out.into_inner())
}
