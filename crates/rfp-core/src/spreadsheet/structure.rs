//! Worksheet structure detection (L10): locate the header row and the
//! id/question/response/score/additional-info columns.

use super::model::{col_letter, SheetModel};

const SCAN_ROWS: u32 = 15;
const SCAN_COLS: u32 = 15;

const RESPONSE_KEYWORDS: &[&str] = &["response", "answer"];
const QUESTION_KEYWORDS: &[&str] = &["question", "requirement", "description"];
const ID_KEYWORDS: &[&str] = &["id", "ref", "#"];
const SCORE_KEYWORDS: &[&str] = &["score", "rating", "compliance"];
const INFO_KEYWORDS: &[&str] = &["additional info", "comments", "notes"];

/// The detected header/column layout of a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub header_row: u32,
    pub first_data_row: u32,
    pub id_col: Option<u32>,
    pub question_col: Option<u32>,
    pub response_col: Option<u32>,
    pub score_col: Option<u32>,
    pub additional_info_col: Option<u32>,
}

impl HeaderLayout {
    /// A sheet is answerable iff both a question and a response column were found.
    pub fn is_answerable(&self) -> bool {
        self.question_col.is_some() && self.response_col.is_some()
    }

    pub fn response_col_letter(&self) -> Option<String> {
        self.response_col.map(col_letter)
    }

    pub fn score_col_letter(&self) -> Option<String> {
        self.score_col.map(col_letter)
    }
}

/// Detect a worksheet's question/response structure.
pub fn detect_structure(sheet: &SheetModel) -> HeaderLayout {
    if let Some(layout) = detect_by_keyword_scan(sheet) {
        return layout;
    }
    if let Some(layout) = detect_by_sheet_name_pattern(sheet) {
        return layout;
    }
    detect_by_column_b_scan(sheet)
}

/// Primary path: scan the top-left block for a row that hits both the
/// response and question keyword families.
fn detect_by_keyword_scan(sheet: &SheetModel) -> Option<HeaderLayout> {
    let max_row = sheet.max_row().min(SCAN_ROWS);
    let max_col = sheet.max_col().min(SCAN_COLS);

    for row in 0..max_row {
        let mut id_col = None;
        let mut question_col = None;
        let mut response_col = None;
        let mut score_col = None;
        let mut additional_info_col = None;

        for col in 0..max_col {
            let text = sheet.cell(row, col).value.to_lowercase();
            if text.trim().is_empty() {
                continue;
            }
            if id_col.is_none() && ID_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                id_col = Some(col);
            }
            if question_col.is_none() && QUESTION_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                question_col = Some(col);
            }
            if response_col.is_none() && RESPONSE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                response_col = Some(col);
            }
            if score_col.is_none() && SCORE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                score_col = Some(col);
            }
            if additional_info_col.is_none() && INFO_KEYWORDS.iter().any(|kw| text.contains(kw)) {
                additional_info_col = Some(col);
            }
        }

        if question_col.is_some() && response_col.is_some() {
            return Some(HeaderLayout {
                header_row: row,
                first_data_row: row + 1,
                id_col,
                question_col,
                response_col,
                score_col,
                additional_info_col,
            });
        }
    }

    None
}

/// Fallback: a fixed A/B/C/D mapping (id, question, response, score) for
/// sheets whose title matches a known naming convention, e.g. a sheet
/// titled "D - Functional Requirements".
fn detect_by_sheet_name_pattern(sheet: &SheetModel) -> Option<HeaderLayout> {
    let name = sheet.name.to_lowercase();
    let looks_like_functional_tab = name.starts_with('d') && name.contains("functional");

    if looks_like_functional_tab {
        Some(HeaderLayout {
            header_row: 0,
            first_data_row: 1,
            id_col: Some(0),
            question_col: Some(1),
            response_col: Some(2),
            score_col: Some(3),
            additional_info_col: None,
        })
    } else {
        None
    }
}

/// Last resort: scan column B for a cell whose text contains an id or
/// question keyword, treating that row as the header. Defaults to row 3
/// (index 2) if no such cell is found, reusing the A/B/C/D mapping.
fn detect_by_column_b_scan(sheet: &SheetModel) -> HeaderLayout {
    let max_row = sheet.max_row().min(SCAN_ROWS);
    let mut header_row = 2;

    for row in 0..max_row {
        let text = sheet.cell(row, 1).value.to_lowercase();
        if ID_KEYWORDS.iter().chain(QUESTION_KEYWORDS).any(|kw| text.contains(kw)) {
            header_row = row;
            break;
        }
    }

    HeaderLayout {
        header_row,
        first_data_row: header_row + 1,
        id_col: Some(0),
        question_col: Some(1),
        response_col: Some(2),
        score_col: Some(3),
        additional_info_col: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::model::Cell;

    fn sheet_with_rows(name: &str, rows: Vec<Vec<&str>>) -> SheetModel {
        SheetModel {
            name: name.to_string(),
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|v| Cell {
                            value: v.to_string(),
                            is_formula: false,
                        })
                        .collect()
                })
                .collect(),
            merges: Vec::new(),
        }
    }

    #[test]
    fn detects_header_row_with_question_and_response_hit() {
        let sheet = sheet_with_rows(
            "Tab1",
            vec![
                vec!["Intro text"],
                vec!["ID", "Requirement", "Vendor Response", "Score", "Comments"],
                vec!["1", "Must support SSO", "", "", ""],
            ],
        );
        let layout = detect_structure(&sheet);
        assert!(layout.is_answerable());
        assert_eq!(layout.header_row, 1);
        assert_eq!(layout.first_data_row, 2);
        assert_eq!(layout.id_col, Some(0));
        assert_eq!(layout.question_col, Some(1));
        assert_eq!(layout.response_col, Some(2));
        assert_eq!(layout.score_col, Some(3));
    }

    #[test]
    fn falls_back_to_sheet_name_pattern() {
        let sheet = sheet_with_rows(
            "D - Functional Requirements",
            vec![vec!["FR-001", "Must support SSO", "", ""]],
        );
        let layout = detect_structure(&sheet);
        assert!(layout.is_answerable());
        assert_eq!(layout.header_row, 0);
        assert_eq!(layout.response_col, Some(2));
    }

    #[test]
    fn falls_back_to_column_b_scan_default_row_three() {
        let sheet = sheet_with_rows("Untitled", vec![vec![], vec![], vec![], vec!["FR-1", "data"]]);
        let layout = detect_structure(&sheet);
        assert_eq!(layout.header_row, 2);
    }
}
