//! Spreadsheet questionnaire engine (L10): detect a worksheet's
//! question/response structure, extract its questions, and write answers
//! back while preserving the rest of the workbook untouched.

pub mod model;
pub mod questions;
pub mod structure;
pub mod writer;

use crate::error::SpreadsheetError;

pub use model::{load_workbook, SheetModel};
pub use questions::{extract_questions, QuestionRow, QuestionType};
pub use structure::{detect_structure, HeaderLayout};
pub use writer::{write_answers, AnswerWrite, WriteReport};

/// A worksheet's detected structure plus its extracted questions.
#[derive(Debug, Clone)]
pub struct AnswerableSheet {
    pub sheet_name: String,
    pub layout: HeaderLayout,
    pub questions: Vec<QuestionRow>,
}

/// Detect structure and extract questions for every answerable worksheet
/// in a workbook. Sheets with no question/response structure are skipped.
pub fn scan_workbook(bytes: &[u8]) -> Result<Vec<AnswerableSheet>, SpreadsheetError> {
    let sheets = load_workbook(bytes)?;
    Ok(sheets
        .iter()
        .filter_map(|sheet| {
            let layout = detect_structure(sheet);
            if !layout.is_answerable() {
                return None;
            }
            Some(AnswerableSheet {
                sheet_name: sheet.name.clone(),
                questions: extract_questions(sheet, &layout),
                layout,
            })
        })
        .collect())
}
