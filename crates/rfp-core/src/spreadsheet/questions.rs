//! Question extraction (L10): walk a worksheet's data rows, classify
//! category headers vs. question rows, and tag each question's type.

use super::model::{col_letter, SheetModel};
use super::structure::HeaderLayout;

const CATEGORY_HEADER_MAX_CHARS: usize = 80;
const MIN_CATEGORY_MERGE_SPAN: u32 = 3;

/// The classified intent of a question row, used to steer response generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    CompanyInfo,
    Reference,
    Binary,
    Narrative,
}

const COMPANY_INFO_KEYWORDS: &[&str] =
    &["company name", "address", "point of contact", "duns", "tax id", "years in business", "headquarters"];
const REFERENCE_KEYWORDS: &[&str] = &["see appendix", "refer to section", "attached", "reference document"];
const BINARY_PREFIXES: &[&str] = &["do you", "does the", "is the", "are you", "can you", "will you", "have you"];

/// Classify a question's text into the ordered family: company-info →
/// reference → binary → narrative.
pub fn classify_question_type(text: &str) -> QuestionType {
    let lower = text.trim().to_lowercase();

    if COMPANY_INFO_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QuestionType::CompanyInfo;
    }
    if REFERENCE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return QuestionType::Reference;
    }
    if BINARY_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return QuestionType::Binary;
    }
    if !lower.ends_with('?') && lower.len() < CATEGORY_HEADER_MAX_CHARS {
        return QuestionType::Binary;
    }
    QuestionType::Narrative
}

/// A single extracted, answerable question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRow {
    pub row: u32,
    pub id: String,
    pub category: Option<String>,
    pub question: String,
    pub additional_info: Option<String>,
    pub question_type: QuestionType,
    pub current_response: String,
    pub response_col_letter: String,
    pub score_col_letter: Option<String>,
    pub current_score: Option<f64>,
    pub score_is_formula: bool,
}

/// Extract every answerable question row from `sheet` using `layout`.
/// Category-header rows update the running category but are not emitted.
pub fn extract_questions(sheet: &SheetModel, layout: &HeaderLayout) -> Vec<QuestionRow> {
    let (Some(question_col), Some(response_col)) = (layout.question_col, layout.response_col) else {
        return Vec::new();
    };

    let mut current_category: Option<String> = None;
    let mut out = Vec::new();

    for row in layout.first_data_row..sheet.max_row() {
        let id = layout.id_col.map(|c| sheet.cell(row, c).value.trim().to_string()).unwrap_or_default();
        let question_text = sheet.cell(row, question_col).value.trim().to_string();

        if id.is_empty() && question_text.is_empty() {
            continue;
        }

        let starts_with_total_or_formula = |s: &str| {
            let lower = s.trim().to_lowercase();
            lower.starts_with("total") || lower.starts_with('=')
        };
        if starts_with_total_or_formula(&id) || starts_with_total_or_formula(&question_text) {
            continue;
        }

        let merge_span = sheet
            .merge_at(row, question_col)
            .filter(|m| m.is_horizontal() && m.is_anchor(row, question_col))
            .map(|m| m.column_span())
            .unwrap_or(0);

        let is_category_header =
            id.is_empty() && (question_text.chars().count() < CATEGORY_HEADER_MAX_CHARS || merge_span >= MIN_CATEGORY_MERGE_SPAN);

        if is_category_header {
            if !question_text.is_empty() {
                current_category = Some(question_text);
            }
            continue;
        }

        let response_cell = sheet.cell(row, response_col);
        let additional_info = layout.additional_info_col.map(|c| sheet.cell(row, c).value.trim().to_string()).filter(|s| !s.is_empty());

        let (score_col_letter, current_score, score_is_formula) = match layout.score_col {
            Some(col) => {
                let cell = sheet.cell(row, col);
                (Some(col_letter(col)), cell.value.trim().parse::<f64>().ok(), cell.is_formula)
            }
            None => (None, None, false),
        };

        out.push(QuestionRow {
            row,
            id,
            category: current_category.clone(),
            question_type: classify_question_type(&question_text),
            question: question_text,
            additional_info,
            current_response: response_cell.value,
            response_col_letter: col_letter(response_col),
            score_col_letter,
            current_score,
            score_is_formula,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::model::Cell;

    fn cell(v: &str) -> Cell {
        Cell {
            value: v.to_string(),
            is_formula: false,
        }
    }

    fn sheet_with_rows(rows: Vec<Vec<&str>>) -> SheetModel {
        SheetModel {
            name: "Tab1".to_string(),
            rows: rows.into_iter().map(|row| row.into_iter().map(cell).collect()).collect(),
            merges: Vec::new(),
        }
    }

    fn layout() -> HeaderLayout {
        HeaderLayout {
            header_row: 0,
            first_data_row: 1,
            id_col: Some(0),
            question_col: Some(1),
            response_col: Some(2),
            score_col: Some(3),
            additional_info_col: Some(4),
        }
    }

    #[test]
    fn classifies_question_families_in_order() {
        assert_eq!(classify_question_type("What is your company name?"), QuestionType::CompanyInfo);
        assert_eq!(classify_question_type("See appendix B for details"), QuestionType::Reference);
        assert_eq!(classify_question_type("Do you support SAML SSO?"), QuestionType::Binary);
        assert_eq!(
            classify_question_type("Describe your approach to data migration and rollback procedures in detail."),
            QuestionType::Narrative
        );
    }

    #[test]
    fn category_header_updates_running_category() {
        let sheet = sheet_with_rows(vec![
            vec!["ID", "Question", "Response", "Score", "Notes"],
            vec!["", "Security", "", "", ""],
            vec!["FR-1", "Do you encrypt data at rest?", "Yes", "1", ""],
        ]);

        let questions = extract_questions(&sheet, &layout());
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].category.as_deref(), Some("Security"));
        assert_eq!(questions[0].id, "FR-1");
    }

    #[test]
    fn skips_total_and_formula_rows() {
        let sheet = sheet_with_rows(vec![
            vec!["ID", "Question", "Response", "Score", "Notes"],
            vec!["FR-1", "Do you support SSO?", "Yes", "1", ""],
            vec!["Total", "", "", "=SUM(D2:D2)", ""],
        ]);
        let questions = extract_questions(&sheet, &layout());
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn formula_score_cell_is_flagged_non_writable() {
        let mut sheet = sheet_with_rows(vec![
            vec!["ID", "Question", "Response", "Score", "Notes"],
            vec!["FR-1", "Do you support SSO?", "Yes", "=D1", ""],
        ]);
        sheet.rows[1][3].is_formula = true;

        let questions = extract_questions(&sheet, &layout());
        assert!(questions[0].score_is_formula);
    }
}
