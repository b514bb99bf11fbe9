//! RFI response PDF builder (L14): a section-per-requirement-type report
//! with a table of contents, rendered in two passes so the TOC can carry
//! correct page numbers and every page gets a "page N of M" footer.

use std::io::Cursor;

use printpdf::{Mm, PdfDocument, PdfLayerReference};

use crate::error::ArtifactError;

use super::fonts::{resolve_body_font, resolve_bold_font};

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 20.0;
const BODY_FONT_SIZE: f64 = 10.0;
const HEADING_FONT_SIZE: f64 = 14.0;
const LINE_HEIGHT_MM: f64 = 5.5;

/// One section of the report: a heading and pre-wrapped body lines.
#[derive(Debug, Clone)]
pub struct RfiSection {
    pub heading: String,
    pub body_lines: Vec<String>,
}

/// The full RFI response report.
#[derive(Debug, Clone)]
pub struct RfiDocument {
    pub title: String,
    pub sections: Vec<RfiSection>,
}

const WRAP_COLUMN: usize = 95;

impl RfiDocument {
    /// Build a report with one section per requirement, grouped under a
    /// requirement-number heading, from a project's requirements and the
    /// responses drafted against them.
    pub fn from_responses(title: &str, requirements: &[crate::models::Requirement], responses: &[crate::models::Response]) -> Self {
        let responses_by_req: std::collections::HashMap<_, _> = responses.iter().map(|r| (r.requirement_id, r)).collect();

        let sections = requirements
            .iter()
            .map(|req| {
                let mut lines = Vec::new();
                lines.extend(wrap_text(&req.description));
                match responses_by_req.get(&req.id) {
                    Some(response) => {
                        lines.push(String::new());
                        lines.push(format!("Status: {}", response.compliance_status.label()));
                        lines.extend(wrap_text(&response.response_text));
                    }
                    None => lines.push("No response has been drafted for this requirement.".to_string()),
                }
                RfiSection {
                    heading: format!("{} — {}", req.req_number, req.title),
                    body_lines: lines,
                }
            })
            .collect();

        RfiDocument {
            title: title.to_string(),
            sections,
        }
    }
}

fn wrap_text(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > WRAP_COLUMN {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn usable_lines_per_page() -> usize {
    let usable_height = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    (usable_height / LINE_HEIGHT_MM) as usize
}

/// Pass 1: compute each section's starting content page (1-based, not
/// counting the table-of-contents pages), by simulating pagination.
fn paginate_sections(sections: &[RfiSection], lines_per_page: usize) -> Vec<usize> {
    let mut starts = Vec::with_capacity(sections.len());
    let mut current_page = 1usize;
    let mut lines_used_on_page = 0usize;

    for section in sections {
        // A heading forces a new page if the current page has no room left
        // for the heading plus at least one body line.
        if lines_used_on_page > 0 && lines_used_on_page + 2 > lines_per_page {
            current_page += 1;
            lines_used_on_page = 0;
        }
        starts.push(current_page);
        lines_used_on_page += 1; // heading line

        for _ in &section.body_lines {
            if lines_used_on_page >= lines_per_page {
                current_page += 1;
                lines_used_on_page = 0;
            }
            lines_used_on_page += 1;
        }
    }
    starts
}

fn toc_page_count(section_count: usize, lines_per_page: usize) -> usize {
    let toc_lines = section_count + 1; // +1 for the "Table of Contents" heading
    toc_lines.div_ceil(lines_per_page.max(1)).max(1)
}

/// Render an [`RfiDocument`] into a standalone PDF report.
pub fn build_rfi_pdf(document: &RfiDocument) -> Result<Vec<u8>, ArtifactError> {
    let lines_per_page = usable_lines_per_page().max(1);
    let content_starts = paginate_sections(&document.sections, lines_per_page);
    let toc_pages = toc_page_count(document.sections.len(), lines_per_page);
    let content_pages = content_starts.iter().max().copied().unwrap_or(1);
    let total_pages = toc_pages + content_pages;

    let body_font_bytes = resolve_body_font()?;
    let bold_font_bytes = resolve_bold_font()?;

    let (doc, first_page, first_layer) = PdfDocument::new(&document.title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let body_font = doc
        .add_external_font(Cursor::new(&body_font_bytes))
        .map_err(|e| ArtifactError::Pdf(e.to_string()))?;
    let bold_font = doc
        .add_external_font(Cursor::new(&bold_font_bytes))
        .map_err(|e| ArtifactError::Pdf(e.to_string()))?;

    let mut page_number = 1usize;
    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    write_footer(&layer, &body_font, page_number, total_pages);

    // Table of contents.
    let mut cursor_y = PAGE_HEIGHT_MM - MARGIN_MM;
    cursor_y = write_line(&layer, &bold_font, "Table of Contents", HEADING_FONT_SIZE, cursor_y);
    for (section, start_page) in document.sections.iter().zip(&content_starts) {
        if cursor_y < MARGIN_MM + LINE_HEIGHT_MM {
            page_number += 1;
            let (page, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_idx);
            write_footer(&layer, &body_font, page_number, total_pages);
            cursor_y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        let line = format!("{} .... {}", section.heading, toc_pages + start_page);
        cursor_y = write_line(&layer, &body_font, &line, BODY_FONT_SIZE, cursor_y);
    }

    // Content sections.
    for section in &document.sections {
        page_number += 1;
        let (page, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        layer = doc.get_page(page).get_layer(layer_idx);
        write_footer(&layer, &body_font, page_number, total_pages);
        let mut y = PAGE_HEIGHT_MM - MARGIN_MM;
        y = write_line(&layer, &bold_font, &section.heading, HEADING_FONT_SIZE, y);

        for body_line in &section.body_lines {
            if y < MARGIN_MM + LINE_HEIGHT_MM {
                page_number += 1;
                let (page, layer_idx) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                layer = doc.get_page(page).get_layer(layer_idx);
                write_footer(&layer, &body_font, page_number, total_pages);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            y = write_line(&layer, &body_font, body_line, BODY_FONT_SIZE, y);
        }
    }

    doc.save_to_bytes().map_err(|e| ArtifactError::Pdf(e.to_string()))
}

fn write_line(layer: &PdfLayerReference, font: &printpdf::IndirectFontRef, text: &str, size: f64, y: f64) -> f64 {
    layer.use_text(text, size, Mm(MARGIN_MM), Mm(y), font);
    y - LINE_HEIGHT_MM
}

fn write_footer(layer: &PdfLayerReference, font: &printpdf::IndirectFontRef, page_number: usize, total_pages: usize) {
    let footer = format!("Page {page_number} of {total_pages}");
    let x = PAGE_WIDTH_MM / 2.0 - (footer.len() as f64 * 0.8);
    layer.use_text(&footer, 8.0, Mm(x), Mm(MARGIN_MM / 2.0), font);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(heading: &str, line_count: usize) -> RfiSection {
        RfiSection {
            heading: heading.to_string(),
            body_lines: (0..line_count).map(|i| format!("line {i}")).collect(),
        }
    }

    #[test]
    fn paginate_sections_advances_page_when_section_overflows() {
        let lines_per_page = 10;
        let sections = vec![section("A", 8), section("B", 8)];
        let starts = paginate_sections(&sections, lines_per_page);
        assert_eq!(starts[0], 1);
        assert_eq!(starts[1], 2);
    }

    #[test]
    fn toc_page_count_is_at_least_one() {
        assert_eq!(toc_page_count(0, 40), 1);
        assert_eq!(toc_page_count(100, 40), 3);
    }

    #[test]
    fn wrap_text_breaks_on_column_without_splitting_words() {
        let text = "a ".repeat(60);
        let lines = wrap_text(text.trim());
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= WRAP_COLUMN));
    }

    #[test]
    fn from_responses_flags_missing_responses() {
        use uuid::Uuid;

        use crate::models::{Priority, Requirement, RequirementType};

        let req = Requirement {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            document_id: None,
            req_number: "FR-001".to_string(),
            title: "Single sign-on".to_string(),
            description: "Must support SAML SSO.".to_string(),
            req_type: RequirementType::Functional,
            category: None,
            is_mandatory: true,
            priority: Priority::High,
            response_required: true,
            reference_section: None,
            embedding: None,
        };

        let doc = RfiDocument::from_responses("RFI Response", &[req], &[]);
        assert_eq!(doc.sections.len(), 1);
        assert!(doc.sections[0].body_lines.iter().any(|l| l.contains("No response")));
    }
}
