//! PDF parser: per-page text extraction via `pdfium-render`, with an OCR
//! fallback (behind the `ocr` feature) for pages whose native text yield
//! is too thin to be useful.

use std::collections::HashMap;

use pdfium_render::prelude::*;

use crate::error::ParseError;

use super::{ParsedDoc, Parser};

/// A page's native text yield below this character count triggers the OCR
/// fallback attempt (when the `ocr` feature is enabled).
const MIN_SIGNIFICANT_CHARS: usize = 50;

#[derive(Default)]
pub struct PdfParser;

impl Parser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDoc, ParseError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| ParseError::Malformed {
            format: "pdf".to_string(),
            message: e.to_string(),
        })?;

        let page_count = document.pages().len() as u32;
        let mut page_texts = Vec::with_capacity(page_count as usize);
        let mut was_ocr = false;

        for page in document.pages().iter() {
            let native_text = page.text().map(|t| t.all()).unwrap_or_default();

            let text = if native_text.trim().chars().count() < MIN_SIGNIFICANT_CHARS {
                match ocr_page(&page) {
                    Some(ocr_text) if ocr_text.trim().chars().count() > native_text.trim().chars().count() => {
                        was_ocr = true;
                        ocr_text
                    }
                    _ => native_text,
                }
            } else {
                native_text
            };

            page_texts.push(text);
        }

        let mut metadata = HashMap::new();
        metadata.insert("page_count".to_string(), page_count.to_string());

        Ok(ParsedDoc {
            text: page_texts.join("\n\n"),
            page_count,
            metadata,
            tables: Vec::new(),
            sections: Vec::new(),
            was_ocr,
        })
    }
}

fn bind_pdfium() -> Result<Pdfium, ParseError> {
    let bindings = Pdfium::bind_to_system_library().map_err(|e| ParseError::Malformed {
        format: "pdf".to_string(),
        message: format!("failed to bind pdfium library: {e}"),
    })?;
    Ok(Pdfium::new(bindings))
}

#[cfg(feature = "ocr")]
fn ocr_page(page: &PdfPage) -> Option<String> {
    use crate::parsers::ocr;
    let render_config = PdfRenderConfig::new().set_target_width(2000);
    let bitmap = page.render_with_config(&render_config).ok()?;
    let image = bitmap.as_image();
    ocr::recognize_text(&image).ok()
}

#[cfg(not(feature = "ocr"))]
fn ocr_page(_page: &PdfPage) -> Option<String> {
    None
}
