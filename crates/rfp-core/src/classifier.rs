//! Document category classifier (L9).
//!
//! Primary path asks the LLM to name a category from the closed set;
//! on any LLM failure a deterministic keyword heuristic takes over so
//! classification never blocks the pipeline.

use crate::llm::{GenerationParams, LlmProvider};
use crate::models::DocCategory;

/// Minimum keyword hits in content required to override the default category.
const CONTENT_KEYWORD_THRESHOLD: usize = 2;

const SYSTEM_PROMPT: &str = "You classify procurement documents into exactly one category from this \
    closed list: rfp_document, commercial_terms, tech_requirements, pricing_sheet, legal_appendix, \
    evaluation_criteria. Respond with only the category name.";

/// Classify a document into one of the closed [`DocCategory`] labels.
///
/// `content` should be truncated by the caller to the first 3000 characters
/// of parsed text. Falls back to [`classify_heuristic`] on any LLM error.
pub async fn classify_document(
    llm: &dyn LlmProvider,
    filename: &str,
    content: &str,
    has_tables: bool,
) -> DocCategory {
    let truncated: String = content.chars().take(3000).collect();

    let user_message = format!(
        "Filename: {filename}\nContains tables: {has_tables}\n\nDocument excerpt:\n{truncated}"
    );

    match llm.complete(SYSTEM_PROMPT, &user_message, &GenerationParams::default()).await {
        Ok(response) => match pick_category_from_response(&response.text) {
            Some(category) => category,
            None => classify_heuristic(filename, content),
        },
        Err(e) => {
            tracing::warn!(error = %e, filename, "classification LLM call failed, using heuristic fallback");
            classify_heuristic(filename, content)
        }
    }
}

/// Pick the first [`DocCategory`] whose label case-insensitively appears in `text`.
fn pick_category_from_response(text: &str) -> Option<DocCategory> {
    let lower = text.to_lowercase();
    DocCategory::ALL.iter().copied().find(|category| lower.contains(category.as_str()))
}

/// Deterministic keyword-heuristic fallback. Filename tokens beat content
/// tokens; a category whose keyword count in the content meets
/// [`CONTENT_KEYWORD_THRESHOLD`] beats the default of `rfp_document`.
pub fn classify_heuristic(filename: &str, content: &str) -> DocCategory {
    let filename_lower = filename.to_lowercase();
    for (category, keywords) in category_keywords() {
        if keywords.iter().any(|kw| filename_lower.contains(kw)) {
            return category;
        }
    }

    let content_lower = content.to_lowercase();
    let mut best: Option<(DocCategory, usize)> = None;
    for (category, keywords) in category_keywords() {
        let count = keywords.iter().map(|kw| content_lower.matches(kw).count()).sum::<usize>();
        let beats_current = match &best {
            Some((_, best_count)) => count > *best_count,
            None => true,
        };
        if count >= CONTENT_KEYWORD_THRESHOLD && beats_current {
            best = Some((category, count));
        }
    }

    best.map(|(category, _)| category).unwrap_or(DocCategory::RfpDocument)
}

fn category_keywords() -> [(DocCategory, &'static [&'static str]); 5] {
    [
        (DocCategory::CommercialTerms, &["commercial", "terms and conditions", "contract terms"]),
        (DocCategory::TechRequirements, &["technical requirements", "tech spec", "architecture"]),
        (DocCategory::PricingSheet, &["pricing", "cost sheet", "rate card"]),
        (DocCategory::LegalAppendix, &["legal", "appendix", "compliance certification"]),
        (DocCategory::EvaluationCriteria, &["evaluation criteria", "scoring rubric", "award criteria"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{LlmResponse, ToolResponse, ToolSpec, TokenUsage};

    struct FixedLlm {
        text: String,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedLlm {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _system: &str,
            _user_message: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse {
                text: self.text.clone(),
                usage: TokenUsage::default(),
                model: "fixed".to_string(),
            })
        }
        async fn complete_tool(
            &self,
            _system: &str,
            _user_message: &str,
            _tool: &ToolSpec,
            _params: &GenerationParams,
        ) -> Result<ToolResponse, LlmError> {
            unimplemented!("not used by classifier")
        }
        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmProvider for FailingLlm {
        fn name(&self) -> &str {
            "failing"
        }
        async fn complete(
            &self,
            _system: &str,
            _user_message: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            Err(LlmError::NotConfigured)
        }
        async fn complete_tool(
            &self,
            _system: &str,
            _user_message: &str,
            _tool: &ToolSpec,
            _params: &GenerationParams,
        ) -> Result<ToolResponse, LlmError> {
            Err(LlmError::NotConfigured)
        }
        async fn health_check(&self) -> Result<(), LlmError> {
            Err(LlmError::NotConfigured)
        }
    }

    #[tokio::test]
    async fn picks_category_named_in_llm_response() {
        let llm = FixedLlm {
            text: "This is clearly a pricing_sheet.".to_string(),
        };
        let category = classify_document(&llm, "rates.xlsx", "unit costs per license", false).await;
        assert_eq!(category, DocCategory::PricingSheet);
    }

    #[tokio::test]
    async fn falls_back_to_heuristic_on_llm_failure() {
        let category = classify_document(&FailingLlm, "Commercial_Terms_v2.docx", "", false).await;
        assert_eq!(category, DocCategory::CommercialTerms);
    }

    #[test]
    fn heuristic_filename_beats_content() {
        let category = classify_heuristic("pricing_sheet.xlsx", "technical requirements architecture");
        assert_eq!(category, DocCategory::PricingSheet);
    }

    #[test]
    fn heuristic_defaults_to_rfp_document() {
        let category = classify_heuristic("doc.pdf", "general narrative text with no keywords");
        assert_eq!(category, DocCategory::RfpDocument);
    }

    #[test]
    fn heuristic_content_keyword_count_must_meet_threshold() {
        let category = classify_heuristic("doc.pdf", "one mention of legal appendix only");
        assert_eq!(category, DocCategory::RfpDocument);
    }
}
