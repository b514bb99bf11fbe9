//! Pricing-structure extractor (L7): a single tool-forced call identifying
//! whether the document carries a pricing template, plus the line items a
//! vendor is expected to price out.
//!
//! The extractor reports *structure* only — `unit_cost`/`quantity`/`total`
//! are left unset on every [`PricingItem`] it produces; those are filled in
//! later by whoever actually prices the line item.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::extraction::call_extraction_tool;
use crate::llm::{LlmProvider, ToolSpec};
use crate::models::{PricingCategory, PricingItem};

const MAX_CHARS: usize = 6000;
const TOOL_NAME: &str = "extract_pricing_structure";

const SYSTEM_PROMPT: &str = "You identify the pricing structure expected by an RFP/RFI document: \
    whether it supplies a pricing template to fill in, and what line items a vendor must price.";

fn tool_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_NAME.to_string(),
        description: "Record the pricing template presence and requested line items.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "has_pricing_template": {"type": "boolean"},
                "line_items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "category": {
                                "type": "string",
                                "enum": ["license", "implementation", "support", "add_on", "training", "hosting"]
                            },
                            "line_item": {"type": "string"},
                            "description": {"type": ["string", "null"]},
                            "unit_of_measure": {"type": ["string", "null"]},
                            "multi_year": {"type": "boolean"},
                            "years_requested": {"type": ["integer", "null"]}
                        },
                        "required": ["category", "line_item", "multi_year"]
                    }
                }
            },
            "required": ["has_pricing_template", "line_items"]
        }),
    }
}

/// Result of the pricing structure extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingExtraction {
    pub has_pricing_template: bool,
    pub line_items: Vec<PricingItem>,
}

#[derive(Debug, Deserialize)]
struct ExtractedPricing {
    has_pricing_template: bool,
    line_items: Vec<ExtractedLineItem>,
}

#[derive(Debug, Deserialize)]
struct ExtractedLineItem {
    category: String,
    line_item: String,
    description: Option<String>,
    unit_of_measure: Option<String>,
    multi_year: bool,
    years_requested: Option<i32>,
}

/// Extract pricing structure from the first [`MAX_CHARS`] characters of a
/// document's parsed text. On tool-call or parse failure, returns an empty
/// extraction (`has_pricing_template: false`, no line items).
pub async fn extract_pricing_structure(
    llm: &dyn LlmProvider,
    project_id: Uuid,
    content: &str,
) -> PricingExtraction {
    let truncated: String = content.chars().take(MAX_CHARS).collect();
    let user_message = format!("Document excerpt:\n{truncated}");
    let tool = tool_spec();

    let value = match call_extraction_tool(llm, SYSTEM_PROMPT, &user_message, &tool).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "pricing extraction call failed");
            return PricingExtraction {
                has_pricing_template: false,
                line_items: Vec::new(),
            };
        }
    };

    let parsed: ExtractedPricing = match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse pricing tool response");
            return PricingExtraction {
                has_pricing_template: false,
                line_items: Vec::new(),
            };
        }
    };

    let line_items = parsed
        .line_items
        .into_iter()
        .filter_map(|item| to_pricing_item(item, project_id))
        .collect();

    PricingExtraction {
        has_pricing_template: parsed.has_pricing_template,
        line_items,
    }
}

fn to_pricing_item(extracted: ExtractedLineItem, project_id: Uuid) -> Option<PricingItem> {
    let category = PricingCategory::from_str(&extracted.category).ok()?;
    if extracted.line_item.trim().is_empty() {
        return None;
    }

    let notes = match (extracted.unit_of_measure, extracted.multi_year, extracted.years_requested) {
        (None, false, _) => None,
        (unit, multi_year, years) => {
            let mut parts = Vec::new();
            if let Some(unit) = unit {
                parts.push(format!("unit: {unit}"));
            }
            if multi_year {
                match years {
                    Some(years) => parts.push(format!("multi-year pricing requested ({years} years)")),
                    None => parts.push("multi-year pricing requested".to_string()),
                }
            }
            Some(parts.join("; "))
        }
    };

    Some(PricingItem {
        id: Uuid::new_v4(),
        project_id,
        category,
        line_item: extracted.line_item,
        description: extracted.description,
        unit_cost: None,
        quantity: None,
        total: None,
        currency: "USD".to_string(),
        year: None,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{GenerationParams, LlmResponse, TokenUsage, ToolResponse};
    use serde_json::Value;

    struct FixedTool {
        value: Value,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedTool {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn complete(
            &self,
            _system: &str,
            _user_message: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            unimplemented!()
        }
        async fn complete_tool(
            &self,
            _system: &str,
            _user_message: &str,
            _tool: &ToolSpec,
            _params: &GenerationParams,
        ) -> Result<ToolResponse, LlmError> {
            Ok(ToolResponse {
                input: self.value.clone(),
                usage: TokenUsage::default(),
            })
        }
        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    struct FailingTool;

    #[async_trait::async_trait]
    impl LlmProvider for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }
        async fn complete(
            &self,
            _system: &str,
            _user_message: &str,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            unimplemented!()
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
    async fn extracts_template_flag_and_line_items() {
        let llm = FixedTool {
            value: json!({
                "has_pricing_template": true,
                "line_items": [{
                    "category": "license",
                    "line_item": "Named user license",
                    "description": "Per-seat annual license",
                    "unit_of_measure": "per user per year",
                    "multi_year": true,
                    "years_requested": 3
                }]
            }),
        };

        let extraction = extract_pricing_structure(&llm, Uuid::new_v4(), "body").await;
        assert!(extraction.has_pricing_template);
        assert_eq!(extraction.line_items.len(), 1);
        assert_eq!(extraction.line_items[0].category, PricingCategory::License);
        assert!(extraction.line_items[0].unit_cost.is_none());
        assert!(extraction.line_items[0].notes.as_ref().unwrap().contains("3 years"));
    }

    #[tokio::test]
    async fn call_failure_yields_empty_extraction() {
        let extraction = extract_pricing_structure(&FailingTool, Uuid::new_v4(), "body").await;
        assert!(!extraction.has_pricing_template);
        assert!(extraction.line_items.is_empty());
    }

    #[tokio::test]
    async fn unknown_category_is_dropped() {
        let llm = FixedTool {
            value: json!({
                "has_pricing_template": false,
                "line_items": [{"category": "not_real", "line_item": "x", "multi_year": false}]
            }),
        };
        let extraction = extract_pricing_structure(&llm, Uuid::new_v4(), "body").await;
        assert!(extraction.line_items.is_empty());
    }
}
