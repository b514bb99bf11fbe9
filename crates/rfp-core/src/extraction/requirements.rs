//! Requirement extractor (L7): one tool-forced LLM call per chunk,
//! mapped into [`Requirement`] records and renumbered per type.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::chunking::Chunk;
use crate::extraction::call_extraction_tool;
use crate::llm::{LlmProvider, ToolSpec};
use crate::models::{Priority, Requirement, RequirementType};
use crate::storage::DbPool;

const SYSTEM_PROMPT: &str = "You extract procurement requirements from RFP/RFI document text. \
    Identify every discrete requirement a vendor would need to respond to. Do not invent \
    requirements that are not stated or clearly implied by the text.";

const TOOL_NAME: &str = "extract_requirements";

fn tool_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_NAME.to_string(),
        description: "Record every requirement found in the excerpt.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "requirements": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"},
                            "type": {
                                "type": "string",
                                "enum": ["functional", "non_functional", "commercial", "legal", "technical"]
                            },
                            "category": {"type": ["string", "null"]},
                            "is_mandatory": {"type": "boolean"},
                            "response_required": {"type": "boolean"},
                            "priority": {"type": "string", "enum": ["high", "medium", "low"]},
                            "reference_section": {"type": ["string", "null"]}
                        },
                        "required": ["title", "description", "type", "is_mandatory", "response_required", "priority"]
                    }
                }
            },
            "required": ["requirements"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct ExtractedRequirements {
    requirements: Vec<ExtractedRequirement>,
}

#[derive(Debug, Deserialize)]
struct ExtractedRequirement {
    title: String,
    description: String,
    #[serde(rename = "type")]
    req_type: String,
    category: Option<String>,
    is_mandatory: bool,
    response_required: bool,
    priority: String,
    reference_section: Option<String>,
}

/// Extract requirements from every chunk of a document's parsed text.
///
/// A chunk whose tool call fails or whose response fails to parse is
/// logged and skipped; the function returns whatever succeeded. Returned
/// requirements carry a placeholder `req_number` of `"PENDING"` — call
/// [`renumber_requirements`] once all documents in a project have been
/// extracted.
pub async fn extract_requirements(
    llm: &dyn LlmProvider,
    project_id: Uuid,
    document_id: Option<Uuid>,
    chunks: &[Chunk],
) -> Vec<Requirement> {
    let tool = tool_spec();
    let mut out = Vec::new();

    for chunk in chunks {
        let user_message = format!("Document excerpt:\n{}", chunk.text);
        match call_extraction_tool(llm, SYSTEM_PROMPT, &user_message, &tool).await {
            Ok(value) => match serde_json::from_value::<ExtractedRequirements>(value) {
                Ok(parsed) => {
                    out.extend(parsed.requirements.into_iter().filter_map(|r| {
                        to_requirement(r, project_id, document_id).or_else(|| {
                            tracing::warn!(chunk_index = chunk.chunk_index, "skipped malformed requirement record");
                            None
                        })
                    }));
                }
                Err(e) => {
                    tracing::warn!(chunk_index = chunk.chunk_index, error = %e, "failed to parse requirement tool response, skipping chunk");
                }
            },
            Err(e) => {
                tracing::warn!(chunk_index = chunk.chunk_index, error = %e, "requirement extraction call failed, skipping chunk");
            }
        }
    }

    out
}

fn to_requirement(
    extracted: ExtractedRequirement,
    project_id: Uuid,
    document_id: Option<Uuid>,
) -> Option<Requirement> {
    let req_type = RequirementType::from_str(&extracted.req_type).ok()?;
    let priority = Priority::from_str(&extracted.priority).ok()?;
    if extracted.title.trim().is_empty() {
        return None;
    }

    Some(Requirement {
        id: Uuid::new_v4(),
        project_id,
        document_id,
        req_number: "PENDING".to_string(),
        title: extracted.title,
        description: extracted.description,
        req_type,
        category: extracted.category,
        is_mandatory: extracted.is_mandatory,
        priority,
        response_required: extracted.response_required,
        reference_section: extracted.reference_section,
        embedding: None,
    })
}

/// Assign `req_number` values (`FR-001`, `NFR-001`, ...) in discovery order,
/// continuing from whatever count already exists for each type in storage.
pub async fn renumber_requirements(
    pool: &DbPool,
    project_id: Uuid,
    mut requirements: Vec<Requirement>,
) -> Result<Vec<Requirement>, crate::error::StorageError> {
    let mut next_index = std::collections::HashMap::new();
    for req_type in [
        RequirementType::Functional,
        RequirementType::NonFunctional,
        RequirementType::Commercial,
        RequirementType::Legal,
        RequirementType::Technical,
    ] {
        let existing = crate::storage::requirements::count_by_type(pool, project_id, req_type).await?;
        next_index.insert(req_type, existing + 1);
    }

    for requirement in &mut requirements {
        let index = next_index.entry(requirement.req_type).or_insert(1);
        requirement.req_number = format!("{}-{:03}", requirement.req_type.prefix(), index);
        *index += 1;
    }

    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
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

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            start_char: 0,
            end_char: text.len(),
            chunk_index: index,
        }
    }

    #[tokio::test]
    async fn extracts_requirements_from_tool_response() {
        let llm = FixedTool {
            value: json!({
                "requirements": [{
                    "title": "Single sign-on",
                    "description": "Vendor must support SAML SSO.",
                    "type": "functional",
                    "category": null,
                    "is_mandatory": true,
                    "response_required": true,
                    "priority": "high",
                    "reference_section": "3.2"
                }]
            }),
        };

        let project_id = Uuid::new_v4();
        let chunks = vec![chunk("requirements text", 0)];
        let requirements = extract_requirements(&llm, project_id, None, &chunks).await;

        assert_eq!(requirements.len(), 1);
        assert_eq!(requirements[0].title, "Single sign-on");
        assert_eq!(requirements[0].req_type, RequirementType::Functional);
        assert_eq!(requirements[0].priority, Priority::High);
        assert_eq!(requirements[0].req_number, "PENDING");
    }

    #[tokio::test]
    async fn failed_chunk_is_skipped_not_fatal() {
        let chunks = vec![chunk("a", 0), chunk("b", 1)];
        let requirements = extract_requirements(&FailingTool, Uuid::new_v4(), None, &chunks).await;
        assert!(requirements.is_empty());
    }

    #[tokio::test]
    async fn malformed_record_is_dropped() {
        let llm = FixedTool {
            value: json!({
                "requirements": [{
                    "title": "Bad type",
                    "description": "x",
                    "type": "not_a_real_type",
                    "is_mandatory": true,
                    "response_required": true,
                    "priority": "high"
                }]
            }),
        };
        let requirements = extract_requirements(&llm, Uuid::new_v4(), None, &[chunk("x", 0)]).await;
        assert!(requirements.is_empty());
    }
}
