//! RAG response generator (L12): turns a requirement plus retrieved
//! knowledge-base context into a [`Response`] via a tool-forced LLM call.
//!
//! Generation never fails the pipeline: a requirement whose generation call
//! errors gets a stub response flagged `custom_dev` with zero confidence,
//! so a human reviewer always has something to start from.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::llm::{GenerationParams, LlmProvider, ToolSpec};
use crate::models::{ComplianceStatus, KnowledgeBaseEntry, Requirement, Response, SourceRef};
use crate::retrieval::{self, format_context_excerpts};
use crate::storage::vector::ScoredMatch;
use crate::storage::DbPool;

const MAX_EXCERPT_CHARS: usize = 500;
const TOOL_NAME: &str = "generate_response";

const SYSTEM_PROMPT: &str = "You draft a vendor's response to a single RFP/RFI requirement. \
    Choose exactly one compliance_status: fully_compliant (the product meets the requirement \
    as-is), partially_compliant (meets most but not all of it), configurable (meets it with \
    configuration, not code), custom_dev (requires custom development), or not_applicable (the \
    requirement does not apply to this vendor's offering). Set confidence_score between 0.0 and \
    1.0 reflecting how directly the retrieved material supports the response; a response drafted \
    without any supporting material should score low.";

fn tool_spec() -> ToolSpec {
    ToolSpec {
        name: TOOL_NAME.to_string(),
        description: "Draft a structured response to the requirement.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "compliance_status": {
                    "type": "string",
                    "enum": ["fully_compliant", "partially_compliant", "configurable", "custom_dev", "not_applicable"]
                },
                "response_text": {"type": "string"},
                "confidence_score": {"type": "number", "minimum": 0.0, "maximum": 1.0},
                "key_features": {"type": ["array", "null"], "items": {"type": "string"}},
                "notes": {"type": ["string", "null"]}
            },
            "required": ["compliance_status", "response_text", "confidence_score"]
        }),
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedResponse {
    compliance_status: String,
    response_text: String,
    confidence_score: f32,
    #[serde(default)]
    #[allow(dead_code)]
    key_features: Option<Vec<String>>,
    notes: Option<String>,
}

/// Generate a response for a single requirement, grounded in knowledge-base
/// retrieval. On any retrieval, tool-call, or parse failure, returns a stub
/// response instead of propagating an error.
pub async fn generate_response(
    pool: &DbPool,
    llm: &dyn LlmProvider,
    embedder: &dyn EmbeddingProvider,
    requirement: &Requirement,
    retrieval_cutoff: f32,
    retrieval_top_k: usize,
) -> Response {
    let matches = retrieval::retrieve_context(pool, embedder, requirement, retrieval_cutoff, retrieval_top_k).await;

    match generate_from_matches(llm, requirement, &matches).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(requirement_id = %requirement.id, error = %e, "response generation failed, using stub");
            stub_response(requirement)
        }
    }
}

async fn generate_from_matches(
    llm: &dyn LlmProvider,
    requirement: &Requirement,
    matches: &[ScoredMatch<KnowledgeBaseEntry>],
) -> Result<Response, crate::error::ExtractionError> {
    let excerpts = format_context_excerpts(matches, MAX_EXCERPT_CHARS);
    let user_message = format!(
        "Requirement {} ({}): {}\n\nDescription:\n{}\n\nRetrieved prior material:\n{}",
        requirement.req_number,
        requirement.req_type.as_str(),
        requirement.title,
        requirement.description,
        excerpts,
    );

    let tool = tool_spec();
    let value = llm
        .complete_tool(SYSTEM_PROMPT, &user_message, &tool, &GenerationParams::default())
        .await
        .map_err(|e| crate::error::ExtractionError::ToolCallMissing(e.to_string()))?
        .input;

    let parsed: GeneratedResponse = serde_json::from_value(value)
        .map_err(|e| crate::error::ExtractionError::InvalidRecord(e.to_string()))?;

    let compliance_status = ComplianceStatus::from_str(&parsed.compliance_status)
        .map_err(crate::error::ExtractionError::InvalidRecord)?;

    Ok(Response {
        id: Uuid::new_v4(),
        requirement_id: requirement.id,
        project_id: requirement.project_id,
        compliance_status,
        response_text: parsed.response_text,
        confidence_score: parsed.confidence_score.clamp(0.0, 1.0),
        source_refs: retrieval::source_refs(matches)
            .into_iter()
            .zip(matches.iter())
            .map(|(kb_entry_id, m)| SourceRef {
                kb_entry_id,
                title: m.item.title.clone(),
            })
            .collect(),
        is_ai_generated: true,
        is_reviewed: false,
        reviewed_by: None,
        reviewed_at: None,
        notes: parsed.notes,
    })
}

fn stub_response(requirement: &Requirement) -> Response {
    Response {
        id: Uuid::new_v4(),
        requirement_id: requirement.id,
        project_id: requirement.project_id,
        compliance_status: ComplianceStatus::CustomDev,
        response_text: "Response generation failed. Manual response required.".to_string(),
        confidence_score: 0.0,
        source_refs: Vec::new(),
        is_ai_generated: true,
        is_reviewed: false,
        reviewed_by: None,
        reviewed_at: None,
        notes: Some("automatic generation failed; drafted as a placeholder".to_string()),
    }
}

/// Generate responses for every requirement, isolating per-requirement
/// failures so one bad generation doesn't block the batch.
pub async fn generate_responses_batch(
    pool: &DbPool,
    llm: &dyn LlmProvider,
    embedder: &dyn EmbeddingProvider,
    requirements: &[Requirement],
    retrieval_cutoff: f32,
    retrieval_top_k: usize,
) -> Vec<Response> {
    let mut responses = Vec::with_capacity(requirements.len());
    for requirement in requirements {
        responses.push(generate_response(pool, llm, embedder, requirement, retrieval_cutoff, retrieval_top_k).await);
    }
    responses
}
