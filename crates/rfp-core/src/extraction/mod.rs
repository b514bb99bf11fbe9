//! Structured extraction from parsed document text (L7): requirements,
//! schedule events, and pricing structure. Every extractor shares the same
//! shape — prompt the LLM in tool-use mode with a JSON-Schema tool; the
//! tool call is mandatory, with no free-text fallback.

pub mod pricing;
pub mod requirements;
pub mod schedule;

use serde_json::Value;

use crate::error::ExtractionError;
use crate::llm::{GenerationParams, LlmProvider, ToolSpec};

/// Call `llm` in tool-use mode with `tool`, returning the raw tool input
/// JSON value. Maps a missing tool call to [`ExtractionError::ToolCallMissing`].
async fn call_extraction_tool(
    llm: &dyn LlmProvider,
    system: &str,
    user_message: &str,
    tool: &ToolSpec,
) -> Result<Value, ExtractionError> {
    llm.complete_tool(system, user_message, tool, &GenerationParams::default())
        .await
        .map(|response| response.input)
        .map_err(|e| ExtractionError::ToolCallMissing(e.to_string()))
}
