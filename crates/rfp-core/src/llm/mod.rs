//! LLM provider abstraction and implementations.
//!
//! Provides a trait-based abstraction over LLM providers, with typed
//! responses, token usage tracking, a tool-forced structured-output call
//! for the extraction stages, and health checking. Anthropic is the only
//! first-class provider; the trait stays provider-agnostic so a second
//! backend can be added without touching call sites.

pub mod anthropic;
pub mod pricing;
pub mod retry;

use crate::error::LlmError;

/// Token usage information from an LLM completion.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the input/prompt.
    pub input_tokens: u32,
    /// Number of tokens in the output/completion.
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Accumulate token counts from another usage record (e.g. across retries).
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Response from an LLM completion request.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content.
    pub text: String,
    /// Token usage for this completion.
    pub usage: TokenUsage,
    /// The model that produced this response.
    pub model: String,
}

/// Parameters controlling LLM generation behavior.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 = deterministic, 1.0+ = creative).
    pub temperature: f32,
    /// Optional system prompt override. If `Some`, replaces the caller's system prompt.
    pub system_prompt: Option<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

/// A tool definition forcing the model to return a single JSON object
/// matching `input_schema` instead of free text. Used for every structured
/// extraction call (classification, requirement/schedule/pricing parsing,
/// spreadsheet Q&A, response generation).
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// The tool name, also used to identify the forced tool-call in the response.
    pub name: String,
    /// A short description of what the tool call should capture.
    pub description: String,
    /// JSON Schema describing the expected shape of the tool input.
    pub input_schema: serde_json::Value,
}

/// The parsed result of a tool-forced completion: the tool's input object
/// plus the token usage for the call.
#[derive(Debug, Clone)]
pub struct ToolResponse {
    /// The JSON object the model produced for the forced tool call.
    pub input: serde_json::Value,
    /// Token usage for this completion.
    pub usage: TokenUsage,
}

/// Trait abstracting all LLM provider operations.
///
/// The trait is object-safe for use as `Box<dyn LlmProvider>`.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the display name of this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a free-text completion request to the LLM.
    ///
    /// If `params.system_prompt` is `Some`, it overrides the `system` parameter.
    async fn complete(
        &self,
        system: &str,
        user_message: &str,
        params: &GenerationParams,
    ) -> Result<LlmResponse, LlmError>;

    /// Send a completion request that forces the model to return a single
    /// structured tool call matching `tool.input_schema`, per the structured
    /// extraction contract used by the classifier, extractors, spreadsheet
    /// engine, and response generator.
    ///
    /// Returns [`LlmError::Parse`] if the model's response omits the forced
    /// tool-use block.
    async fn complete_tool(
        &self,
        system: &str,
        user_message: &str,
        tool: &ToolSpec,
        params: &GenerationParams,
    ) -> Result<ToolResponse, LlmError>;

    /// Check if the provider is reachable and configured correctly.
    async fn health_check(&self) -> Result<(), LlmError>;
}
