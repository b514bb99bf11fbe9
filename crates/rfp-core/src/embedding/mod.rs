//! Embedding provider abstraction and implementations.
//!
//! Mirrors the shape of [`crate::llm`]: a small trait over a single
//! first-class provider (Voyage AI), returning fixed-dimension vectors used
//! for requirement deduplication (L8) and knowledge-base retrieval (L10).

pub mod voyage;

use crate::error::EmbeddingError;

/// A batch embedding response: one vector per input text, in input order.
#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    /// Embedding vectors, one per input text, same order as the request.
    pub vectors: Vec<Vec<f32>>,
    /// Total tokens billed for the batch.
    pub input_tokens: u32,
}

/// Which side of an asymmetric embedding pair a text represents.
///
/// Voyage (and most retrieval-tuned embedding models) encode documents and
/// search queries differently; embedding a query with the document encoding
/// (or vice versa) still produces a vector of the right shape but degrades
/// retrieval quality. Knowledge-base ingestion and dedup embed requirement
/// text as [`EmbeddingInputType::Document`]; retrieval lookups embed the
/// requirement being matched against the knowledge base as
/// [`EmbeddingInputType::Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingInputType {
    Document,
    Query,
}

impl EmbeddingInputType {
    /// The string Voyage's API expects for this input type.
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingInputType::Document => "document",
            EmbeddingInputType::Query => "query",
        }
    }
}

/// Trait abstracting embedding provider operations.
///
/// The trait is object-safe for use as `Box<dyn EmbeddingProvider>`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the display name of this provider (e.g., "voyage").
    fn name(&self) -> &str;

    /// The fixed vector dimension this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, tagged with whether they are documents being
    /// indexed or a query being matched against an index.
    ///
    /// Implementations sub-batch internally as needed; callers may pass an
    /// arbitrarily large `texts` slice.
    ///
    /// Returns [`EmbeddingError::DimensionMismatch`] if any returned vector's
    /// length does not match [`EmbeddingProvider::dimension`].
    async fn embed(&self, texts: &[String], input_type: EmbeddingInputType) -> Result<EmbeddingResponse, EmbeddingError>;

    /// Check if the provider is reachable and configured correctly.
    async fn health_check(&self) -> Result<(), EmbeddingError>;
}
