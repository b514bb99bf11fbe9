//! Knowledge-base retrieval (L11): embed a requirement as a query and fetch
//! the most similar knowledge-base entries to ground response generation.

use uuid::Uuid;

use crate::embedding::{EmbeddingInputType, EmbeddingProvider};
use crate::models::{KnowledgeBaseEntry, Requirement};
use crate::storage::vector::ScoredMatch;
use crate::storage::DbPool;

/// Retrieve the knowledge-base entries most relevant to `requirement`.
///
/// Embeds `title + " " + description` as the query, then delegates to
/// [`crate::storage::knowledge_base::search_similar`] with `cutoff` and
/// `top_k`. Any embedding or storage failure degrades to an empty result —
/// response generation without grounding still proceeds, just unsupported.
pub async fn retrieve_context(
    pool: &DbPool,
    embedder: &dyn EmbeddingProvider,
    requirement: &Requirement,
    cutoff: f32,
    top_k: usize,
) -> Vec<ScoredMatch<KnowledgeBaseEntry>> {
    let query_text = format!("{} {}", requirement.title, requirement.description);

    let embedding = match embedder.embed(std::slice::from_ref(&query_text), EmbeddingInputType::Query).await {
        Ok(response) => match response.vectors.into_iter().next() {
            Some(vector) => vector,
            None => {
                tracing::warn!(requirement_id = %requirement.id, "embedding provider returned no vectors for retrieval query");
                return Vec::new();
            }
        },
        Err(e) => {
            tracing::warn!(requirement_id = %requirement.id, error = %e, "retrieval query embedding failed");
            return Vec::new();
        }
    };

    match crate::storage::knowledge_base::search_similar(pool, &embedding, cutoff, top_k).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(requirement_id = %requirement.id, error = %e, "knowledge base search failed");
            Vec::new()
        }
    }
}

/// Build a numbered, truncated excerpt block from retrieved matches, for
/// inclusion in a response-generation prompt. Each excerpt is capped at
/// `max_chars_per_entry` characters.
pub fn format_context_excerpts(matches: &[ScoredMatch<KnowledgeBaseEntry>], max_chars_per_entry: usize) -> String {
    if matches.is_empty() {
        return "No related prior material was found.".to_string();
    }

    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let excerpt: String = m.item.content.chars().take(max_chars_per_entry).collect();
            format!("[{}] {} (similarity {:.2}):\n{}", i + 1, m.item.title, m.similarity, excerpt)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Resolve the `source_refs` (knowledge-base entry ids) a generated response
/// should cite, in the order they were retrieved.
pub fn source_refs(matches: &[ScoredMatch<KnowledgeBaseEntry>]) -> Vec<Uuid> {
    matches.iter().map(|m| m.item.id).collect()
}
