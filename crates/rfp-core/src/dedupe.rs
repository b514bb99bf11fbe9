//! Embedding-cosine deduplication of extracted requirements across chunks (L8).

use crate::embedding::{EmbeddingInputType, EmbeddingProvider};
use crate::models::Requirement;
use crate::storage::vector::cosine_similarity;

/// Drop duplicate requirements discovered across chunks.
///
/// Batch-embeds `title + " " + description` for every record, then walks
/// them in discovery order, keeping record *i* and dropping any later
/// record *j* whose cosine similarity to *i* exceeds `similarity_threshold`.
///
/// If embedding the batch fails, every record is passed through unchanged —
/// deduplication degrades rather than failing the pipeline.
pub async fn dedupe_requirements(
    embedder: &dyn EmbeddingProvider,
    requirements: Vec<Requirement>,
    similarity_threshold: f32,
) -> Vec<Requirement> {
    if requirements.len() < 2 {
        return requirements;
    }

    let texts: Vec<String> = requirements
        .iter()
        .map(|r| format!("{} {}", r.title, r.description))
        .collect();

    let embeddings = match embedder.embed(&texts, EmbeddingInputType::Document).await {
        Ok(response) => response.vectors,
        Err(e) => {
            tracing::warn!(error = %e, "embedding failed during dedup, passing all records through");
            return requirements;
        }
    };

    let mut kept = Vec::with_capacity(requirements.len());
    let mut kept_embeddings: Vec<&Vec<f32>> = Vec::with_capacity(requirements.len());

    for (requirement, embedding) in requirements.into_iter().zip(embeddings.iter()) {
        let is_duplicate = kept_embeddings
            .iter()
            .any(|kept_embedding| cosine_similarity(embedding, kept_embedding) > similarity_threshold);

        if !is_duplicate {
            kept_embeddings.push(embedding);
            kept.push(requirement);
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingResponse;
    use crate::error::EmbeddingError;
    use crate::models::{Priority, RequirementType};
    use uuid::Uuid;

    struct FixedEmbedder {
        vectors: Vec<Vec<f32>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }
        fn dimension(&self) -> usize {
            self.vectors.first().map_or(0, |v| v.len())
        }
        async fn embed(&self, _texts: &[String], _input_type: EmbeddingInputType) -> Result<EmbeddingResponse, EmbeddingError> {
            Ok(EmbeddingResponse {
                vectors: self.vectors.clone(),
                input_tokens: 10,
            })
        }
        async fn health_check(&self) -> Result<(), EmbeddingError> {
            Ok(())
        }
    }

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }
        fn dimension(&self) -> usize {
            0
        }
        async fn embed(&self, _texts: &[String], _input_type: EmbeddingInputType) -> Result<EmbeddingResponse, EmbeddingError> {
            Err(EmbeddingError::NotConfigured)
        }
        async fn health_check(&self) -> Result<(), EmbeddingError> {
            Err(EmbeddingError::NotConfigured)
        }
    }

    fn requirement(title: &str) -> Requirement {
        Requirement {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            document_id: None,
            req_number: "FR-000".to_string(),
            title: title.to_string(),
            description: "description".to_string(),
            req_type: RequirementType::Functional,
            category: None,
            is_mandatory: true,
            priority: Priority::Medium,
            response_required: true,
            reference_section: None,
            embedding: None,
        }
    }

    #[tokio::test]
    async fn drops_near_duplicate_keeping_first() {
        let embedder = FixedEmbedder {
            vectors: vec![vec![1.0, 0.0], vec![0.99, 0.01], vec![0.0, 1.0]],
        };
        let requirements = vec![requirement("SSO"), requirement("SSO duplicate"), requirement("Unrelated")];

        let kept = dedupe_requirements(&embedder, requirements, 0.95).await;
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "SSO");
        assert_eq!(kept[1].title, "Unrelated");
    }

    #[tokio::test]
    async fn passes_through_unchanged_on_embedding_failure() {
        let embedder = FailingEmbedder;
        let requirements = vec![requirement("SSO"), requirement("SSO duplicate")];
        let kept = dedupe_requirements(&embedder, requirements, 0.95).await;
        assert_eq!(kept.len(), 2);
    }

    #[tokio::test]
    async fn single_requirement_short_circuits() {
        let embedder = FailingEmbedder;
        let kept = dedupe_requirements(&embedder, vec![requirement("SSO")], 0.95).await;
        assert_eq!(kept.len(), 1);
    }
}
