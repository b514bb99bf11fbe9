//! CRUD and similarity search over the organization's knowledge base, the
//! retrieval corpus backing L10's RAG response generation.

use uuid::Uuid;

use super::row::{parse_json, parse_uuid};
use super::vector::{self, ScoredMatch};
use super::DbPool;
use crate::error::StorageError;
use crate::models::KnowledgeBaseEntry;

#[derive(Debug, sqlx::FromRow)]
struct KnowledgeBaseRow {
    id: String,
    org_id: Option<String>,
    title: String,
    content: String,
    category: Option<String>,
    tags: String,
    embedding: Option<Vec<u8>>,
    source_project_id: Option<String>,
}

impl TryFrom<KnowledgeBaseRow> for KnowledgeBaseEntry {
    type Error = StorageError;

    fn try_from(row: KnowledgeBaseRow) -> Result<Self, Self::Error> {
        Ok(KnowledgeBaseEntry {
            id: parse_uuid(&row.id, "knowledge_base")?,
            org_id: row.org_id,
            title: row.title,
            content: row.content,
            category: row.category,
            tags: parse_json(&row.tags, "knowledge_base.tags")?,
            embedding: row.embedding.and_then(|b| vector::decode(&b)),
            source_project_id: row
                .source_project_id
                .map(|s| parse_uuid(&s, "knowledge_base.source_project_id"))
                .transpose()?,
        })
    }
}

/// Insert a new knowledge base entry, e.g. a completed project folded back
/// in as reusable source material.
pub async fn insert_entry(pool: &DbPool, entry: &KnowledgeBaseEntry) -> Result<(), StorageError> {
    let tags_json = serde_json::to_string(&entry.tags).map_err(|e| StorageError::Decode {
        entity: "knowledge_base.tags".to_string(),
        message: e.to_string(),
    })?;

    sqlx::query(
        "INSERT INTO knowledge_base \
         (id, org_id, title, content, category, tags, embedding, source_project_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.id.to_string())
    .bind(&entry.org_id)
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(&entry.category)
    .bind(tags_json)
    .bind(entry.embedding.as_deref().map(vector::encode))
    .bind(entry.source_project_id.map(|id| id.to_string()))
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Fetch a single entry by id.
pub async fn get_entry(pool: &DbPool, id: Uuid) -> Result<Option<KnowledgeBaseEntry>, StorageError> {
    let row = sqlx::query_as::<_, KnowledgeBaseRow>("SELECT * FROM knowledge_base WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    row.map(KnowledgeBaseEntry::try_from).transpose()
}

/// Find the knowledge base entries most similar to `query_embedding`, above
/// `cutoff`, capped at `top_k`. Scans every embedded entry linearly; fine at
/// the corpus sizes a single organization's knowledge base reaches.
pub async fn search_similar(
    pool: &DbPool,
    query_embedding: &[f32],
    cutoff: f32,
    top_k: usize,
) -> Result<Vec<ScoredMatch<KnowledgeBaseEntry>>, StorageError> {
    let rows = sqlx::query_as::<_, KnowledgeBaseRow>(
        "SELECT * FROM knowledge_base WHERE embedding IS NOT NULL",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let embedding = row
            .embedding
            .clone()
            .and_then(|b| vector::decode(&b))
            .unwrap_or_default();
        let entry = KnowledgeBaseEntry::try_from(row)?;
        candidates.push((entry, embedding));
    }

    Ok(vector::top_k_above_cutoff(query_embedding, candidates, cutoff, top_k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;

    fn sample_entry(title: &str, embedding: Vec<f32>) -> KnowledgeBaseEntry {
        KnowledgeBaseEntry {
            id: Uuid::new_v4(),
            org_id: Some("acme".to_string()),
            title: title.to_string(),
            content: "We support SAML 2.0 single sign-on across all tiers.".to_string(),
            category: Some("security".to_string()),
            tags: vec!["sso".to_string(), "auth".to_string()],
            embedding: Some(embedding),
            source_project_id: None,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trips() {
        let pool = init_test_db().await.unwrap();
        let entry = sample_entry("SSO capability overview", vec![1.0, 0.0, 0.0]);
        insert_entry(&pool, &entry).await.unwrap();

        let fetched = get_entry(&pool, entry.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "SSO capability overview");
        assert_eq!(fetched.tags, vec!["sso".to_string(), "auth".to_string()]);
        assert_eq!(fetched.embedding, Some(vec![1.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn search_similar_filters_by_cutoff() {
        let pool = init_test_db().await.unwrap();
        insert_entry(&pool, &sample_entry("SSO capability overview", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        insert_entry(&pool, &sample_entry("Unrelated billing FAQ", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();

        let results = search_similar(&pool, &[1.0, 0.0, 0.0], 0.3, 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.title, "SSO capability overview");
    }

    #[tokio::test]
    async fn entries_without_embedding_are_excluded_from_search() {
        let pool = init_test_db().await.unwrap();
        let mut entry = sample_entry("No embedding yet", vec![]);
        entry.embedding = None;
        insert_entry(&pool, &entry).await.unwrap();

        let results = search_similar(&pool, &[1.0, 0.0, 0.0], 0.0, 5).await.unwrap();
        assert!(results.is_empty());
    }
}
