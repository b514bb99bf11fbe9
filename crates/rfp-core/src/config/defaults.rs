//! Default values for all configuration sections.
//!
//! These defaults match the processing tunables of the source system
//! (chunk sizes, embedding dimension, dedup/retrieval thresholds).

pub(super) fn default_llm_provider() -> String {
    "anthropic".to_string()
}

pub(super) fn default_llm_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

pub(super) fn default_llm_max_tokens() -> u32 {
    4096
}

pub(super) fn default_embedding_provider() -> String {
    "voyage".to_string()
}

pub(super) fn default_embedding_model() -> String {
    "voyage-3".to_string()
}

pub(super) fn default_embedding_dimension() -> usize {
    1024
}

pub(super) fn default_blob_endpoint() -> String {
    "localhost:9000".to_string()
}

pub(super) fn default_blob_bucket() -> String {
    "rfp-documents".to_string()
}

pub(super) fn default_max_upload_size_mb() -> u32 {
    100
}

pub(super) fn default_max_chunk_tokens() -> usize {
    4000
}

pub(super) fn default_chunk_overlap_tokens() -> usize {
    200
}

pub(super) fn default_confidence_threshold() -> f32 {
    0.7
}

pub(super) fn default_dedup_similarity_threshold() -> f32 {
    0.95
}

pub(super) fn default_retrieval_similarity_cutoff() -> f32 {
    0.30
}

pub(super) fn default_retrieval_top_k() -> usize {
    5
}

pub(super) fn default_answer_batch_size() -> usize {
    20
}

pub(super) fn default_db_path() -> String {
    "~/.rfp-pipeline/rfp.db".to_string()
}

pub(super) fn default_company_name() -> String {
    "Our Company".to_string()
}

pub(super) fn default_solution_overview() -> String {
    "Our platform provides a unified, configurable solution backed by enterprise-grade \
     security, support, and implementation services."
        .to_string()
}
