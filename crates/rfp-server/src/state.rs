//! Shared application state for the RFP/RFI pipeline server.

use std::sync::Arc;

use rfp_core::blob::BlobStore;
use rfp_core::config::Config;
use rfp_core::embedding::EmbeddingProvider;
use rfp_core::llm::LlmProvider;
use rfp_core::storage::DbPool;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Shared application state accessible by all route handlers.
///
/// One blob-store handle, one LLM client, one embedding client per process;
/// each collaborator is thread-safe and reentrant across concurrent pipeline
/// runs.
pub struct AppState {
    /// SQLite connection pool.
    pub db: DbPool,
    /// Process-wide LLM client.
    pub llm: Arc<dyn LlmProvider>,
    /// Process-wide embedding client.
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Process-wide blob store handle.
    pub blob: Arc<dyn BlobStore>,
    /// Loaded configuration (tunables, org identity, model ids).
    pub config: Config,
    /// Projects with a pipeline run currently in flight, guarding against a
    /// second `generate-full` trigger racing the status read at stage 1.
    pub in_flight: Mutex<std::collections::HashSet<Uuid>>,
}
