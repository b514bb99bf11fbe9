//! Configuration management for the RFP/RFI generation pipeline.
//!
//! Supports three-layer configuration loading:
//! 1. Built-in defaults
//! 2. TOML config file (`~/.rfp-pipeline/config.toml`)
//! 3. Environment variable overrides (`RFP_` prefix)

mod defaults;
mod env_overrides;
mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// LLM provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding provider configuration.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Blob store configuration.
    #[serde(default)]
    pub blob: BlobConfig,

    /// Document-processing tunables (chunking, dedup, retrieval).
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Data storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Organization identity used by the artifact builders (Win-Plan,
    /// RFI PDF, Word proposal).
    #[serde(default)]
    pub org: OrgConfig,
}

/// LLM provider credentials and model selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider backend: `"anthropic"` is the only first-class provider.
    #[serde(default = "defaults::default_llm_provider")]
    pub provider: String,

    /// API key. Read from the config file or the `RFP_LLM__API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier, e.g. `claude-sonnet-4-5-20250929`.
    #[serde(default = "defaults::default_llm_model")]
    pub model: String,

    /// Override base URL (for compatible self-hosted gateways).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default max output tokens for free-text completions.
    #[serde(default = "defaults::default_llm_max_tokens")]
    pub max_tokens: u32,
}

/// Embedding provider credentials and model selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Provider backend, e.g. `"voyage"`.
    #[serde(default = "defaults::default_embedding_provider")]
    pub provider: String,

    /// API key. Read from the config file or the `RFP_EMBEDDING__API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier, e.g. `voyage-3`.
    #[serde(default = "defaults::default_embedding_model")]
    pub model: String,

    /// Override base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Fixed vector dimension. Must match the storage column width.
    #[serde(default = "defaults::default_embedding_dimension")]
    pub dimension: usize,
}

/// S3-compatible blob store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlobConfig {
    /// Endpoint host:port, e.g. `localhost:9000`.
    #[serde(default = "defaults::default_blob_endpoint")]
    pub endpoint: String,

    /// Access key.
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret key.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Bucket name. Created on first use if it does not exist.
    #[serde(default = "defaults::default_blob_bucket")]
    pub bucket: String,

    /// Whether to use TLS when talking to the endpoint.
    #[serde(default)]
    pub secure: bool,

    /// Advisory cap on individual upload size.
    #[serde(default = "defaults::default_max_upload_size_mb")]
    pub max_upload_size_mb: u32,
}

/// Tunables for chunking, extraction, deduplication, and retrieval.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Maximum estimated tokens per chunk.
    #[serde(default = "defaults::default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    /// Estimated-token overlap between adjacent chunks.
    #[serde(default = "defaults::default_chunk_overlap_tokens")]
    pub chunk_overlap_tokens: usize,

    /// Minimum confidence a generated response must clear before it is
    /// considered reliable without human review.
    #[serde(default = "defaults::default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Cosine-similarity threshold above which two extracted requirements
    /// are considered duplicates.
    #[serde(default = "defaults::default_dedup_similarity_threshold")]
    pub dedup_similarity_threshold: f32,

    /// Minimum cosine similarity for a KB hit to be used in retrieval.
    #[serde(default = "defaults::default_retrieval_similarity_cutoff")]
    pub retrieval_similarity_cutoff: f32,

    /// Number of KB entries retrieved per requirement.
    #[serde(default = "defaults::default_retrieval_top_k")]
    pub retrieval_top_k: usize,

    /// Questions per LLM batch in the spreadsheet-answering stage.
    #[serde(default = "defaults::default_answer_batch_size")]
    pub answer_batch_size: usize,
}

/// Data storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "defaults::default_db_path")]
    pub db_path: String,
}

/// Logging / observability settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Tracing filter directive, defaults to honoring `RUST_LOG`.
    #[serde(default)]
    pub filter: Option<String>,
}

/// Organization identity injected into generated artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrgConfig {
    /// Vendor/company name shown on generated documents.
    #[serde(default = "defaults::default_company_name")]
    pub company_name: String,

    /// Fixed solution-overview paragraph used by the Win-Plan builder.
    #[serde(default = "defaults::default_solution_overview")]
    pub solution_overview: String,
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            company_name: defaults::default_company_name(),
            solution_overview: defaults::default_solution_overview(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: defaults::default_llm_provider(),
            api_key: None,
            model: defaults::default_llm_model(),
            base_url: None,
            max_tokens: defaults::default_llm_max_tokens(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: defaults::default_embedding_provider(),
            api_key: None,
            model: defaults::default_embedding_model(),
            base_url: None,
            dimension: defaults::default_embedding_dimension(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::default_blob_endpoint(),
            access_key: None,
            secret_key: None,
            bucket: defaults::default_blob_bucket(),
            secure: false,
            max_upload_size_mb: defaults::default_max_upload_size_mb(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: defaults::default_max_chunk_tokens(),
            chunk_overlap_tokens: defaults::default_chunk_overlap_tokens(),
            confidence_threshold: defaults::default_confidence_threshold(),
            dedup_similarity_threshold: defaults::default_dedup_similarity_threshold(),
            retrieval_similarity_cutoff: defaults::default_retrieval_similarity_cutoff(),
            retrieval_top_k: defaults::default_retrieval_top_k(),
            answer_batch_size: defaults::default_answer_batch_size(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::default_db_path(),
        }
    }
}

impl Config {
    /// Load configuration layered: defaults → TOML file (if present) → env overrides.
    ///
    /// `path` defaults to `~/.rfp-pipeline/config.toml` when `None`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or("~/.rfp-pipeline/config.toml");
        let expanded = expand_tilde(path);

        let mut config = if expanded.exists() {
            let raw = std::fs::read_to_string(&expanded).map_err(|_| ConfigError::FileNotFound {
                path: expanded.to_string_lossy().to_string(),
            })?;
            toml::from_str::<Config>(&raw).map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
