//! Voyage AI embedding provider.
//!
//! Uses Voyage's `/v1/embeddings` endpoint, which accepts a batch of input
//! strings and an `input_type` hint (`"document"` for knowledge-base
//! ingestion, `"query"` for retrieval lookups) and returns one vector per
//! input in request order.

use super::{EmbeddingInputType, EmbeddingProvider, EmbeddingResponse};
use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};

const VOYAGE_BASE_URL: &str = "https://api.voyageai.com/v1";

/// Voyage rejects batches larger than this in a single request.
const MAX_BATCH_SIZE: usize = 64;

/// Embedding provider using the Voyage AI embeddings API.
pub struct VoyageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl VoyageProvider {
    /// Create a new Voyage provider with the default base URL.
    pub fn new(api_key: String, model: String, dimension: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: VOYAGE_BASE_URL.to_string(),
            api_key,
            model,
            dimension,
        }
    }

    /// Create a new Voyage provider with a custom base URL (for testing).
    pub fn with_base_url(api_key: String, model: String, dimension: usize, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            dimension,
        }
    }

    /// Embed `texts`, splitting into sub-batches of at most
    /// [`MAX_BATCH_SIZE`] and concatenating the results in input order.
    async fn embed_with_input_type(
        &self,
        texts: &[String],
        input_type: &str,
    ) -> Result<EmbeddingResponse, EmbeddingError> {
        if texts.len() <= MAX_BATCH_SIZE {
            return self.embed_one_batch(texts, input_type).await;
        }

        let mut vectors = Vec::with_capacity(texts.len());
        let mut input_tokens = 0;
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let response = self.embed_one_batch(chunk, input_type).await?;
            vectors.extend(response.vectors);
            input_tokens += response.input_tokens;
        }

        Ok(EmbeddingResponse { vectors, input_tokens })
    }

    async fn embed_one_batch(&self, texts: &[String], input_type: &str) -> Result<EmbeddingResponse, EmbeddingError> {
        tracing::debug!(
            provider = "voyage",
            model = %self.model,
            batch_size = texts.len(),
            "embedding request",
        );

        let request = VoyageRequest {
            input: texts,
            model: &self.model,
            input_type,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(EmbeddingError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }

            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<VoyageErrorResponse>(&body)
                .map(|e| e.detail)
                .unwrap_or(body);

            return Err(EmbeddingError::Api { status, message });
        }

        let body: VoyageResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Api {
                status: 0,
                message: format!("failed to parse Voyage response: {e}"),
            })?;

        let mut vectors = vec![Vec::new(); body.data.len()];
        for item in body.data {
            if item.index >= vectors.len() {
                continue;
            }
            if item.embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: item.embedding.len(),
                });
            }
            vectors[item.index] = item.embedding;
        }

        Ok(EmbeddingResponse {
            vectors,
            input_tokens: body.usage.total_tokens,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for VoyageProvider {
    fn name(&self) -> &str {
        "voyage"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String], input_type: EmbeddingInputType) -> Result<EmbeddingResponse, EmbeddingError> {
        self.embed_with_input_type(texts, input_type.as_str()).await
    }

    async fn health_check(&self) -> Result<(), EmbeddingError> {
        self.embed(&["ping".to_string()], EmbeddingInputType::Document).await?;
        Ok(())
    }
}

// --- Internal Serde types ---

#[derive(Serialize)]
struct VoyageRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct VoyageResponse {
    #[serde(default)]
    data: Vec<VoyageEmbeddingData>,
    #[serde(default)]
    usage: VoyageUsage,
}

#[derive(Deserialize)]
struct VoyageEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Deserialize, Default)]
struct VoyageUsage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct VoyageErrorResponse {
    #[serde(default)]
    detail: String,
}
