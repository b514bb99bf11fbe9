//! RFP/RFI pipeline HTTP trigger server.
//!
//! A thin HTTP surface over `rfp-core`: project and document CRUD, file
//! upload/download, and the `generate-full` pipeline trigger. The pipeline
//! itself runs as a background task on this same process -- there is no
//! separate worker process or queue.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health))
        .route("/projects", get(routes::projects::list).post(routes::projects::create))
        .route("/projects/{id}", get(routes::projects::get))
        .route("/projects/{id}/generate-full", post(routes::pipeline::generate_full))
        .route(
            "/projects/{id}/documents",
            get(routes::documents::list_for_project).post(routes::documents::upload),
        )
        .route("/documents/{id}/download", get(routes::documents::download));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use rfp_core::config::Config;
    use rfp_core::embedding::{EmbeddingInputType, EmbeddingProvider, EmbeddingResponse};
    use rfp_core::error::{BlobError, EmbeddingError, LlmError};
    use rfp_core::llm::{GenerationParams, LlmProvider, LlmResponse, ToolResponse, ToolSpec, TokenUsage};
    use rfp_core::blob::BlobStore;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;
    use tower::util::ServiceExt;

    struct NullLlm;

    #[async_trait::async_trait]
    impl LlmProvider for NullLlm {
        fn name(&self) -> &str {
            "null"
        }
        async fn complete(&self, _system: &str, _user_message: &str, _params: &GenerationParams) -> Result<LlmResponse, LlmError> {
            Ok(LlmResponse { text: String::new(), usage: TokenUsage::default(), model: "null".to_string() })
        }
        async fn complete_tool(&self, _system: &str, _user_message: &str, _tool: &ToolSpec, _params: &GenerationParams) -> Result<ToolResponse, LlmError> {
            Ok(ToolResponse { input: json!({}), usage: TokenUsage::default() })
        }
        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    struct NullEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for NullEmbedder {
        fn name(&self) -> &str {
            "null"
        }
        fn dimension(&self) -> usize {
            4
        }
        async fn embed(&self, texts: &[String], _input_type: EmbeddingInputType) -> Result<EmbeddingResponse, EmbeddingError> {
            Ok(EmbeddingResponse { vectors: texts.iter().map(|_| vec![0.0; 4]).collect(), input_tokens: 0 })
        }
        async fn health_check(&self) -> Result<(), EmbeddingError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryBlob {
        objects: StdMutex<HashMap<String, (Vec<u8>, String)>>,
    }

    #[async_trait::async_trait]
    impl BlobStore for InMemoryBlob {
        async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
            self.objects.lock().unwrap().insert(key.to_string(), (bytes, content_type.to_string()));
            Ok(())
        }
        async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .map(|(bytes, _)| bytes.clone())
                .ok_or_else(|| BlobError::NotFound { key: key.to_string() })
        }
        async fn delete(&self, key: &str) -> Result<(), BlobError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
        async fn exists(&self, key: &str) -> Result<bool, BlobError> {
            Ok(self.objects.lock().unwrap().contains_key(key))
        }
        fn presign_get(&self, key: &str, _ttl: std::time::Duration) -> Result<String, BlobError> {
            Ok(format!("https://blob.test/{key}"))
        }
    }

    async fn test_state() -> Arc<AppState> {
        let pool = rfp_core::storage::init_test_db().await.unwrap();
        Arc::new(AppState {
            db: pool,
            llm: Arc::new(NullLlm),
            embedder: Arc::new(NullEmbedder),
            blob: Arc::new(InMemoryBlob::default()),
            config: Config::default(),
            in_flight: Mutex::new(std::collections::HashSet::new()),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let router = build_router(test_state().await);
        let response = router.oneshot(Request::get("/api/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_and_list_projects_round_trips() {
        let router = build_router(test_state().await);

        let create = Request::builder()
            .method(Method::POST)
            .uri("/api/projects")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Acme Corp", "upload_context": "tab: Pricing" }).to_string()))
            .unwrap();
        let response = router.clone().oneshot(create).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        assert_eq!(created["name"], "Acme Corp");

        let list = router.oneshot(Request::get("/api/projects").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(list.status(), StatusCode::OK);
        let projects = body_json(list).await;
        assert_eq!(projects.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_full_rejects_project_with_no_documents() {
        let state = test_state().await;
        let project = rfp_core::models::Project {
            id: uuid::Uuid::new_v4(),
            name: "Empty Project".to_string(),
            owner_id: uuid::Uuid::new_v4(),
            status: rfp_core::models::ProjectStatus::Draft,
            upload_context: None,
            processing_status: None,
            processing_message: None,
            processing_started_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        rfp_core::storage::projects::insert_project(&state.db, &project).await.unwrap();

        let router = build_router(state);
        let response = router
            .oneshot(Request::post(format!("/api/projects/{}/generate-full", project.id)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_full_404s_for_unknown_project() {
        let router = build_router(test_state().await);
        let response = router
            .oneshot(Request::post(format!("/api/projects/{}/generate-full", uuid::Uuid::new_v4())).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
