//! `/projects/{id}/generate-full` pipeline trigger.
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rfp_core::models::ProcessingStatus;
use rfp_core::pipeline::{self, PipelineDeps};
use rfp_core::storage;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Trigger a full generation run for a project.
///
/// Idempotent on `processing_status`: `409` if a run is already in flight,
/// `400` if the project has no non-generated documents, otherwise flips the
/// project to `processing` and returns `202` immediately while the pipeline
/// runs as a background task on this process.
pub async fn generate_full(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let project = storage::projects::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no project with id {project_id}")))?;

    if project.processing_status == Some(ProcessingStatus::Processing) {
        return Err(ApiError::Conflict("pipeline already in progress for this project".to_string()));
    }

    let documents = storage::documents::list_source_documents(&state.db, project_id).await?;
    if documents.is_empty() {
        return Err(ApiError::BadRequest("No documents to process for this project".to_string()));
    }

    {
        let mut in_flight = state.in_flight.lock().await;
        if !in_flight.insert(project_id) {
            return Err(ApiError::Conflict("already in progress".to_string()));
        }
    }

    let spawned_state = state.clone();
    tokio::spawn(async move {
        let deps = PipelineDeps {
            pool: &spawned_state.db,
            llm: spawned_state.llm.as_ref(),
            embedder: spawned_state.embedder.as_ref(),
            blob: spawned_state.blob.as_ref(),
            config: &spawned_state.config,
        };
        if let Err(e) = pipeline::run_pipeline(&deps, project_id).await {
            tracing::error!(project_id = %project_id, error = %e, "pipeline run failed");
        }
        spawned_state.in_flight.lock().await.remove(&project_id);
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "project_id": project_id, "status": "processing" }))))
}
