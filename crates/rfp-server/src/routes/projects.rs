//! `/projects` CRUD routes.
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use rfp_core::models::{Project, ProjectStatus};
use rfp_core::storage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub upload_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub upload_context: Option<String>,
    pub processing_status: Option<rfp_core::models::ProcessingStatus>,
    pub processing_message: Option<String>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            status: p.status,
            upload_context: p.upload_context,
            processing_status: p.processing_status,
            processing_message: p.processing_message,
        }
    }
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: req.name,
        owner_id: Uuid::new_v4(),
        status: ProjectStatus::Draft,
        upload_context: req.upload_context,
        processing_status: None,
        processing_message: None,
        processing_started_at: None,
        created_at: now,
        updated_at: now,
    };
    storage::projects::insert_project(&state.db, &project).await?;
    Ok(Json(project.into()))
}

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = storage::projects::list_projects(&state.db).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Json<ProjectResponse>, ApiError> {
    let project = storage::projects::get_project(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no project with id {id}")))?;
    Ok(Json(project.into()))
}
