//! CRUD operations for projects.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::row::{parse_enum, parse_timestamp, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::{Project, ProcessingStatus, ProjectStatus};

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: String,
    name: String,
    owner_id: String,
    status: String,
    upload_context: Option<String>,
    processing_status: Option<String>,
    processing_message: Option<String>,
    processing_started_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StorageError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: parse_uuid(&row.id, "project")?,
            name: row.name,
            owner_id: parse_uuid(&row.owner_id, "project.owner_id")?,
            status: parse_enum::<ProjectStatus>(&row.status, "project.status")?,
            upload_context: row.upload_context,
            processing_status: row
                .processing_status
                .map(|s| parse_enum::<ProcessingStatus>(&s, "project.processing_status"))
                .transpose()?,
            processing_message: row.processing_message,
            processing_started_at: row
                .processing_started_at
                .map(|s| parse_timestamp(&s, "project.processing_started_at"))
                .transpose()?,
            created_at: parse_timestamp(&row.created_at, "project.created_at")?,
            updated_at: parse_timestamp(&row.updated_at, "project.updated_at")?,
        })
    }
}

/// Insert a new project.
pub async fn insert_project(pool: &DbPool, project: &Project) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO projects \
         (id, name, owner_id, status, upload_context, processing_status, \
          processing_message, processing_started_at, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project.id.to_string())
    .bind(&project.name)
    .bind(project.owner_id.to_string())
    .bind(project.status.as_str())
    .bind(&project.upload_context)
    .bind(project.processing_status.map(|s| s.as_str()))
    .bind(&project.processing_message)
    .bind(project.processing_started_at.map(|t| t.to_rfc3339()))
    .bind(project.created_at.to_rfc3339())
    .bind(project.updated_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Fetch a project by id. Returns `None` if not found.
pub async fn get_project(pool: &DbPool, id: Uuid) -> Result<Option<Project>, StorageError> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    row.map(Project::try_from).transpose()
}

/// List every project, most recently created first.
pub async fn list_projects(pool: &DbPool) -> Result<Vec<Project>, StorageError> {
    let rows = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(Project::try_from).collect()
}

/// Transition a project into `processing`, stamping the start time.
///
/// Fails with [`StorageError::NotFound`] mapped via the caller if the
/// project is already `processing` — the caller is expected to check
/// [`get_project`] first and surface a `PipelineError::Conflict`, per the
/// single-flight invariant in §5.
pub async fn mark_processing(
    pool: &DbPool,
    id: Uuid,
    started_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE projects SET processing_status = ?, processing_message = NULL, \
         processing_started_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(ProcessingStatus::Processing.as_str())
    .bind(started_at.to_rfc3339())
    .bind(started_at.to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Record the terminal status (`completed` or `failed`) of a pipeline run.
pub async fn mark_terminal(
    pool: &DbPool,
    id: Uuid,
    status: ProcessingStatus,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE projects SET processing_status = ?, processing_message = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(message)
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}
