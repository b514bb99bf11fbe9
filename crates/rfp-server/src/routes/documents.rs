//! `/projects/{id}/documents` and `/documents/{id}/download` routes.
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rfp_core::models::{Document, DocumentStatus, FileType};
use rfp_core::storage;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub filename: String,
    pub file_type: FileType,
    pub size_bytes: i64,
    pub doc_category: Option<rfp_core::models::DocCategory>,
    pub status: DocumentStatus,
}

impl From<Document> for DocumentResponse {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            project_id: d.project_id,
            filename: d.filename,
            file_type: d.file_type,
            size_bytes: d.size_bytes,
            doc_category: d.doc_category,
            status: d.status,
        }
    }
}

pub async fn list_for_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let docs = storage::documents::list_documents(&state.db, project_id).await?;
    Ok(Json(docs.into_iter().map(DocumentResponse::from).collect()))
}

/// Accept a single-file multipart upload, store it in the blob backend, and
/// record a `Document` row with status `uploaded`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, ApiError> {
    storage::projects::get_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no project with id {project_id}")))?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| ApiError::BadRequest("expected a single file field".to_string()))?;

    let filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("uploaded field has no filename".to_string()))?;
    let file_type = FileType::from_extension(&filename)
        .ok_or_else(|| ApiError::BadRequest(format!("unsupported file type for {filename}")))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read upload body: {e}")))?;

    let max_bytes = state.config.blob.max_upload_size_mb as usize * 1024 * 1024;
    if bytes.len() > max_bytes {
        return Err(ApiError::BadRequest(format!(
            "upload exceeds the {} MB limit",
            state.config.blob.max_upload_size_mb
        )));
    }

    let storage_key = format!("projects/{project_id}/source/{}/{filename}", Uuid::new_v4());
    state.blob.put(&storage_key, bytes.to_vec(), content_type_for(file_type)).await?;

    let document = Document {
        id: Uuid::new_v4(),
        project_id,
        filename: filename.clone(),
        storage_key,
        file_type,
        size_bytes: bytes.len() as i64,
        doc_category: None,
        parsed_text: None,
        page_count: None,
        status: DocumentStatus::Uploaded,
        error_message: None,
        uploaded_by: None,
    };
    storage::documents::insert_document(&state.db, &document).await?;

    Ok(Json(document.into()))
}

pub async fn download(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let document = storage::documents::get_document(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no document with id {id}")))?;

    let bytes = state.blob.get(&document.storage_key).await?;
    let content_type = content_type_for(document.file_type);
    let disposition = format!("attachment; filename=\"{}\"", document.filename);

    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition.as_str())],
        Bytes::from(bytes),
    )
        .into_response())
}

fn content_type_for(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Pdf => "application/pdf",
        FileType::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        FileType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        FileType::Csv => "text/csv",
        FileType::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        FileType::Gsheet => "application/vnd.google-apps.spreadsheet",
    }
}
