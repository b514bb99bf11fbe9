//! CRUD operations for documents.

use uuid::Uuid;

use super::row::{parse_enum, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::{DocCategory, Document, DocumentStatus, FileType};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    project_id: String,
    filename: String,
    storage_key: String,
    file_type: String,
    size_bytes: i64,
    doc_category: Option<String>,
    parsed_text: Option<String>,
    page_count: Option<i32>,
    status: String,
    error_message: Option<String>,
    uploaded_by: Option<String>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StorageError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: parse_uuid(&row.id, "document")?,
            project_id: parse_uuid(&row.project_id, "document.project_id")?,
            filename: row.filename,
            storage_key: row.storage_key,
            file_type: parse_enum::<FileType>(&row.file_type, "document.file_type")?,
            size_bytes: row.size_bytes,
            doc_category: row
                .doc_category
                .map(|c| parse_enum::<DocCategory>(&c, "document.doc_category"))
                .transpose()?,
            parsed_text: row.parsed_text,
            page_count: row.page_count,
            status: parse_enum::<DocumentStatus>(&row.status, "document.status")?,
            error_message: row.error_message,
            uploaded_by: row.uploaded_by.map(|s| parse_uuid(&s, "document.uploaded_by")).transpose()?,
        })
    }
}

/// Insert a newly uploaded document, status `uploaded`.
///
/// Generic over any SQLite executor, so callers can pass a bare `&DbPool`
/// for a standalone insert or `&mut *tx` to fold the insert into a larger
/// transaction (see [`crate::pipeline`]'s publication step).
pub async fn insert_document<'e, E>(executor: E, document: &Document) -> Result<(), StorageError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO documents \
         (id, project_id, filename, storage_key, file_type, size_bytes, doc_category, \
          parsed_text, page_count, status, error_message, uploaded_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(document.id.to_string())
    .bind(document.project_id.to_string())
    .bind(&document.filename)
    .bind(&document.storage_key)
    .bind(document.file_type.as_str())
    .bind(document.size_bytes)
    .bind(document.doc_category.map(|c| c.label()))
    .bind(&document.parsed_text)
    .bind(document.page_count)
    .bind(document.status.as_str())
    .bind(&document.error_message)
    .bind(document.uploaded_by.map(|u| u.to_string()))
    .execute(executor)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every non-`generated_output` document for a project, in upload order.
///
/// This is the set the pipeline's `documents_exist` precondition (§7) checks
/// before starting a run.
pub async fn list_source_documents(
    pool: &DbPool,
    project_id: Uuid,
) -> Result<Vec<Document>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE project_id = ? \
         AND (doc_category IS NULL OR doc_category != 'generated_output') \
         ORDER BY created_at ASC",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(Document::try_from).collect()
}

/// Fetch a single document by id, regardless of category.
pub async fn get_document(pool: &DbPool, id: Uuid) -> Result<Option<Document>, StorageError> {
    let row = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    row.map(Document::try_from).transpose()
}

/// List every document for a project, including generated outputs, in upload order.
pub async fn list_documents(pool: &DbPool, project_id: Uuid) -> Result<Vec<Document>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE project_id = ? ORDER BY created_at ASC")
        .bind(project_id.to_string())
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(Document::try_from).collect()
}

/// Update the parsed text, page count, and status of a document after L5 parsing.
pub async fn record_parsed_text(
    pool: &DbPool,
    document_id: Uuid,
    parsed_text: &str,
    page_count: Option<i32>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE documents SET parsed_text = ?, page_count = ?, status = ?, updated_at = datetime('now') \
         WHERE id = ?",
    )
    .bind(parsed_text)
    .bind(page_count)
    .bind(DocumentStatus::Parsed.as_str())
    .bind(document_id.to_string())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Record the classifier's (L9) category assignment for a document.
pub async fn set_doc_category(
    pool: &DbPool,
    document_id: Uuid,
    category: DocCategory,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE documents SET doc_category = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(category.label())
        .bind(document_id.to_string())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Mark a document as failed with an error message, per the §7 stage-partial
/// contract (one document's failure does not abort the whole run).
pub async fn mark_document_failed(
    pool: &DbPool,
    document_id: Uuid,
    error_message: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE documents SET status = ?, error_message = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(DocumentStatus::Failed.as_str())
    .bind(error_message)
    .bind(document_id.to_string())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{init_test_db, projects};
    use crate::models::{Project, ProjectStatus};
    use chrono::Utc;

    async fn seed_project(pool: &crate::storage::DbPool) -> Uuid {
        let project = Project {
            id: Uuid::new_v4(),
            name: "Acme RFP".to_string(),
            owner_id: Uuid::new_v4(),
            status: ProjectStatus::Draft,
            upload_context: None,
            processing_status: None,
            processing_message: None,
            processing_started_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        projects::insert_project(pool, &project).await.unwrap();
        project.id
    }

    fn sample_document(project_id: Uuid) -> Document {
        Document {
            id: Uuid::new_v4(),
            project_id,
            filename: "rfp.pdf".to_string(),
            storage_key: "projects/p1/rfp.pdf".to_string(),
            file_type: FileType::Pdf,
            size_bytes: 204_800,
            doc_category: None,
            parsed_text: None,
            page_count: None,
            status: DocumentStatus::Uploaded,
            error_message: None,
            uploaded_by: None,
        }
    }

    #[tokio::test]
    async fn insert_and_list_source_documents() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let document = sample_document(project_id);
        insert_document(&pool, &document).await.unwrap();

        let docs = list_source_documents(&pool, project_id).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "rfp.pdf");
    }

    #[tokio::test]
    async fn generated_output_excluded_from_source_documents() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let mut document = sample_document(project_id);
        document.doc_category = Some(DocCategory::GeneratedOutput);
        insert_document(&pool, &document).await.unwrap();

        let docs = list_source_documents(&pool, project_id).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn record_parsed_text_updates_status() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let document = sample_document(project_id);
        insert_document(&pool, &document).await.unwrap();

        record_parsed_text(&pool, document.id, "Section 1: Scope...", Some(12))
            .await
            .unwrap();

        let docs = list_source_documents(&pool, project_id).await.unwrap();
        assert_eq!(docs[0].status, DocumentStatus::Parsed);
        assert_eq!(docs[0].page_count, Some(12));
    }

    #[tokio::test]
    async fn get_document_returns_none_for_unknown_id() {
        let pool = init_test_db().await.unwrap();
        assert!(get_document(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_documents_includes_generated_output() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let source = sample_document(project_id);
        insert_document(&pool, &source).await.unwrap();

        let mut generated = sample_document(project_id);
        generated.doc_category = Some(DocCategory::GeneratedOutput);
        generated.filename = "Win_Plan.docx".to_string();
        insert_document(&pool, &generated).await.unwrap();

        let docs = list_documents(&pool, project_id).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().any(|d| d.filename == "Win_Plan.docx"));
    }

    #[tokio::test]
    async fn mark_document_failed_records_message() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let document = sample_document(project_id);
        insert_document(&pool, &document).await.unwrap();

        mark_document_failed(&pool, document.id, "malformed PDF").await.unwrap();

        let docs = list_source_documents(&pool, project_id).await.unwrap();
        assert_eq!(docs[0].status, DocumentStatus::Failed);
        assert_eq!(docs[0].error_message.as_deref(), Some("malformed PDF"));
    }
}
