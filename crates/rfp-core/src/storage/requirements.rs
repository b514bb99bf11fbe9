//! CRUD operations for extracted requirements.

use uuid::Uuid;

use super::row::{parse_enum, parse_uuid};
use super::vector;
use super::DbPool;
use crate::error::StorageError;
use crate::models::{Priority, Requirement, RequirementType};

#[derive(Debug, sqlx::FromRow)]
struct RequirementRow {
    id: String,
    project_id: String,
    document_id: Option<String>,
    req_number: String,
    title: String,
    description: String,
    req_type: String,
    category: Option<String>,
    is_mandatory: i64,
    priority: String,
    response_required: i64,
    reference_section: Option<String>,
    embedding: Option<Vec<u8>>,
}

impl TryFrom<RequirementRow> for Requirement {
    type Error = StorageError;

    fn try_from(row: RequirementRow) -> Result<Self, Self::Error> {
        Ok(Requirement {
            id: parse_uuid(&row.id, "requirement")?,
            project_id: parse_uuid(&row.project_id, "requirement.project_id")?,
            document_id: row
                .document_id
                .map(|s| parse_uuid(&s, "requirement.document_id"))
                .transpose()?,
            req_number: row.req_number,
            title: row.title,
            description: row.description,
            req_type: parse_enum::<RequirementType>(&row.req_type, "requirement.req_type")?,
            category: row.category,
            is_mandatory: row.is_mandatory != 0,
            priority: parse_enum::<Priority>(&row.priority, "requirement.priority")?,
            response_required: row.response_required != 0,
            reference_section: row.reference_section,
            embedding: row.embedding.and_then(|b| vector::decode(&b)),
        })
    }
}

/// Insert a newly extracted requirement.
pub async fn insert_requirement(pool: &DbPool, requirement: &Requirement) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO requirements \
         (id, project_id, document_id, req_number, title, description, req_type, category, \
          is_mandatory, priority, response_required, reference_section, embedding) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(requirement.id.to_string())
    .bind(requirement.project_id.to_string())
    .bind(requirement.document_id.map(|id| id.to_string()))
    .bind(&requirement.req_number)
    .bind(&requirement.title)
    .bind(&requirement.description)
    .bind(requirement.req_type.as_str())
    .bind(&requirement.category)
    .bind(requirement.is_mandatory as i64)
    .bind(requirement.priority.as_str())
    .bind(requirement.response_required as i64)
    .bind(&requirement.reference_section)
    .bind(requirement.embedding.as_deref().map(vector::encode))
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every requirement for a project, ordered by `req_number`.
pub async fn list_requirements(pool: &DbPool, project_id: Uuid) -> Result<Vec<Requirement>, StorageError> {
    let rows = sqlx::query_as::<_, RequirementRow>(
        "SELECT * FROM requirements WHERE project_id = ? ORDER BY req_number",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(Requirement::try_from).collect()
}

/// Count requirements already assigned to `req_type` for a project, used to
/// compute the next `req_number` suffix (e.g. next `FR-00N`).
pub async fn count_by_type(
    pool: &DbPool,
    project_id: Uuid,
    req_type: RequirementType,
) -> Result<i64, StorageError> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM requirements WHERE project_id = ? AND req_type = ?",
    )
    .bind(project_id.to_string())
    .bind(req_type.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(count)
}

/// Persist a computed embedding for an existing requirement.
pub async fn set_embedding(pool: &DbPool, requirement_id: Uuid, embedding: &[f32]) -> Result<(), StorageError> {
    sqlx::query("UPDATE requirements SET embedding = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(vector::encode(embedding))
        .bind(requirement_id.to_string())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Delete a requirement outright, used by the deduper (L8) to drop a
/// duplicate once its canonical counterpart is kept.
pub async fn delete_requirement(pool: &DbPool, requirement_id: Uuid) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM requirements WHERE id = ?")
        .bind(requirement_id.to_string())
        .execute(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, ProjectStatus};
    use crate::storage::{init_test_db, projects};
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

    fn sample_requirement(project_id: Uuid, req_number: &str) -> Requirement {
        Requirement {
            id: Uuid::new_v4(),
            project_id,
            document_id: None,
            req_number: req_number.to_string(),
            title: "Single sign-on".to_string(),
            description: "The system must support SAML SSO.".to_string(),
            req_type: RequirementType::Functional,
            category: Some("security".to_string()),
            is_mandatory: true,
            priority: Priority::High,
            response_required: true,
            reference_section: Some("3.2.1".to_string()),
            embedding: None,
        }
    }

    #[tokio::test]
    async fn insert_and_list_round_trips() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let requirement = sample_requirement(project_id, "FR-001");
        insert_requirement(&pool, &requirement).await.unwrap();

        let listed = list_requirements(&pool, project_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Single sign-on");
        assert!(listed[0].embedding.is_none());
    }

    #[tokio::test]
    async fn set_embedding_persists_vector() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let requirement = sample_requirement(project_id, "FR-001");
        insert_requirement(&pool, &requirement).await.unwrap();

        let embedding = vec![0.1_f32; 1024];
        set_embedding(&pool, requirement.id, &embedding).await.unwrap();

        let listed = list_requirements(&pool, project_id).await.unwrap();
        assert_eq!(listed[0].embedding.as_ref().unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn count_by_type_tracks_sequence() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        insert_requirement(&pool, &sample_requirement(project_id, "FR-001")).await.unwrap();
        insert_requirement(&pool, &sample_requirement(project_id, "FR-002")).await.unwrap();

        let count = count_by_type(&pool, project_id, RequirementType::Functional).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn delete_requirement_removes_row() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        let requirement = sample_requirement(project_id, "FR-001");
        insert_requirement(&pool, &requirement).await.unwrap();

        delete_requirement(&pool, requirement.id).await.unwrap();
        let listed = list_requirements(&pool, project_id).await.unwrap();
        assert!(listed.is_empty());
    }
}
