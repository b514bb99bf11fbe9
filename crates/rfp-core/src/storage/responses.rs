//! CRUD operations for generated responses.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::row::{parse_enum, parse_json, parse_timestamp, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::{ComplianceStatus, Response, SourceRef};

#[derive(Debug, sqlx::FromRow)]
struct ResponseRow {
    id: String,
    requirement_id: String,
    project_id: String,
    compliance_status: String,
    response_text: String,
    confidence_score: f64,
    source_refs: String,
    is_ai_generated: i64,
    is_reviewed: i64,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    notes: Option<String>,
}

impl TryFrom<ResponseRow> for Response {
    type Error = StorageError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        Ok(Response {
            id: parse_uuid(&row.id, "response")?,
            requirement_id: parse_uuid(&row.requirement_id, "response.requirement_id")?,
            project_id: parse_uuid(&row.project_id, "response.project_id")?,
            compliance_status: parse_enum::<ComplianceStatus>(
                &row.compliance_status,
                "response.compliance_status",
            )?,
            response_text: row.response_text,
            confidence_score: row.confidence_score as f32,
            source_refs: parse_json::<Vec<SourceRef>>(&row.source_refs, "response.source_refs")?,
            is_ai_generated: row.is_ai_generated != 0,
            is_reviewed: row.is_reviewed != 0,
            reviewed_by: row.reviewed_by.map(|s| parse_uuid(&s, "response.reviewed_by")).transpose()?,
            reviewed_at: row
                .reviewed_at
                .map(|s| parse_timestamp(&s, "response.reviewed_at"))
                .transpose()?,
            notes: row.notes,
        })
    }
}

/// Insert a generated response. `requirement_id` is unique, matching the
/// one-response-per-requirement invariant.
pub async fn upsert_response(pool: &DbPool, response: &Response) -> Result<(), StorageError> {
    let source_refs_json = serde_json::to_string(&response.source_refs).map_err(|e| StorageError::Decode {
        entity: "response.source_refs".to_string(),
        message: e.to_string(),
    })?;

    sqlx::query(
        "INSERT INTO responses \
         (id, requirement_id, project_id, compliance_status, response_text, confidence_score, \
          source_refs, is_ai_generated, is_reviewed, reviewed_by, reviewed_at, notes) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(requirement_id) DO UPDATE SET \
           compliance_status = excluded.compliance_status, \
           response_text = excluded.response_text, \
           confidence_score = excluded.confidence_score, \
           source_refs = excluded.source_refs, \
           is_ai_generated = excluded.is_ai_generated, \
           updated_at = datetime('now')",
    )
    .bind(response.id.to_string())
    .bind(response.requirement_id.to_string())
    .bind(response.project_id.to_string())
    .bind(response.compliance_status.label())
    .bind(&response.response_text)
    .bind(response.confidence_score as f64)
    .bind(source_refs_json)
    .bind(response.is_ai_generated as i64)
    .bind(response.is_reviewed as i64)
    .bind(response.reviewed_by.map(|id| id.to_string()))
    .bind(response.reviewed_at.map(|t| t.to_rfc3339()))
    .bind(&response.notes)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every response for a project.
pub async fn list_responses(pool: &DbPool, project_id: Uuid) -> Result<Vec<Response>, StorageError> {
    let rows = sqlx::query_as::<_, ResponseRow>("SELECT * FROM responses WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_all(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(Response::try_from).collect()
}

/// Mark a response as human-reviewed, clearing `is_ai_generated`.
pub async fn mark_reviewed(
    pool: &DbPool,
    response_id: Uuid,
    reviewer: Uuid,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE responses SET is_reviewed = 1, is_ai_generated = 0, reviewed_by = ?, \
         reviewed_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(reviewer.to_string())
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .bind(response_id.to_string())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Project, ProjectStatus, Priority, Requirement, RequirementType};
    use crate::storage::{init_test_db, projects, requirements};

    async fn seed_requirement(pool: &crate::storage::DbPool) -> (Uuid, Uuid) {
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

        let requirement = Requirement {
            id: Uuid::new_v4(),
            project_id: project.id,
            document_id: None,
            req_number: "FR-001".to_string(),
            title: "Single sign-on".to_string(),
            description: "SAML SSO support".to_string(),
            req_type: RequirementType::Functional,
            category: None,
            is_mandatory: true,
            priority: Priority::High,
            response_required: true,
            reference_section: None,
            embedding: None,
        };
        requirements::insert_requirement(pool, &requirement).await.unwrap();
        (project.id, requirement.id)
    }

    fn sample_response(project_id: Uuid, requirement_id: Uuid) -> Response {
        Response {
            id: Uuid::new_v4(),
            requirement_id,
            project_id,
            compliance_status: ComplianceStatus::FullyCompliant,
            response_text: "Supported natively via our SAML 2.0 integration.".to_string(),
            confidence_score: 0.92,
            source_refs: vec![SourceRef {
                kb_entry_id: Uuid::new_v4(),
                title: "SSO capability overview".to_string(),
            }],
            is_ai_generated: true,
            is_reviewed: false,
            reviewed_by: None,
            reviewed_at: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn upsert_and_list_round_trips() {
        let pool = init_test_db().await.unwrap();
        let (project_id, requirement_id) = seed_requirement(&pool).await;
        let response = sample_response(project_id, requirement_id);
        upsert_response(&pool, &response).await.unwrap();

        let listed = list_responses(&pool, project_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_refs.len(), 1);
        assert_eq!(listed[0].compliance_status, ComplianceStatus::FullyCompliant);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_requirement() {
        let pool = init_test_db().await.unwrap();
        let (project_id, requirement_id) = seed_requirement(&pool).await;
        let mut response = sample_response(project_id, requirement_id);
        upsert_response(&pool, &response).await.unwrap();

        response.response_text = "Revised answer after re-generation.".to_string();
        upsert_response(&pool, &response).await.unwrap();

        let listed = list_responses(&pool, project_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].response_text, "Revised answer after re-generation.");
    }

    #[tokio::test]
    async fn mark_reviewed_clears_ai_generated() {
        let pool = init_test_db().await.unwrap();
        let (project_id, requirement_id) = seed_requirement(&pool).await;
        let response = sample_response(project_id, requirement_id);
        upsert_response(&pool, &response).await.unwrap();

        let reviewer = Uuid::new_v4();
        mark_reviewed(&pool, response.id, reviewer, Utc::now()).await.unwrap();

        let listed = list_responses(&pool, project_id).await.unwrap();
        assert!(!listed[0].is_ai_generated);
        assert!(listed[0].is_reviewed);
        assert_eq!(listed[0].reviewed_by, Some(reviewer));
    }
}
