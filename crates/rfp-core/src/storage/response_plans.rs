//! CRUD operations for the response/win-plan document (L14 artifact input).

use uuid::Uuid;

use super::row::{parse_json, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::ResponsePlan;

#[derive(Debug, sqlx::FromRow)]
struct ResponsePlanRow {
    id: String,
    project_id: String,
    workstreams: String,
    escalation_matrix: String,
    version: i32,
    notes: Option<String>,
    owner_id: Option<String>,
}

impl TryFrom<ResponsePlanRow> for ResponsePlan {
    type Error = StorageError;

    fn try_from(row: ResponsePlanRow) -> Result<Self, Self::Error> {
        Ok(ResponsePlan {
            id: parse_uuid(&row.id, "response_plan")?,
            project_id: parse_uuid(&row.project_id, "response_plan.project_id")?,
            workstreams: parse_json(&row.workstreams, "response_plan.workstreams")?,
            escalation_matrix: parse_json(&row.escalation_matrix, "response_plan.escalation_matrix")?,
            version: row.version,
            notes: row.notes,
            owner_id: row.owner_id.map(|s| parse_uuid(&s, "response_plan.owner_id")).transpose()?,
        })
    }
}

/// Insert or replace the single response plan for a project, bumping `version`.
pub async fn upsert_plan(pool: &DbPool, plan: &ResponsePlan) -> Result<(), StorageError> {
    let workstreams_json = serde_json::to_string(&plan.workstreams).map_err(|e| StorageError::Decode {
        entity: "response_plan.workstreams".to_string(),
        message: e.to_string(),
    })?;
    let escalation_matrix_json =
        serde_json::to_string(&plan.escalation_matrix).map_err(|e| StorageError::Decode {
            entity: "response_plan.escalation_matrix".to_string(),
            message: e.to_string(),
        })?;

    sqlx::query(
        "INSERT INTO response_plans \
         (id, project_id, workstreams, escalation_matrix, version, notes, owner_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(project_id) DO UPDATE SET \
           workstreams = excluded.workstreams, \
           escalation_matrix = excluded.escalation_matrix, \
           version = response_plans.version + 1, \
           notes = excluded.notes, \
           updated_at = datetime('now')",
    )
    .bind(plan.id.to_string())
    .bind(plan.project_id.to_string())
    .bind(workstreams_json)
    .bind(escalation_matrix_json)
    .bind(plan.version)
    .bind(&plan.notes)
    .bind(plan.owner_id.map(|id| id.to_string()))
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// Fetch the response plan for a project, if one has been generated.
pub async fn get_plan(pool: &DbPool, project_id: Uuid) -> Result<Option<ResponsePlan>, StorageError> {
    let row = sqlx::query_as::<_, ResponsePlanRow>("SELECT * FROM response_plans WHERE project_id = ?")
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Query { source: e })?;

    row.map(ResponsePlan::try_from).transpose()
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

    #[tokio::test]
    async fn upsert_bumps_version_on_conflict() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;

        let plan = ResponsePlan {
            id: Uuid::new_v4(),
            project_id,
            workstreams: serde_json::json!([{"name": "Discovery"}]),
            escalation_matrix: serde_json::json!([]),
            version: 1,
            notes: None,
            owner_id: None,
        };
        upsert_plan(&pool, &plan).await.unwrap();

        let fetched = get_plan(&pool, project_id).await.unwrap().unwrap();
        assert_eq!(fetched.version, 1);

        upsert_plan(&pool, &plan).await.unwrap();
        let fetched_again = get_plan(&pool, project_id).await.unwrap().unwrap();
        assert_eq!(fetched_again.version, 2);
    }

    #[tokio::test]
    async fn missing_plan_returns_none() {
        let pool = init_test_db().await.unwrap();
        let project_id = seed_project(&pool).await;
        assert!(get_plan(&pool, project_id).await.unwrap().is_none());
    }
}
