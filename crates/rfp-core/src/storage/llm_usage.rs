//! LLM and embedding usage tracking — stores per-call token counts and
//! costs against the §10 cost-observability ledger.

use uuid::Uuid;

use super::row::{parse_timestamp, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::LlmUsageRecord;

#[derive(Debug, sqlx::FromRow)]
struct LlmUsageRow {
    id: String,
    project_id: Option<String>,
    provider: String,
    model: String,
    input_tokens: i64,
    output_tokens: i64,
    cost_usd: f64,
    occurred_at: String,
}

impl TryFrom<LlmUsageRow> for LlmUsageRecord {
    type Error = StorageError;

    fn try_from(row: LlmUsageRow) -> Result<Self, Self::Error> {
        Ok(LlmUsageRecord {
            id: parse_uuid(&row.id, "llm_usage")?,
            project_id: row
                .project_id
                .map(|s| parse_uuid(&s, "llm_usage.project_id"))
                .transpose()?,
            provider: row.provider,
            model: row.model,
            input_tokens: row.input_tokens as u32,
            output_tokens: row.output_tokens as u32,
            estimated_cost_usd: row.cost_usd,
            occurred_at: parse_timestamp(&row.occurred_at, "llm_usage.occurred_at")?,
        })
    }
}

/// Summary of costs across multiple time windows.
#[derive(Debug, serde::Serialize)]
pub struct CostSummary {
    pub cost_today: f64,
    pub cost_7d: f64,
    pub cost_30d: f64,
    pub cost_all_time: f64,
    pub calls_today: i64,
    pub calls_7d: i64,
    pub calls_30d: i64,
    pub calls_all_time: i64,
}

/// Daily cost aggregation for chart data.
#[derive(Debug, serde::Serialize)]
pub struct DailyCostSummary {
    pub date: String,
    pub cost: f64,
    pub calls: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// Cost breakdown by provider + model.
#[derive(Debug, serde::Serialize)]
pub struct ModelCostBreakdown {
    pub provider: String,
    pub model: String,
    pub cost: f64,
    pub calls: i64,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

/// Record a single LLM or embedding call.
pub async fn insert_llm_usage(pool: &DbPool, record: &LlmUsageRecord) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO llm_usage \
         (id, project_id, provider, model, input_tokens, output_tokens, cost_usd, occurred_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id.to_string())
    .bind(record.project_id.map(|id| id.to_string()))
    .bind(&record.provider)
    .bind(&record.model)
    .bind(record.input_tokens)
    .bind(record.output_tokens)
    .bind(record.estimated_cost_usd)
    .bind(record.occurred_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every usage record for a project, most recent first.
pub async fn list_for_project(pool: &DbPool, project_id: Uuid) -> Result<Vec<LlmUsageRecord>, StorageError> {
    let rows = sqlx::query_as::<_, LlmUsageRow>(
        "SELECT * FROM llm_usage WHERE project_id = ? ORDER BY occurred_at DESC",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(LlmUsageRecord::try_from).collect()
}

/// Get cost summary across time windows.
pub async fn get_cost_summary(pool: &DbPool) -> Result<CostSummary, StorageError> {
    let row: (f64, i64, f64, i64, f64, i64, f64, i64) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(CASE WHEN occurred_at >= date('now') THEN cost_usd ELSE 0.0 END), 0.0),
            COALESCE(SUM(CASE WHEN occurred_at >= date('now') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN occurred_at >= date('now', '-7 days') THEN cost_usd ELSE 0.0 END), 0.0),
            COALESCE(SUM(CASE WHEN occurred_at >= date('now', '-7 days') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN occurred_at >= date('now', '-30 days') THEN cost_usd ELSE 0.0 END), 0.0),
            COALESCE(SUM(CASE WHEN occurred_at >= date('now', '-30 days') THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(cost_usd), 0.0),
            COUNT(*)
        FROM llm_usage",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(CostSummary {
        cost_today: row.0,
        calls_today: row.1,
        cost_7d: row.2,
        calls_7d: row.3,
        cost_30d: row.4,
        calls_30d: row.5,
        cost_all_time: row.6,
        calls_all_time: row.7,
    })
}

/// Get daily cost aggregation for chart data.
pub async fn get_daily_costs(pool: &DbPool, days: u32) -> Result<Vec<DailyCostSummary>, StorageError> {
    let rows: Vec<(String, f64, i64, i64, i64)> = sqlx::query_as(
        "SELECT
            date(occurred_at) as day,
            COALESCE(SUM(cost_usd), 0.0),
            COUNT(*),
            COALESCE(SUM(input_tokens), 0),
            COALESCE(SUM(output_tokens), 0)
        FROM llm_usage
        WHERE occurred_at >= date('now', '-' || ?1 || ' days')
        GROUP BY day
        ORDER BY day",
    )
    .bind(days)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(rows
        .into_iter()
        .map(
            |(date, cost, calls, input_tokens, output_tokens)| DailyCostSummary {
                date,
                cost,
                calls,
                input_tokens,
                output_tokens,
            },
        )
        .collect())
}

/// Get cost breakdown by provider + model.
pub async fn get_model_breakdown(pool: &DbPool, days: u32) -> Result<Vec<ModelCostBreakdown>, StorageError> {
    let rows: Vec<(String, String, f64, i64, i64, i64)> = sqlx::query_as(
        "SELECT
            provider,
            model,
            COALESCE(SUM(cost_usd), 0.0),
            COUNT(*),
            COALESCE(SUM(input_tokens), 0),
            COALESCE(SUM(output_tokens), 0)
        FROM llm_usage
        WHERE occurred_at >= date('now', '-' || ?1 || ' days')
        GROUP BY provider, model
        ORDER BY SUM(cost_usd) DESC",
    )
    .bind(days)
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(rows
        .into_iter()
        .map(
            |(provider, model, cost, calls, input_tokens, output_tokens)| ModelCostBreakdown {
                provider,
                model,
                cost,
                calls,
                input_tokens,
                output_tokens,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::init_test_db;
    use chrono::Utc;

    fn sample_record(provider: &str, model: &str, project_id: Option<Uuid>) -> LlmUsageRecord {
        LlmUsageRecord {
            id: Uuid::new_v4(),
            project_id,
            provider: provider.to_string(),
            model: model.to_string(),
            input_tokens: 100,
            output_tokens: 50,
            estimated_cost_usd: 0.001,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_query_summary() {
        let pool = init_test_db().await.expect("init db");

        insert_llm_usage(&pool, &sample_record("anthropic", "claude-sonnet", None))
            .await
            .expect("insert");
        insert_llm_usage(&pool, &sample_record("voyage", "voyage-3", None))
            .await
            .expect("insert");

        let summary = get_cost_summary(&pool).await.expect("summary");
        assert_eq!(summary.calls_all_time, 2);
        assert!(summary.cost_all_time > 0.0);
    }

    #[tokio::test]
    async fn model_breakdown_groups_correctly() {
        let pool = init_test_db().await.expect("init db");

        insert_llm_usage(&pool, &sample_record("anthropic", "claude-sonnet", None))
            .await
            .expect("insert");
        insert_llm_usage(&pool, &sample_record("anthropic", "claude-sonnet", None))
            .await
            .expect("insert");
        insert_llm_usage(&pool, &sample_record("voyage", "voyage-3", None))
            .await
            .expect("insert");

        let breakdown = get_model_breakdown(&pool, 30).await.expect("breakdown");
        assert_eq!(breakdown.len(), 2);
    }

    #[tokio::test]
    async fn list_for_project_filters_to_project() {
        let pool = init_test_db().await.expect("init db");
        let project_id = Uuid::new_v4();

        insert_llm_usage(&pool, &sample_record("anthropic", "claude-sonnet", Some(project_id)))
            .await
            .expect("insert");
        insert_llm_usage(&pool, &sample_record("anthropic", "claude-sonnet", None))
            .await
            .expect("insert");

        let records = list_for_project(&pool, project_id).await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_id, Some(project_id));
    }

    #[tokio::test]
    async fn empty_table_returns_zero_summary() {
        let pool = init_test_db().await.expect("init db");

        let summary = get_cost_summary(&pool).await.expect("summary");
        assert_eq!(summary.calls_all_time, 0);
        assert!((summary.cost_all_time).abs() < f64::EPSILON);
    }
}
