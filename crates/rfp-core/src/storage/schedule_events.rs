//! CRUD operations for extracted schedule events.

use uuid::Uuid;

use super::row::{parse_date, parse_enum, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::{ScheduleEvent, ScheduleEventType};

#[derive(Debug, sqlx::FromRow)]
struct ScheduleEventRow {
    id: String,
    project_id: String,
    event_type: String,
    event_name: String,
    event_date: Option<String>,
    notes: Option<String>,
}

impl TryFrom<ScheduleEventRow> for ScheduleEvent {
    type Error = StorageError;

    fn try_from(row: ScheduleEventRow) -> Result<Self, Self::Error> {
        Ok(ScheduleEvent {
            id: parse_uuid(&row.id, "schedule_event")?,
            project_id: parse_uuid(&row.project_id, "schedule_event.project_id")?,
            event_type: parse_enum::<ScheduleEventType>(&row.event_type, "schedule_event.event_type")?,
            event_name: row.event_name,
            event_date: row
                .event_date
                .map(|d| parse_date(&d, "schedule_event.event_date"))
                .transpose()?,
            notes: row.notes,
        })
    }
}

/// Insert an extracted schedule event.
pub async fn insert_schedule_event(pool: &DbPool, event: &ScheduleEvent) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO schedule_events (id, project_id, event_type, event_name, event_date, notes) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(event.id.to_string())
    .bind(event.project_id.to_string())
    .bind(event.event_type.as_str())
    .bind(&event.event_name)
    .bind(event.event_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(&event.notes)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every schedule event for a project, ordered chronologically (nulls last).
pub async fn list_schedule_events(pool: &DbPool, project_id: Uuid) -> Result<Vec<ScheduleEvent>, StorageError> {
    let rows = sqlx::query_as::<_, ScheduleEventRow>(
        "SELECT * FROM schedule_events WHERE project_id = ? \
         ORDER BY event_date IS NULL, event_date ASC",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(ScheduleEvent::try_from).collect()
}
