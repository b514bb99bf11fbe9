//! CRUD operations for extracted pricing line items.

use uuid::Uuid;

use super::row::{parse_enum, parse_uuid};
use super::DbPool;
use crate::error::StorageError;
use crate::models::{PricingCategory, PricingItem};

#[derive(Debug, sqlx::FromRow)]
struct PricingItemRow {
    id: String,
    project_id: String,
    category: String,
    line_item: String,
    description: Option<String>,
    unit_cost: Option<f64>,
    quantity: Option<i32>,
    total: Option<f64>,
    currency: String,
    year: Option<i32>,
    notes: Option<String>,
}

impl TryFrom<PricingItemRow> for PricingItem {
    type Error = StorageError;

    fn try_from(row: PricingItemRow) -> Result<Self, Self::Error> {
        Ok(PricingItem {
            id: parse_uuid(&row.id, "pricing_item")?,
            project_id: parse_uuid(&row.project_id, "pricing_item.project_id")?,
            category: parse_enum::<PricingCategory>(&row.category, "pricing_item.category")?,
            line_item: row.line_item,
            description: row.description,
            unit_cost: row.unit_cost,
            quantity: row.quantity,
            total: row.total,
            currency: row.currency,
            year: row.year,
            notes: row.notes,
        })
    }
}

/// Insert an extracted pricing line item.
pub async fn insert_pricing_item(pool: &DbPool, item: &PricingItem) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO pricing_items \
         (id, project_id, category, line_item, description, unit_cost, quantity, total, \
          currency, year, notes) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(item.id.to_string())
    .bind(item.project_id.to_string())
    .bind(item.category.as_str())
    .bind(&item.line_item)
    .bind(&item.description)
    .bind(item.unit_cost)
    .bind(item.quantity)
    .bind(item.total)
    .bind(&item.currency)
    .bind(item.year)
    .bind(&item.notes)
    .execute(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    Ok(())
}

/// List every pricing item for a project.
pub async fn list_pricing_items(pool: &DbPool, project_id: Uuid) -> Result<Vec<PricingItem>, StorageError> {
    let rows = sqlx::query_as::<_, PricingItemRow>(
        "SELECT * FROM pricing_items WHERE project_id = ? ORDER BY category, line_item",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await
    .map_err(|e| StorageError::Query { source: e })?;

    rows.into_iter().map(PricingItem::try_from).collect()
}
