//! Equipment CRUD operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::EquipmentRow};

const EQUIPMENT_COLUMNS: &str = "id, code, name, status, created_at";

/// Insert a new piece of equipment in `AVAILABLE` status.
///
/// A duplicate `code` fails with [`DbError::Conflict`].
pub async fn create_equipment(pool: &PgPool, code: &str, name: &str) -> Result<EquipmentRow, DbError> {
    let row = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        INSERT INTO equipment (id, code, name, status, created_at)
        VALUES ($1, $2, $3, 'AVAILABLE', $4)
        RETURNING {EQUIPMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single piece of equipment by its primary key.
pub async fn get_equipment(pool: &PgPool, id: Uuid) -> Result<EquipmentRow, DbError> {
    sqlx::query_as::<_, EquipmentRow>(&format!(
        "SELECT {EQUIPMENT_COLUMNS} FROM equipment WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Return all equipment, optionally filtered by status, ordered by code.
pub async fn list_equipment(pool: &PgPool, status: Option<&str>) -> Result<Vec<EquipmentRow>, DbError> {
    let rows = sqlx::query_as::<_, EquipmentRow>(&format!(
        r#"
        SELECT {EQUIPMENT_COLUMNS} FROM equipment
        WHERE ($1::TEXT IS NULL OR status = $1)
        ORDER BY code ASC
        "#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Update the name and status of a piece of equipment.
pub async fn update_equipment(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    status: &str,
) -> Result<EquipmentRow, DbError> {
    sqlx::query_as::<_, EquipmentRow>(&format!(
        "UPDATE equipment SET name = $1, status = $2 WHERE id = $3 RETURNING {EQUIPMENT_COLUMNS}"
    ))
    .bind(name)
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Permanently delete a piece of equipment.
///
/// Returns `DbError::NotFound` if no row was deleted, and
/// `DbError::Conflict` if a borrow transaction still references it.
pub async fn delete_equipment(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
