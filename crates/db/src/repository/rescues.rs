//! Rescue alert operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::RescueAlertRow};

const RESCUE_COLUMNS: &str = "id, dependent_id, kind, status, message, latitude, longitude, \
                              handled_by, created_at, closed_at";

/// Open a new `PENDING` rescue alert.
pub async fn create_rescue(
    pool: &PgPool,
    dependent_id: Uuid,
    kind: &str,
    message: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<RescueAlertRow, DbError> {
    let row = sqlx::query_as::<_, RescueAlertRow>(&format!(
        r#"
        INSERT INTO rescue_alerts
            (id, dependent_id, kind, status, message, latitude, longitude, created_at)
        VALUES ($1, $2, $3, 'PENDING', $4, $5, $6, $7)
        RETURNING {RESCUE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(dependent_id)
    .bind(kind)
    .bind(message)
    .bind(latitude)
    .bind(longitude)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single rescue alert by primary key.
pub async fn get_rescue(pool: &PgPool, id: Uuid) -> Result<RescueAlertRow, DbError> {
    sqlx::query_as::<_, RescueAlertRow>(&format!(
        "SELECT {RESCUE_COLUMNS} FROM rescue_alerts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// All rescue alerts, optionally filtered by status, newest first.
pub async fn list_rescues(pool: &PgPool, status: Option<&str>) -> Result<Vec<RescueAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, RescueAlertRow>(&format!(
        r#"
        SELECT {RESCUE_COLUMNS} FROM rescue_alerts
        WHERE ($1::TEXT IS NULL OR status = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Open (not `CLOSED`) alerts for one dependent, newest first.
pub async fn list_open_for_dependent(pool: &PgPool, dependent_id: Uuid) -> Result<Vec<RescueAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, RescueAlertRow>(&format!(
        r#"
        SELECT {RESCUE_COLUMNS} FROM rescue_alerts
        WHERE dependent_id = $1 AND status <> 'CLOSED'
        ORDER BY created_at DESC
        "#
    ))
    .bind(dependent_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Move a rescue alert from `expected_status` to `new_status`.
///
/// `closed_at` is stamped when the new status is `CLOSED`.  A concurrent
/// update that already moved the alert fails with [`DbError::Conflict`].
pub async fn transition_rescue(
    pool: &PgPool,
    id: Uuid,
    expected_status: &str,
    new_status: &str,
    handled_by: &str,
) -> Result<RescueAlertRow, DbError> {
    let now = Utc::now();

    sqlx::query_as::<_, RescueAlertRow>(&format!(
        r#"
        UPDATE rescue_alerts
        SET status = $1,
            handled_by = $2,
            closed_at = CASE WHEN $1 = 'CLOSED' THEN $3 ELSE closed_at END
        WHERE id = $4 AND status = $5
        RETURNING {RESCUE_COLUMNS}
        "#
    ))
    .bind(new_status)
    .bind(handled_by)
    .bind(now)
    .bind(id)
    .bind(expected_status)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DbError::Conflict(format!("rescue alert {id} is no longer {expected_status}")))
}
