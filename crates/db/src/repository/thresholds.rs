//! Vital-sign thresholds and their alert latches.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::VitalThresholdsRow};

const THRESHOLD_COLUMNS: &str = "dependent_id, min_bpm, max_bpm, max_celsius, \
                                 heart_alert_active, temperature_alert_active, updated_at";

/// Fetch the thresholds of a dependent.
pub async fn get_thresholds(pool: &PgPool, dependent_id: Uuid) -> Result<Option<VitalThresholdsRow>, DbError> {
    let row = sqlx::query_as::<_, VitalThresholdsRow>(&format!(
        "SELECT {THRESHOLD_COLUMNS} FROM vital_thresholds WHERE dependent_id = $1"
    ))
    .bind(dependent_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create or replace the thresholds of a dependent.
///
/// Changing the limits clears both latches.
pub async fn upsert_thresholds(
    pool: &PgPool,
    dependent_id: Uuid,
    min_bpm: i32,
    max_bpm: i32,
    max_celsius: f64,
) -> Result<VitalThresholdsRow, DbError> {
    let row = sqlx::query_as::<_, VitalThresholdsRow>(&format!(
        r#"
        INSERT INTO vital_thresholds
            (dependent_id, min_bpm, max_bpm, max_celsius,
             heart_alert_active, temperature_alert_active, updated_at)
        VALUES ($1, $2, $3, $4, FALSE, FALSE, $5)
        ON CONFLICT (dependent_id) DO UPDATE
        SET min_bpm = EXCLUDED.min_bpm,
            max_bpm = EXCLUDED.max_bpm,
            max_celsius = EXCLUDED.max_celsius,
            heart_alert_active = FALSE,
            temperature_alert_active = FALSE,
            updated_at = EXCLUDED.updated_at
        RETURNING {THRESHOLD_COLUMNS}
        "#
    ))
    .bind(dependent_id)
    .bind(min_bpm)
    .bind(max_bpm)
    .bind(max_celsius)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Persist the heart-rate latch.
pub async fn set_heart_alert(pool: &PgPool, dependent_id: Uuid, active: bool) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE vital_thresholds SET heart_alert_active = $1, updated_at = $2 WHERE dependent_id = $3",
    )
    .bind(active)
    .bind(Utc::now())
    .bind(dependent_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist the temperature latch.
pub async fn set_temperature_alert(pool: &PgPool, dependent_id: Uuid, active: bool) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE vital_thresholds SET temperature_alert_active = $1, updated_at = $2 WHERE dependent_id = $3",
    )
    .bind(active)
    .bind(Utc::now())
    .bind(dependent_id)
    .execute(pool)
    .await?;
    Ok(())
}
