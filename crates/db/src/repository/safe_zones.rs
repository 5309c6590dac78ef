//! Safe-zone settings and zone notification latches.

use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::{DbError, models::SafeZoneRow};

const ZONE_COLUMNS: &str = "dependent_id, latitude, longitude, inner_radius_m, outer_radius_m, \
                            inner_alerted, near_alerted, outer_alerted, updated_at";

/// Fetch the safe zone of a dependent, if one has been configured.
pub async fn get_safe_zone(pool: &PgPool, dependent_id: Uuid) -> Result<Option<SafeZoneRow>, DbError> {
    let row = sqlx::query_as::<_, SafeZoneRow>(&format!(
        "SELECT {ZONE_COLUMNS} FROM safe_zones WHERE dependent_id = $1"
    ))
    .bind(dependent_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create or replace the safe zone of a dependent.
///
/// Moving the zone resets every latch so the next report is judged afresh.
pub async fn upsert_safe_zone<'e>(
    executor: impl PgExecutor<'e>,
    dependent_id: Uuid,
    latitude: f64,
    longitude: f64,
    inner_radius_m: i32,
    outer_radius_m: i32,
) -> Result<SafeZoneRow, DbError> {
    let row = sqlx::query_as::<_, SafeZoneRow>(&format!(
        r#"
        INSERT INTO safe_zones
            (dependent_id, latitude, longitude, inner_radius_m, outer_radius_m,
             inner_alerted, near_alerted, outer_alerted, updated_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, FALSE, FALSE, $6)
        ON CONFLICT (dependent_id) DO UPDATE
        SET latitude = EXCLUDED.latitude,
            longitude = EXCLUDED.longitude,
            inner_radius_m = EXCLUDED.inner_radius_m,
            outer_radius_m = EXCLUDED.outer_radius_m,
            inner_alerted = FALSE,
            near_alerted = FALSE,
            outer_alerted = FALSE,
            updated_at = EXCLUDED.updated_at
        RETURNING {ZONE_COLUMNS}
        "#
    ))
    .bind(dependent_id)
    .bind(latitude)
    .bind(longitude)
    .bind(inner_radius_m)
    .bind(outer_radius_m)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// Persist the zone latches after a location report.
pub async fn update_zone_flags(
    pool: &PgPool,
    dependent_id: Uuid,
    inner_alerted: bool,
    near_alerted: bool,
    outer_alerted: bool,
) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE safe_zones
        SET inner_alerted = $1, near_alerted = $2, outer_alerted = $3, updated_at = $4
        WHERE dependent_id = $5
        "#,
    )
    .bind(inner_alerted)
    .bind(near_alerted)
    .bind(outer_alerted)
    .bind(Utc::now())
    .bind(dependent_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
