//! Device telemetry: location, heart rate, temperature and fall records.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{FallRecordRow, HeartRateRecordRow, LocationRecordRow, TemperatureRecordRow},
};

// ---------------------------------------------------------------------------
// location_records
// ---------------------------------------------------------------------------

/// Append a location report.
pub async fn insert_location(
    pool: &PgPool,
    dependent_id: Uuid,
    latitude: f64,
    longitude: f64,
    battery: i32,
    distance_m: f64,
    zone_level: i32,
) -> Result<LocationRecordRow, DbError> {
    let row = sqlx::query_as::<_, LocationRecordRow>(
        r#"
        INSERT INTO location_records
            (id, dependent_id, latitude, longitude, battery, distance_m, zone_level, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, dependent_id, latitude, longitude, battery, distance_m, zone_level, recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(dependent_id)
    .bind(latitude)
    .bind(longitude)
    .bind(battery)
    .bind(distance_m)
    .bind(zone_level)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The most recent `limit` location reports, newest first.
pub async fn recent_locations(
    pool: &PgPool,
    dependent_id: Uuid,
    limit: i64,
) -> Result<Vec<LocationRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, LocationRecordRow>(
        r#"
        SELECT id, dependent_id, latitude, longitude, battery, distance_m, zone_level, recorded_at
        FROM location_records
        WHERE dependent_id = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(dependent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The latest location report, if the device has ever sent one.
pub async fn latest_location(pool: &PgPool, dependent_id: Uuid) -> Result<Option<LocationRecordRow>, DbError> {
    Ok(recent_locations(pool, dependent_id, 1).await?.into_iter().next())
}

// ---------------------------------------------------------------------------
// heart_rate_records
// ---------------------------------------------------------------------------

pub async fn insert_heart_rate(
    pool: &PgPool,
    dependent_id: Uuid,
    bpm: i32,
    alerted: bool,
) -> Result<HeartRateRecordRow, DbError> {
    let row = sqlx::query_as::<_, HeartRateRecordRow>(
        r#"
        INSERT INTO heart_rate_records (id, dependent_id, bpm, alerted, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, dependent_id, bpm, alerted, recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(dependent_id)
    .bind(bpm)
    .bind(alerted)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn recent_heart_rates(
    pool: &PgPool,
    dependent_id: Uuid,
    limit: i64,
) -> Result<Vec<HeartRateRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, HeartRateRecordRow>(
        r#"
        SELECT id, dependent_id, bpm, alerted, recorded_at
        FROM heart_rate_records
        WHERE dependent_id = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(dependent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// temperature_records
// ---------------------------------------------------------------------------

pub async fn insert_temperature(
    pool: &PgPool,
    dependent_id: Uuid,
    celsius: f64,
    alerted: bool,
) -> Result<TemperatureRecordRow, DbError> {
    let row = sqlx::query_as::<_, TemperatureRecordRow>(
        r#"
        INSERT INTO temperature_records (id, dependent_id, celsius, alerted, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, dependent_id, celsius, alerted, recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(dependent_id)
    .bind(celsius)
    .bind(alerted)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn recent_temperatures(
    pool: &PgPool,
    dependent_id: Uuid,
    limit: i64,
) -> Result<Vec<TemperatureRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, TemperatureRecordRow>(
        r#"
        SELECT id, dependent_id, celsius, alerted, recorded_at
        FROM temperature_records
        WHERE dependent_id = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(dependent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// fall_records
// ---------------------------------------------------------------------------

pub async fn insert_fall(
    pool: &PgPool,
    dependent_id: Uuid,
    code: i32,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<FallRecordRow, DbError> {
    let row = sqlx::query_as::<_, FallRecordRow>(
        r#"
        INSERT INTO fall_records (id, dependent_id, code, latitude, longitude, recorded_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, dependent_id, code, latitude, longitude, recorded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(dependent_id)
    .bind(code)
    .bind(latitude)
    .bind(longitude)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn recent_falls(pool: &PgPool, dependent_id: Uuid, limit: i64) -> Result<Vec<FallRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, FallRecordRow>(
        r#"
        SELECT id, dependent_id, code, latitude, longitude, recorded_at
        FROM fall_records
        WHERE dependent_id = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(dependent_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
