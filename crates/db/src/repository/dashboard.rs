//! Aggregate counts for the administrative dashboard.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::{DbError, models::StatusCountRow};

/// Everything the dashboard charts need, in one round of queries.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub users: i64,
    pub dependents: i64,
    pub equipment_by_status: Vec<StatusCountRow>,
    pub borrows_by_status: Vec<StatusCountRow>,
    pub rescues_by_kind_last_24h: Vec<StatusCountRow>,
    pub open_rescues: i64,
}

async fn count(pool: &PgPool, sql: &str) -> Result<i64, DbError> {
    let (n,): (i64,) = sqlx::query_as(sql).fetch_one(pool).await?;
    Ok(n)
}

async fn group_by_status(pool: &PgPool, table: &str) -> Result<Vec<StatusCountRow>, DbError> {
    let rows = sqlx::query_as::<_, StatusCountRow>(&format!(
        "SELECT status, COUNT(*) AS count FROM {table} GROUP BY status ORDER BY status"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Collect the dashboard counts.
pub async fn counts(pool: &PgPool) -> Result<DashboardCounts, DbError> {
    let since = Utc::now() - Duration::hours(24);

    let rescues_by_kind_last_24h = sqlx::query_as::<_, StatusCountRow>(
        r#"
        SELECT kind AS status, COUNT(*) AS count
        FROM rescue_alerts
        WHERE created_at >= $1
        GROUP BY kind
        ORDER BY kind
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(DashboardCounts {
        users: count(pool, "SELECT COUNT(*) FROM users").await?,
        dependents: count(pool, "SELECT COUNT(*) FROM dependents").await?,
        equipment_by_status: group_by_status(pool, "equipment").await?,
        borrows_by_status: group_by_status(pool, "borrows").await?,
        rescues_by_kind_last_24h,
        open_rescues: count(pool, "SELECT COUNT(*) FROM rescue_alerts WHERE status <> 'CLOSED'").await?,
    })
}
