//! User account operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, models::UserRow};

const USER_COLUMNS: &str = "id, line_user_id, display_name, role, status, created_at";

/// Insert a new account in `ACTIVE` status.
pub async fn create_user(
    pool: &PgPool,
    line_user_id: Option<&str>,
    display_name: &str,
    role: &str,
) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, line_user_id, display_name, role, status, created_at)
        VALUES ($1, $2, $3, $4, 'ACTIVE', $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(line_user_id)
    .bind(display_name)
    .bind(role)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetch a single user by primary key.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Look up the account linked to a LINE user id.
///
/// Returns `None` for LINE users who have not registered yet.
pub async fn find_by_line_id(pool: &PgPool, line_user_id: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE line_user_id = $1"
    ))
    .bind(line_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Return all users ordered by creation time (newest first).
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, DbError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Set the account status (`ACTIVE` / `INACTIVE`).
pub async fn update_user_status(pool: &PgPool, id: Uuid, status: &str) -> Result<UserRow, DbError> {
    sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET status = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
