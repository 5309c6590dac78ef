use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use db::{models::UserRow, repository::users as user_repo};
use monitor::account::UserStatus;

use super::AppState;
use crate::{
    error::{ApiError, OrNotFound},
    extract::{ApiJson, ApiPath},
};

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<UserRow>>, ApiError> {
    Ok(Json(user_repo::list_users(&state.pool).await?))
}

pub async fn get(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<UserRow>, ApiError> {
    let user = user_repo::get_user(&state.pool, id).await.or_not_found("user")?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct StatusDto {
    pub status: String,
}

/// Activate or deactivate an account. Inactive caregivers cannot use the
/// LIFF forms or chat commands.
pub async fn update_status(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<StatusDto>,
) -> Result<Json<UserRow>, ApiError> {
    let status: UserStatus = payload.status.trim().to_uppercase().parse()?;

    let user = user_repo::update_user_status(&state.pool, id, &status.to_string())
        .await
        .or_not_found("user")?;

    info!(user_id = %id, %status, "user status changed");
    Ok(Json(user))
}
