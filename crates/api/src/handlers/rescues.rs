use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use db::{
    models::RescueAlertRow,
    repository::{dependents as dependent_repo, rescues as rescue_repo},
};
use monitor::RescueStatus;
use notify::format;

use super::{equipment::StatusFilter, AppState};
use crate::{
    alerts,
    error::{ApiError, OrNotFound},
    extract::{ApiPath, ApiQuery},
    handlers::equipment::status_filter,
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> Result<Json<Vec<RescueAlertRow>>, ApiError> {
    let status = status_filter::<RescueStatus>(filter.status.as_deref())?;
    let rows = rescue_repo::list_rescues(&state.pool, status.as_deref()).await?;
    Ok(Json(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseQuery {
    pub handled_by: Option<String>,
}

/// Close a rescue from the back office and tell the caregiver.
pub async fn close(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CloseQuery>,
) -> Result<Json<RescueAlertRow>, ApiError> {
    let rescue = rescue_repo::get_rescue(&state.pool, id)
        .await
        .or_not_found("rescue alert")?;
    let current: RescueStatus = rescue.status.parse()?;
    let next = current.close()?;

    let handled_by = query
        .handled_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("admin");

    let row = rescue_repo::transition_rescue(
        &state.pool,
        id,
        &current.to_string(),
        &next.to_string(),
        handled_by,
    )
    .await?;

    info!(rescue_id = %id, handled_by, "rescue closed by admin");

    let contact = dependent_repo::get_contact(&state.pool, row.dependent_id).await?;
    alerts::dispatch(&state, &contact, vec![format::rescue_closed(&row.message)]);

    Ok(Json(row))
}
