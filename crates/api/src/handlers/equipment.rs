use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use db::{models::EquipmentRow, repository::equipment as equipment_repo};
use monitor::EquipmentStatus;

use super::AppState;
use crate::{
    error::{ApiError, OrNotFound},
    extract::{ApiJson, ApiPath, ApiQuery},
};

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// Parse an optional `?status=` filter into its canonical spelling.
pub(crate) fn status_filter<S>(raw: Option<&str>) -> Result<Option<String>, ApiError>
where
    S: std::str::FromStr<Err = monitor::MonitorError> + std::fmt::Display,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(Some(s.to_uppercase().parse::<S>()?.to_string())),
        None => Ok(None),
    }
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<StatusFilter>,
) -> Result<Json<Vec<EquipmentRow>>, ApiError> {
    let status = status_filter::<EquipmentStatus>(filter.status.as_deref())?;
    let rows = equipment_repo::list_equipment(&state.pool, status.as_deref()).await?;
    Ok(Json(rows))
}

pub async fn get(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<EquipmentRow>, ApiError> {
    let row = equipment_repo::get_equipment(&state.pool, id)
        .await
        .or_not_found("equipment")?;
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct CreateEquipmentDto {
    pub code: String,
    pub name: String,
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEquipmentDto>,
) -> Result<(StatusCode, Json<EquipmentRow>), ApiError> {
    let code = payload.code.trim();
    let name = payload.name.trim();
    if code.is_empty() || name.is_empty() {
        return Err(ApiError::Validation("code and name are required".into()));
    }

    let row = equipment_repo::create_equipment(&state.pool, code, name).await?;
    info!(equipment_id = %row.id, code, "equipment added");
    Ok((StatusCode::CREATED, Json(row)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEquipmentDto {
    pub name: Option<String>,
    pub status: Option<String>,
}

/// Rename equipment or move it in and out of maintenance.
///
/// `BORROWED` is owned by the borrow workflow and cannot be set or cleared
/// here.
pub async fn update(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateEquipmentDto>,
) -> Result<Json<EquipmentRow>, ApiError> {
    let current = equipment_repo::get_equipment(&state.pool, id)
        .await
        .or_not_found("equipment")?;
    let from: EquipmentStatus = current.status.parse()?;

    let to = match payload.status.as_deref() {
        Some(s) => s.trim().to_uppercase().parse()?,
        None => from,
    };
    if from != to && (from == EquipmentStatus::Borrowed || to == EquipmentStatus::Borrowed) {
        return Err(ApiError::Conflict(
            "borrowed status is managed through borrow requests".into(),
        ));
    }
    from.can_become(to)?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::Validation("name cannot be empty".into())),
        Some(n) => n.to_owned(),
        None => current.name,
    };

    let row = equipment_repo::update_equipment(&state.pool, id, &name, &to.to_string())
        .await
        .or_not_found("equipment")?;

    info!(equipment_id = %id, %from, %to, "equipment updated");
    Ok(Json(row))
}

pub async fn delete(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let current = equipment_repo::get_equipment(&state.pool, id)
        .await
        .or_not_found("equipment")?;
    if current.status.parse::<EquipmentStatus>()? == EquipmentStatus::Borrowed {
        return Err(ApiError::Conflict("equipment is currently borrowed".into()));
    }

    equipment_repo::delete_equipment(&state.pool, id)
        .await
        .or_not_found("equipment")?;

    info!(equipment_id = %id, "equipment deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor::BorrowStatus;

    #[test]
    fn status_filter_normalises_case() {
        assert_eq!(
            status_filter::<EquipmentStatus>(Some("available")).unwrap(),
            Some("AVAILABLE".to_owned())
        );
        assert_eq!(
            status_filter::<BorrowStatus>(Some(" return_pending ")).unwrap(),
            Some("RETURN_PENDING".to_owned())
        );
    }

    #[test]
    fn empty_filter_means_no_filter() {
        assert_eq!(status_filter::<EquipmentStatus>(None).unwrap(), None);
        assert_eq!(status_filter::<EquipmentStatus>(Some("  ")).unwrap(), None);
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let err = status_filter::<EquipmentStatus>(Some("lost")).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
