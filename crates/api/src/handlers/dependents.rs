use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use db::{
    models::{DependentRow, FallRecordRow, HeartRateRecordRow, LocationRecordRow, TemperatureRecordRow},
    repository::{dependents as dependent_repo, telemetry as telemetry_repo},
};

use super::AppState;
use crate::{
    error::{ApiError, OrNotFound},
    extract::{ApiPath, ApiQuery},
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

impl HistoryQuery {
    fn limit(&self) -> Result<i64, ApiError> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n),
            Some(_) => Err(ApiError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            ))),
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DependentRow>>, ApiError> {
    Ok(Json(dependent_repo::list_dependents(&state.pool).await?))
}

/// Recent track points, newest first, for the live map.
pub async fn locations(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<LocationRecordRow>>, ApiError> {
    let limit = query.limit()?;
    dependent_repo::get_dependent(&state.pool, id)
        .await
        .or_not_found("dependent")?;

    let rows = telemetry_repo::recent_locations(&state.pool, id, limit).await?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct VitalsHistory {
    pub heart_rates: Vec<HeartRateRecordRow>,
    pub temperatures: Vec<TemperatureRecordRow>,
    pub falls: Vec<FallRecordRow>,
}

pub async fn vitals(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<VitalsHistory>, ApiError> {
    let limit = query.limit()?;
    dependent_repo::get_dependent(&state.pool, id)
        .await
        .or_not_found("dependent")?;

    Ok(Json(VitalsHistory {
        heart_rates: telemetry_repo::recent_heart_rates(&state.pool, id, limit).await?,
        temperatures: telemetry_repo::recent_temperatures(&state.pool, id, limit).await?,
        falls: telemetry_repo::recent_falls(&state.pool, id, limit).await?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(HistoryQuery::default().limit().unwrap(), DEFAULT_LIMIT);
        assert_eq!(HistoryQuery { limit: Some(10) }.limit().unwrap(), 10);
        assert!(HistoryQuery { limit: Some(0) }.limit().is_err());
        assert!(HistoryQuery { limit: Some(MAX_LIMIT + 1) }.limit().is_err());
    }
}
