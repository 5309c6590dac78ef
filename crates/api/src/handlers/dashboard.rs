use axum::{extract::State, Json};

use db::repository::dashboard::{self, DashboardCounts};

use super::AppState;
use crate::error::ApiError;

/// Aggregates behind the admin dashboard charts.
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardCounts>, ApiError> {
    Ok(Json(dashboard::counts(&state.pool).await?))
}
