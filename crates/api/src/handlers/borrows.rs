//! Admin review of equipment borrow requests.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use db::{
    models::BorrowRow,
    repository::{
        borrows as borrow_repo,
        borrows::{BorrowWithItems, EquipmentMove},
        users as user_repo,
    },
};
use monitor::{account::UserRole, BorrowAction, BorrowStatus, EquipmentStatus};
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
) -> Result<Json<Vec<BorrowRow>>, ApiError> {
    let status = status_filter::<BorrowStatus>(filter.status.as_deref())?;
    let rows = borrow_repo::list_borrows(&state.pool, status.as_deref()).await?;
    Ok(Json(rows))
}

pub async fn get(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BorrowWithItems>, ApiError> {
    let row = borrow_repo::get_borrow_with_items(&state.pool, id)
        .await
        .or_not_found("borrow")?;
    Ok(Json(row))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    /// Admin user recorded as the reviewer.
    pub reviewer: Option<Uuid>,
}

pub async fn approve(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<BorrowRow>, ApiError> {
    review(&state, id, BorrowAction::Approve, query.reviewer).await.map(Json)
}

pub async fn reject(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<BorrowRow>, ApiError> {
    review(&state, id, BorrowAction::Reject, query.reviewer).await.map(Json)
}

pub async fn confirm_return(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<BorrowRow>, ApiError> {
    review(&state, id, BorrowAction::ConfirmReturn, query.reviewer).await.map(Json)
}

pub async fn fail_return(
    ApiPath(id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<BorrowRow>, ApiError> {
    review(&state, id, BorrowAction::FailReturn, query.reviewer).await.map(Json)
}

/// Equipment status change implied by entering `status`, as `(from, to)`.
///
/// A failed return leaves the equipment marked as borrowed until it turns up.
fn equipment_move_for(status: BorrowStatus) -> Option<(EquipmentStatus, EquipmentStatus)> {
    match status {
        BorrowStatus::Approved => Some((EquipmentStatus::Available, EquipmentStatus::Borrowed)),
        BorrowStatus::Returned => Some((EquipmentStatus::Borrowed, EquipmentStatus::Available)),
        BorrowStatus::Pending
        | BorrowStatus::Rejected
        | BorrowStatus::ReturnPending
        | BorrowStatus::ReturnFailed => None,
    }
}

#[instrument(skip(state))]
async fn review(
    state: &AppState,
    id: Uuid,
    action: BorrowAction,
    reviewer: Option<Uuid>,
) -> Result<BorrowRow, ApiError> {
    let borrow = borrow_repo::get_borrow(&state.pool, id)
        .await
        .or_not_found("borrow")?;
    let current: BorrowStatus = borrow.status.parse()?;
    let next = current.transition(action)?;

    // Early, readable rejection; the transaction re-checks every item.
    let equipment_move = equipment_move_for(next);
    if let Some((from, _)) = equipment_move {
        for item in borrow_repo::list_items(&state.pool, id).await? {
            let status: EquipmentStatus = item.status.parse()?;
            if status != from {
                return Err(ApiError::Conflict(format!(
                    "{} ({}) is {}",
                    item.name, item.code, status
                )));
            }
        }
    }

    if let Some(reviewer) = reviewer {
        let user = user_repo::get_user(&state.pool, reviewer)
            .await
            .or_not_found("reviewer")?;
        if user.role.parse::<UserRole>()? != UserRole::Admin {
            return Err(ApiError::Validation("reviewer must be an admin account".into()));
        }
    }

    let equipment_move = equipment_move.map(|(from, to)| (from.to_string(), to.to_string()));
    let equipment = equipment_move
        .as_ref()
        .map(|(from, to)| EquipmentMove { from, to });

    let row = borrow_repo::transition_borrow(
        &state.pool,
        id,
        &current.to_string(),
        &next.to_string(),
        equipment,
        reviewer,
    )
    .await?;

    info!(from = %current, to = %next, "borrow reviewed");

    if let Some(message) = format::borrow_update(next) {
        let borrower = user_repo::get_user(&state.pool, row.borrower_id).await?;
        if let Some(line_user_id) = borrower.line_user_id {
            alerts::push(state, line_user_id, vec![message]);
        }
    }

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_lends_and_return_releases() {
        assert_eq!(
            equipment_move_for(BorrowStatus::Approved),
            Some((EquipmentStatus::Available, EquipmentStatus::Borrowed))
        );
        assert_eq!(
            equipment_move_for(BorrowStatus::Returned),
            Some((EquipmentStatus::Borrowed, EquipmentStatus::Available))
        );
    }

    #[test]
    fn other_states_leave_equipment_alone() {
        for status in [
            BorrowStatus::Pending,
            BorrowStatus::Rejected,
            BorrowStatus::ReturnPending,
            BorrowStatus::ReturnFailed,
        ] {
            assert_eq!(equipment_move_for(status), None, "{status}");
        }
    }
}
