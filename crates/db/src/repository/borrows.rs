//! Borrow transaction operations.
//!
//! A borrow is a parent `borrows` row plus one `borrow_items` row per piece
//! of equipment.  Status changes that also move equipment in or out of
//! stock update both tables in the same transaction.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    DbError,
    models::{BorrowItemRow, BorrowRow, EquipmentRow},
};

const BORROW_COLUMNS: &str =
    "id, borrower_id, dependent_id, status, note, reviewed_by, created_at, updated_at";

/// A borrow together with the equipment it covers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BorrowWithItems {
    #[serde(flatten)]
    pub borrow: BorrowRow,
    pub items: Vec<EquipmentRow>,
}

/// Create a `PENDING` borrow request with one line item per equipment id.
///
/// Runs in a single transaction: either the parent row and every item row
/// are written, or nothing is.
pub async fn create_borrow(
    pool: &PgPool,
    borrower_id: Uuid,
    dependent_id: Option<Uuid>,
    equipment_ids: &[Uuid],
    note: Option<&str>,
) -> Result<(BorrowRow, Vec<BorrowItemRow>), DbError> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let borrow = sqlx::query_as::<_, BorrowRow>(&format!(
        r#"
        INSERT INTO borrows (id, borrower_id, dependent_id, status, note, created_at, updated_at)
        VALUES ($1, $2, $3, 'PENDING', $4, $5, $5)
        RETURNING {BORROW_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(borrower_id)
    .bind(dependent_id)
    .bind(note)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(equipment_ids.len());
    for equipment_id in equipment_ids {
        let item = sqlx::query_as::<_, BorrowItemRow>(
            r#"
            INSERT INTO borrow_items (id, borrow_id, equipment_id)
            VALUES ($1, $2, $3)
            RETURNING id, borrow_id, equipment_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(borrow.id)
        .bind(*equipment_id)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }

    tx.commit().await?;

    Ok((borrow, items))
}

/// Fetch a single borrow by primary key.
pub async fn get_borrow(pool: &PgPool, id: Uuid) -> Result<BorrowRow, DbError> {
    sqlx::query_as::<_, BorrowRow>(&format!("SELECT {BORROW_COLUMNS} FROM borrows WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Fetch a borrow and the equipment rows it covers.
pub async fn get_borrow_with_items(pool: &PgPool, id: Uuid) -> Result<BorrowWithItems, DbError> {
    let borrow = get_borrow(pool, id).await?;
    let items = list_items(pool, id).await?;
    Ok(BorrowWithItems { borrow, items })
}

/// The equipment referenced by a borrow's line items.
pub async fn list_items(pool: &PgPool, borrow_id: Uuid) -> Result<Vec<EquipmentRow>, DbError> {
    let rows = sqlx::query_as::<_, EquipmentRow>(
        r#"
        SELECT e.id, e.code, e.name, e.status, e.created_at
        FROM borrow_items bi
        JOIN equipment e ON e.id = bi.equipment_id
        WHERE bi.borrow_id = $1
        ORDER BY e.code ASC
        "#,
    )
    .bind(borrow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All borrows, optionally filtered by status, newest first.
pub async fn list_borrows(pool: &PgPool, status: Option<&str>) -> Result<Vec<BorrowRow>, DbError> {
    let rows = sqlx::query_as::<_, BorrowRow>(&format!(
        r#"
        SELECT {BORROW_COLUMNS} FROM borrows
        WHERE ($1::TEXT IS NULL OR status = $1)
        ORDER BY created_at DESC
        "#
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Borrows opened by one user, newest first.
pub async fn list_for_borrower(pool: &PgPool, borrower_id: Uuid) -> Result<Vec<BorrowRow>, DbError> {
    let rows = sqlx::query_as::<_, BorrowRow>(&format!(
        "SELECT {BORROW_COLUMNS} FROM borrows WHERE borrower_id = $1 ORDER BY created_at DESC"
    ))
    .bind(borrower_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Equipment status change applied together with a borrow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentMove<'a> {
    /// Status every item must currently have.
    pub from: &'a str,
    pub to: &'a str,
}

/// Move a borrow from `expected_status` to `new_status`.
///
/// When `equipment` is given, every piece of equipment on the borrow moves
/// from `equipment.from` to `equipment.to` in the same transaction.  Both
/// updates are guarded by the current status, so concurrent reviews of the
/// same borrow, or of two borrows sharing an item, fail with
/// [`DbError::Conflict`] and roll back instead of silently overwriting each
/// other.
pub async fn transition_borrow(
    pool: &PgPool,
    id: Uuid,
    expected_status: &str,
    new_status: &str,
    equipment: Option<EquipmentMove<'_>>,
    reviewed_by: Option<Uuid>,
) -> Result<BorrowRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, BorrowRow>(&format!(
        r#"
        UPDATE borrows
        SET status = $1, reviewed_by = COALESCE($2, reviewed_by), updated_at = $3
        WHERE id = $4 AND status = $5
        RETURNING {BORROW_COLUMNS}
        "#
    ))
    .bind(new_status)
    .bind(reviewed_by)
    .bind(Utc::now())
    .bind(id)
    .bind(expected_status)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        tx.rollback().await?;
        return Err(DbError::Conflict(format!(
            "borrow {id} is no longer {expected_status}"
        )));
    };

    if let Some(equipment) = equipment {
        let (items,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM borrow_items WHERE borrow_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let moved = sqlx::query(
            r#"
            UPDATE equipment SET status = $1
            WHERE status = $2
              AND id IN (SELECT equipment_id FROM borrow_items WHERE borrow_id = $3)
            "#,
        )
        .bind(equipment.to)
        .bind(equipment.from)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if let Err(err) = check_all_moved(items, moved, equipment) {
            tx.rollback().await?;
            return Err(err);
        }
    }

    tx.commit().await?;

    Ok(row)
}

/// Every item on the borrow must have been in `from`; anything else means
/// another review got there first.
fn check_all_moved(items: i64, moved: u64, equipment: EquipmentMove<'_>) -> Result<(), DbError> {
    if u64::try_from(items).ok() == Some(moved) {
        return Ok(());
    }
    Err(DbError::Conflict(format!(
        "only {moved} of {items} items were {} and could become {}",
        equipment.from, equipment.to
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEND: EquipmentMove<'static> = EquipmentMove { from: "AVAILABLE", to: "BORROWED" };

    #[test]
    fn every_item_moved_commits() {
        assert!(check_all_moved(3, 3, LEND).is_ok());
    }

    #[test]
    fn an_item_taken_by_another_borrow_is_a_conflict() {
        let err = check_all_moved(2, 1, LEND).unwrap_err();
        assert!(matches!(err, DbError::Conflict(msg) if msg.contains("1 of 2")));
    }

    #[test]
    fn nothing_moved_is_a_conflict() {
        assert!(matches!(check_all_moved(1, 0, LEND), Err(DbError::Conflict(_))));
    }
}
