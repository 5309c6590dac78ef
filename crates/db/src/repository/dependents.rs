//! Caregiver and dependent profile operations.

use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    DbError,
    models::{CaregiverRow, DependentContactRow, DependentRow, SafeZoneRow, UserRow},
    repository::safe_zones,
};

const CAREGIVER_COLUMNS: &str = "id, user_id, first_name, last_name, phone, address, created_at";
const DEPENDENT_COLUMNS: &str =
    "id, caregiver_id, first_name, last_name, birth_date, gender, phone, address, created_at";

/// Caregiver fields collected by the registration form.
#[derive(Debug, Clone)]
pub struct NewCaregiver {
    pub line_user_id: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

/// Dependent fields collected by the registration and "add dependent" forms.
#[derive(Debug, Clone)]
pub struct NewDependent {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Initial monitoring thresholds written alongside a new dependent.
#[derive(Debug, Clone, Copy)]
pub struct InitialThresholds {
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub max_celsius: f64,
}

/// Safe zone optionally set up during registration.
#[derive(Debug, Clone, Copy)]
pub struct InitialSafeZone {
    pub latitude: f64,
    pub longitude: f64,
    pub inner_radius_m: i32,
    pub outer_radius_m: i32,
}

/// Everything created by a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: UserRow,
    pub caregiver: CaregiverRow,
    pub dependent: DependentRow,
    pub safe_zone: Option<SafeZoneRow>,
}

/// Register a caregiver account together with their first dependent.
///
/// Creates the `users`, `caregivers`, `dependents` and `vital_thresholds`
/// rows, plus the `safe_zones` row when one is given, in a single
/// transaction.  A LINE user id that is already registered fails with
/// [`DbError::Conflict`].
pub async fn register(
    pool: &PgPool,
    caregiver: &NewCaregiver,
    dependent: &NewDependent,
    thresholds: InitialThresholds,
    safe_zone: Option<InitialSafeZone>,
) -> Result<Registration, DbError> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, line_user_id, display_name, role, status, created_at)
        VALUES ($1, $2, $3, 'CAREGIVER', 'ACTIVE', $4)
        RETURNING id, line_user_id, display_name, role, status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&caregiver.line_user_id)
    .bind(&caregiver.display_name)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let caregiver_row = sqlx::query_as::<_, CaregiverRow>(&format!(
        r#"
        INSERT INTO caregivers (id, user_id, first_name, last_name, phone, address, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CAREGIVER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&caregiver.first_name)
    .bind(&caregiver.last_name)
    .bind(&caregiver.phone)
    .bind(&caregiver.address)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let dependent_row = insert_dependent(&mut tx, caregiver_row.id, dependent, thresholds).await?;

    let zone_row = match safe_zone {
        Some(zone) => Some(
            safe_zones::upsert_safe_zone(
                &mut *tx,
                dependent_row.id,
                zone.latitude,
                zone.longitude,
                zone.inner_radius_m,
                zone.outer_radius_m,
            )
            .await?,
        ),
        None => None,
    };

    tx.commit().await?;

    Ok(Registration {
        user,
        caregiver: caregiver_row,
        dependent: dependent_row,
        safe_zone: zone_row,
    })
}

/// Add another dependent to an existing caregiver.
pub async fn add_dependent(
    pool: &PgPool,
    caregiver_id: Uuid,
    dependent: &NewDependent,
    thresholds: InitialThresholds,
) -> Result<DependentRow, DbError> {
    let mut tx = pool.begin().await?;
    let row = insert_dependent(&mut tx, caregiver_id, dependent, thresholds).await?;
    tx.commit().await?;
    Ok(row)
}

async fn insert_dependent(
    tx: &mut Transaction<'_, Postgres>,
    caregiver_id: Uuid,
    dependent: &NewDependent,
    thresholds: InitialThresholds,
) -> Result<DependentRow, DbError> {
    let now = Utc::now();

    let row = sqlx::query_as::<_, DependentRow>(&format!(
        r#"
        INSERT INTO dependents
            (id, caregiver_id, first_name, last_name, birth_date, gender, phone, address, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {DEPENDENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(caregiver_id)
    .bind(&dependent.first_name)
    .bind(&dependent.last_name)
    .bind(dependent.birth_date)
    .bind(&dependent.gender)
    .bind(&dependent.phone)
    .bind(&dependent.address)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO vital_thresholds (dependent_id, min_bpm, max_bpm, max_celsius, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(row.id)
    .bind(thresholds.min_bpm)
    .bind(thresholds.max_bpm)
    .bind(thresholds.max_celsius)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(row)
}

/// Fetch the caregiver profile attached to a user account.
pub async fn find_caregiver_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<CaregiverRow>, DbError> {
    let row = sqlx::query_as::<_, CaregiverRow>(&format!(
        "SELECT {CAREGIVER_COLUMNS} FROM caregivers WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch a single dependent by primary key.
pub async fn get_dependent(pool: &PgPool, id: Uuid) -> Result<DependentRow, DbError> {
    sqlx::query_as::<_, DependentRow>(&format!(
        "SELECT {DEPENDENT_COLUMNS} FROM dependents WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// All dependents looked after by one caregiver, oldest first.
pub async fn list_for_caregiver(pool: &PgPool, caregiver_id: Uuid) -> Result<Vec<DependentRow>, DbError> {
    let rows = sqlx::query_as::<_, DependentRow>(&format!(
        "SELECT {DEPENDENT_COLUMNS} FROM dependents WHERE caregiver_id = $1 ORDER BY created_at ASC"
    ))
    .bind(caregiver_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every dependent, newest first.
pub async fn list_dependents(pool: &PgPool) -> Result<Vec<DependentRow>, DbError> {
    let rows = sqlx::query_as::<_, DependentRow>(&format!(
        "SELECT {DEPENDENT_COLUMNS} FROM dependents ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Resolve who to notify about a dependent.
pub async fn get_contact(pool: &PgPool, dependent_id: Uuid) -> Result<DependentContactRow, DbError> {
    sqlx::query_as::<_, DependentContactRow>(
        r#"
        SELECT d.id AS dependent_id, d.first_name, d.last_name,
               c.id AS caregiver_id, c.phone AS caregiver_phone,
               u.line_user_id
        FROM dependents d
        JOIN caregivers c ON c.id = d.caregiver_id
        JOIN users u ON u.id = c.user_id
        WHERE d.id = $1
        "#,
    )
    .bind(dependent_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
