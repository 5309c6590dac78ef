//! Endpoints behind the LIFF forms opened from the chat.
//!
//! LIFF pages identify the caller by the LINE user id the LIFF SDK hands
//! them; every write checks that the dependent or borrow belongs to that
//! caregiver.

use std::collections::HashSet;

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use db::{
    models::{BorrowRow, CaregiverRow, DependentRow, SafeZoneRow, UserRow, VitalThresholdsRow},
    repository::{
        borrows as borrow_repo,
        dependents::{
            self as dependent_repo, InitialSafeZone, InitialThresholds, NewCaregiver, NewDependent,
        },
        equipment as equipment_repo, safe_zones as zone_repo, thresholds as threshold_repo,
        users as user_repo,
    },
};
use monitor::{
    account::UserStatus,
    policy::{validate_heart_rate, validate_radii},
    BorrowAction, BorrowStatus, Coordinate, EquipmentStatus,
};
use notify::Message;

use super::AppState;
use crate::{
    alerts,
    error::{ApiError, OrNotFound},
    extract::{ApiJson, ApiPath},
};

const GENDERS: [&str; 3] = ["male", "female", "other"];

/// The registered caregiver behind a LINE account.
pub(crate) struct Caller {
    pub user: UserRow,
    pub caregiver: CaregiverRow,
}

/// Resolve a LINE user id to an active caregiver.
pub(crate) async fn caller(state: &AppState, line_user_id: &str) -> Result<Caller, ApiError> {
    let user = user_repo::find_by_line_id(&state.pool, line_user_id)
        .await?
        .ok_or(ApiError::NotFound("caregiver"))?;

    if user.status.parse::<UserStatus>()? != UserStatus::Active {
        return Err(ApiError::Forbidden("account is inactive".into()));
    }

    let caregiver = dependent_repo::find_caregiver_by_user(&state.pool, user.id)
        .await?
        .ok_or(ApiError::NotFound("caregiver"))?;

    Ok(Caller { user, caregiver })
}

/// Fetch a dependent and check that `caller` looks after them.
async fn owned_dependent(state: &AppState, caller: &Caller, dependent_id: Uuid) -> Result<DependentRow, ApiError> {
    let dependent = dependent_repo::get_dependent(&state.pool, dependent_id)
        .await
        .or_not_found("dependent")?;

    if dependent.caregiver_id != caller.caregiver.id {
        return Err(ApiError::Forbidden("dependent belongs to another caregiver".into()));
    }
    Ok(dependent)
}

fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

fn phone(field: &str, value: &str) -> Result<String, ApiError> {
    let value = required(field, value)?;
    let digits = value.chars().filter(char::is_ascii_digit).count();
    let allowed = value.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' '));
    if !allowed || !(9..=15).contains(&digits) {
        return Err(ApiError::Validation(format!("{field} is not a valid phone number")));
    }
    Ok(value)
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CaregiverForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct DependentForm {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl DependentForm {
    fn validate(&self) -> Result<NewDependent, ApiError> {
        let gender = self.gender.trim().to_lowercase();
        if !GENDERS.contains(&gender.as_str()) {
            return Err(ApiError::Validation(format!(
                "gender must be one of {}",
                GENDERS.join(", ")
            )));
        }
        if let Some(birth_date) = self.birth_date {
            if birth_date > chrono::Utc::now().date_naive() {
                return Err(ApiError::Validation("birth_date is in the future".into()));
            }
        }
        let phone = match optional(self.phone.as_deref()) {
            Some(p) => Some(phone("dependent phone", &p)?),
            None => None,
        };

        Ok(NewDependent {
            first_name: required("dependent first_name", &self.first_name)?,
            last_name: required("dependent last_name", &self.last_name)?,
            birth_date: self.birth_date,
            gender,
            phone,
            address: optional(self.address.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub line_user_id: String,
    pub display_name: String,
    pub caregiver: CaregiverForm,
    pub dependent: DependentForm,
    pub safe_zone: Option<SafeZoneForm>,
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub success: bool,
    pub user_id: Uuid,
    pub caregiver_id: Uuid,
    pub dependent_id: Uuid,
}

fn initial_thresholds(state: &AppState) -> InitialThresholds {
    let defaults = &state.assessor.policy().defaults;
    InitialThresholds {
        min_bpm: defaults.min_bpm,
        max_bpm: defaults.max_bpm,
        max_celsius: defaults.max_celsius,
    }
}

#[instrument(skip(state, form), fields(line_user_id = %form.line_user_id))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<(StatusCode, Json<Registered>), ApiError> {
    let caregiver = NewCaregiver {
        line_user_id: required("line_user_id", &form.line_user_id)?,
        display_name: required("display_name", &form.display_name)?,
        first_name: required("first_name", &form.caregiver.first_name)?,
        last_name: required("last_name", &form.caregiver.last_name)?,
        phone: phone("phone", &form.caregiver.phone)?,
        address: required("address", &form.caregiver.address)?,
    };
    let dependent = form.dependent.validate()?;
    if let Some(zone) = &form.safe_zone {
        zone.validate()?;
    }

    if user_repo::find_by_line_id(&state.pool, &caregiver.line_user_id).await?.is_some() {
        return Err(ApiError::Conflict("this LINE account is already registered".into()));
    }

    let safe_zone = form.safe_zone.as_ref().map(|zone| InitialSafeZone {
        latitude: zone.latitude,
        longitude: zone.longitude,
        inner_radius_m: zone.inner_radius_m,
        outer_radius_m: zone.outer_radius_m,
    });
    let registration = dependent_repo::register(
        &state.pool,
        &caregiver,
        &dependent,
        initial_thresholds(&state),
        safe_zone,
    )
    .await?;

    info!(
        caregiver_id = %registration.caregiver.id,
        dependent_id = %registration.dependent.id,
        "caregiver registered"
    );

    let contact = dependent_repo::get_contact(&state.pool, registration.dependent.id).await?;
    alerts::dispatch(
        &state,
        &contact,
        vec![
            Message::text(format!(
                "Registration complete. You are now monitoring {}.",
                alerts::display_name(&contact)
            )),
            notify::format::help_menu(),
        ],
    );

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            success: true,
            user_id: registration.user.id,
            caregiver_id: registration.caregiver.id,
            dependent_id: registration.dependent.id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AddDependentForm {
    pub line_user_id: String,
    pub dependent: DependentForm,
}

pub async fn add_dependent(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<AddDependentForm>,
) -> Result<(StatusCode, Json<DependentRow>), ApiError> {
    let dependent = form.dependent.validate()?;
    let caller = caller(&state, &form.line_user_id).await?;

    let row = dependent_repo::add_dependent(
        &state.pool,
        caller.caregiver.id,
        &dependent,
        initial_thresholds(&state),
    )
    .await?;

    info!(caregiver_id = %caller.caregiver.id, dependent_id = %row.id, "dependent added");
    Ok((StatusCode::CREATED, Json(row)))
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DependentProfile {
    #[serde(flatten)]
    pub dependent: DependentRow,
    pub safe_zone: Option<SafeZoneRow>,
    pub thresholds: Option<VitalThresholdsRow>,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: UserRow,
    pub caregiver: CaregiverRow,
    pub dependents: Vec<DependentProfile>,
}

pub async fn profile(
    ApiPath(line_user_id): ApiPath<String>,
    State(state): State<AppState>,
) -> Result<Json<Profile>, ApiError> {
    let Caller { user, caregiver } = caller(&state, &line_user_id).await?;

    let mut dependents = Vec::new();
    for dependent in dependent_repo::list_for_caregiver(&state.pool, caregiver.id).await? {
        let safe_zone = zone_repo::get_safe_zone(&state.pool, dependent.id).await?;
        let thresholds = threshold_repo::get_thresholds(&state.pool, dependent.id).await?;
        dependents.push(DependentProfile {
            dependent,
            safe_zone,
            thresholds,
        });
    }

    Ok(Json(Profile {
        user,
        caregiver,
        dependents,
    }))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SafeZoneForm {
    #[serde(default)]
    pub line_user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub inner_radius_m: i32,
    pub outer_radius_m: i32,
}

impl SafeZoneForm {
    fn validate(&self) -> Result<(), ApiError> {
        Coordinate::new(self.latitude, self.longitude)?;
        validate_radii(self.inner_radius_m, self.outer_radius_m)?;
        Ok(())
    }
}

#[instrument(skip(state, form))]
pub async fn set_safe_zone(
    ApiPath(dependent_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<SafeZoneForm>,
) -> Result<Json<SafeZoneRow>, ApiError> {
    form.validate()?;
    let caller = caller(&state, &form.line_user_id).await?;
    owned_dependent(&state, &caller, dependent_id).await?;

    let row = zone_repo::upsert_safe_zone(
        &state.pool,
        dependent_id,
        form.latitude,
        form.longitude,
        form.inner_radius_m,
        form.outer_radius_m,
    )
    .await?;

    info!(inner = row.inner_radius_m, outer = row.outer_radius_m, "safe zone updated");
    Ok(Json(row))
}

#[derive(Debug, Deserialize)]
pub struct ThresholdsForm {
    pub line_user_id: String,
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub max_celsius: f64,
}

#[instrument(skip(state, form))]
pub async fn set_thresholds(
    ApiPath(dependent_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ThresholdsForm>,
) -> Result<Json<VitalThresholdsRow>, ApiError> {
    validate_heart_rate(form.min_bpm, form.max_bpm, state.assessor.policy().heart_rate_band)?;
    if !form.max_celsius.is_finite() || !(35.0..=42.0).contains(&form.max_celsius) {
        return Err(ApiError::Validation("max_celsius must be between 35 and 42".into()));
    }

    let caller = caller(&state, &form.line_user_id).await?;
    owned_dependent(&state, &caller, dependent_id).await?;

    let row = threshold_repo::upsert_thresholds(
        &state.pool,
        dependent_id,
        form.min_bpm,
        form.max_bpm,
        form.max_celsius,
    )
    .await?;

    info!(min_bpm = row.min_bpm, max_bpm = row.max_bpm, max_celsius = row.max_celsius, "thresholds updated");
    Ok(Json(row))
}

// ---------------------------------------------------------------------------
// Equipment borrowing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BorrowForm {
    pub line_user_id: String,
    pub dependent_id: Option<Uuid>,
    pub equipment_ids: Vec<Uuid>,
    pub note: Option<String>,
}

#[instrument(skip(state, form), fields(items = form.equipment_ids.len()))]
pub async fn create_borrow(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<BorrowForm>,
) -> Result<(StatusCode, Json<borrow_repo::BorrowWithItems>), ApiError> {
    if form.equipment_ids.is_empty() {
        return Err(ApiError::Validation("select at least one piece of equipment".into()));
    }
    let unique: HashSet<_> = form.equipment_ids.iter().collect();
    if unique.len() != form.equipment_ids.len() {
        return Err(ApiError::Validation("equipment ids must be unique".into()));
    }

    let caller = caller(&state, &form.line_user_id).await?;
    if let Some(dependent_id) = form.dependent_id {
        owned_dependent(&state, &caller, dependent_id).await?;
    }

    let mut items = Vec::with_capacity(form.equipment_ids.len());
    for id in &form.equipment_ids {
        let equipment = equipment_repo::get_equipment(&state.pool, *id)
            .await
            .or_not_found("equipment")?;
        if equipment.status.parse::<EquipmentStatus>()? != EquipmentStatus::Available {
            return Err(ApiError::Conflict(format!(
                "{} ({}) is not available",
                equipment.name, equipment.code
            )));
        }
        items.push(equipment);
    }

    let note = optional(form.note.as_deref());
    let (borrow, _) = borrow_repo::create_borrow(
        &state.pool,
        caller.user.id,
        form.dependent_id,
        &form.equipment_ids,
        note.as_deref(),
    )
    .await?;

    info!(borrow_id = %borrow.id, "borrow requested");
    Ok((
        StatusCode::CREATED,
        Json(borrow_repo::BorrowWithItems { borrow, items }),
    ))
}

pub async fn list_borrows(
    ApiPath(line_user_id): ApiPath<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<BorrowRow>>, ApiError> {
    let caller = caller(&state, &line_user_id).await?;
    let rows = borrow_repo::list_for_borrower(&state.pool, caller.user.id).await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct ReturnForm {
    pub line_user_id: String,
}

#[instrument(skip(state, form))]
pub async fn request_return(
    ApiPath(borrow_id): ApiPath<Uuid>,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ReturnForm>,
) -> Result<Json<BorrowRow>, ApiError> {
    let caller = caller(&state, &form.line_user_id).await?;

    let borrow = borrow_repo::get_borrow(&state.pool, borrow_id)
        .await
        .or_not_found("borrow")?;
    if borrow.borrower_id != caller.user.id {
        return Err(ApiError::Forbidden("borrow belongs to another user".into()));
    }

    let current: BorrowStatus = borrow.status.parse()?;
    let next = current.transition(BorrowAction::RequestReturn)?;

    let row = borrow_repo::transition_borrow(
        &state.pool,
        borrow_id,
        &current.to_string(),
        &next.to_string(),
        None,
        None,
    )
    .await?;

    info!(status = %next, "return requested");
    Ok(Json(row))
}
