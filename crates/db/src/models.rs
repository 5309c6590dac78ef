//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models: they carry no domain behaviour.
//! Status columns are `TEXT`; their enums live in the `monitor` crate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// users / caregivers / dependents
// ---------------------------------------------------------------------------

/// An account: either an administrator or a caregiver signed in through LINE.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub line_user_id: Option<String>,
    pub display_name: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaregiverRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// The monitored elderly person.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DependentRow {
    pub id: Uuid,
    pub caregiver_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A dependent joined with whoever should be notified about them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DependentContactRow {
    pub dependent_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub caregiver_id: Uuid,
    pub caregiver_phone: String,
    pub line_user_id: Option<String>,
}

// ---------------------------------------------------------------------------
// equipment / borrows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EquipmentRow {
    pub id: Uuid,
    /// Asset code printed on the device; unique.
    pub code: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BorrowRow {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub dependent_id: Option<Uuid>,
    pub status: String,
    pub note: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line item of a borrow transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BorrowItemRow {
    pub id: Uuid,
    pub borrow_id: Uuid,
    pub equipment_id: Uuid,
}

// ---------------------------------------------------------------------------
// safe_zones / vital_thresholds
// ---------------------------------------------------------------------------

/// Geofence settings plus the zone notification latches.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SafeZoneRow {
    pub dependent_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub inner_radius_m: i32,
    pub outer_radius_m: i32,
    pub inner_alerted: bool,
    pub near_alerted: bool,
    pub outer_alerted: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VitalThresholdsRow {
    pub dependent_id: Uuid,
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub max_celsius: f64,
    pub heart_alert_active: bool,
    pub temperature_alert_active: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationRecordRow {
    pub id: Uuid,
    pub dependent_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub battery: i32,
    pub distance_m: f64,
    pub zone_level: i32,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeartRateRecordRow {
    pub id: Uuid,
    pub dependent_id: Uuid,
    pub bpm: i32,
    pub alerted: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemperatureRecordRow {
    pub id: Uuid,
    pub dependent_id: Uuid,
    pub celsius: f64,
    pub alerted: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FallRecordRow {
    pub id: Uuid,
    pub dependent_id: Uuid,
    pub code: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// rescue_alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RescueAlertRow {
    pub id: Uuid,
    pub dependent_id: Uuid,
    pub kind: String,
    pub status: String,
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// LINE user id (or admin user id) of whoever accepted or closed the case.
    pub handled_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// dashboard
// ---------------------------------------------------------------------------

/// A `(label, count)` pair from a `GROUP BY` query.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusCountRow {
    pub status: String,
    pub count: i64,
}
