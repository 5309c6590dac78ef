//! Telemetry endpoints called by the wearable.
//!
//! Each report is stored first, then run through the alert rules. A rescue
//! alert is opened before the latch state is written back, so a failed
//! insert never leaves a latch set with nothing behind it.  The response carries the current settings
//! so the device can sync its own thresholds.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use db::{
    models::{SafeZoneRow, VitalThresholdsRow},
    DbError,
    repository::{
        dependents as dependent_repo, safe_zones as zone_repo, telemetry as telemetry_repo,
        thresholds as threshold_repo,
    },
};
use monitor::{Coordinate, FallCode, HeartRateRange, RescueKind, SafeZone, VitalDecision, ZoneEvent, ZoneFlags};
use notify::format;

use super::AppState;
use crate::{
    alerts::{self, display_name},
    error::{ApiError, OrNotFound},
    extract::{ApiJson, ApiPath},
};

// ---------------------------------------------------------------------------
// Shared settings payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SafeZoneSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub inner_radius_m: i32,
    pub outer_radius_m: i32,
}

impl From<&SafeZoneRow> for SafeZoneSettings {
    fn from(row: &SafeZoneRow) -> Self {
        Self {
            latitude: row.latitude,
            longitude: row.longitude,
            inner_radius_m: row.inner_radius_m,
            outer_radius_m: row.outer_radius_m,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThresholdSettings {
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub max_celsius: f64,
}

impl From<&VitalThresholdsRow> for ThresholdSettings {
    fn from(row: &VitalThresholdsRow) -> Self {
        Self {
            min_bpm: row.min_bpm,
            max_bpm: row.max_bpm,
            max_celsius: row.max_celsius,
        }
    }
}

fn safe_zone(row: &SafeZoneRow) -> Result<SafeZone, ApiError> {
    Ok(SafeZone {
        center: Coordinate::new(row.latitude, row.longitude)?,
        inner_radius_m: f64::from(row.inner_radius_m),
        outer_radius_m: f64::from(row.outer_radius_m),
    })
}

/// Thresholds for a dependent, creating the policy defaults on first use.
pub(crate) async fn load_thresholds(state: &AppState, dependent_id: Uuid) -> Result<VitalThresholdsRow, ApiError> {
    if let Some(row) = threshold_repo::get_thresholds(&state.pool, dependent_id).await? {
        return Ok(row);
    }

    let defaults = &state.assessor.policy().defaults;
    let row = threshold_repo::upsert_thresholds(
        &state.pool,
        dependent_id,
        defaults.min_bpm,
        defaults.max_bpm,
        defaults.max_celsius,
    )
    .await?;
    Ok(row)
}

// ---------------------------------------------------------------------------
// POST /api/device/location
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LocationReport {
    pub dependent_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub battery: i32,
}

#[derive(Debug, Serialize)]
pub struct LocationAck {
    pub success: bool,
    pub zone_level: i32,
    pub distance_m: f64,
    pub safe_zone: Option<SafeZoneSettings>,
}

#[instrument(skip(state, report), fields(dependent_id = %report.dependent_id))]
pub async fn location(
    State(state): State<AppState>,
    ApiJson(report): ApiJson<LocationReport>,
) -> Result<Json<LocationAck>, ApiError> {
    let position = Coordinate::new(report.latitude, report.longitude)?;
    if !(0..=100).contains(&report.battery) {
        return Err(ApiError::Validation("battery must be between 0 and 100".into()));
    }

    let contact = dependent_repo::get_contact(&state.pool, report.dependent_id)
        .await
        .or_not_found("dependent")?;
    let zone_row = zone_repo::get_safe_zone(&state.pool, report.dependent_id).await?;

    let Some(zone_row) = zone_row else {
        // No geofence yet: keep the track, nothing to evaluate.
        telemetry_repo::insert_location(
            &state.pool,
            report.dependent_id,
            position.latitude,
            position.longitude,
            report.battery,
            0.0,
            0,
        )
        .await?;
        return Ok(Json(LocationAck {
            success: true,
            zone_level: 0,
            distance_m: 0.0,
            safe_zone: None,
        }));
    };

    let flags = ZoneFlags {
        inner: zone_row.inner_alerted,
        near: zone_row.near_alerted,
        outer: zone_row.outer_alerted,
    };
    let assessment = state.assessor.location(&safe_zone(&zone_row)?, flags, position);

    telemetry_repo::insert_location(
        &state.pool,
        report.dependent_id,
        position.latitude,
        position.longitude,
        report.battery,
        assessment.distance_m,
        assessment.level.code(),
    )
    .await?;

    let rescue = (assessment.event == Some(ZoneEvent::LeftOuter))
        .then_some((RescueKind::Zone, Some(position)));
    let rescue_id = alerts::open_then_latch(&state, &contact, rescue, async {
        if assessment.flags != flags {
            zone_repo::update_zone_flags(
                &state.pool,
                report.dependent_id,
                assessment.flags.inner,
                assessment.flags.near,
                assessment.flags.outer,
            )
            .await?;
        }
        Ok::<_, DbError>(())
    })
    .await?;

    if let Some(event) = assessment.event {
        info!(?event, distance_m = assessment.distance_m, "zone transition");

        let messages = format::zone_event(
            &display_name(&contact),
            event,
            assessment.distance_m,
            position,
            rescue_id,
        );
        alerts::dispatch(&state, &contact, messages);
    }

    Ok(Json(LocationAck {
        success: true,
        zone_level: assessment.level.code(),
        distance_m: assessment.distance_m,
        safe_zone: Some(SafeZoneSettings::from(&zone_row)),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/device/heart-rate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HeartRateReport {
    pub dependent_id: Uuid,
    pub bpm: i32,
}

#[derive(Debug, Serialize)]
pub struct HeartRateAck {
    pub success: bool,
    pub alerted: bool,
    pub thresholds: ThresholdSettings,
}

#[instrument(skip(state, report), fields(dependent_id = %report.dependent_id))]
pub async fn heart_rate(
    State(state): State<AppState>,
    ApiJson(report): ApiJson<HeartRateReport>,
) -> Result<Json<HeartRateAck>, ApiError> {
    if !(1..=300).contains(&report.bpm) {
        return Err(ApiError::Validation("bpm must be between 1 and 300".into()));
    }

    let contact = dependent_repo::get_contact(&state.pool, report.dependent_id)
        .await
        .or_not_found("dependent")?;
    let thresholds = load_thresholds(&state, report.dependent_id).await?;
    let range = HeartRateRange {
        min_bpm: thresholds.min_bpm,
        max_bpm: thresholds.max_bpm,
    };

    let assessment = state
        .assessor
        .heart_rate(report.bpm, range, thresholds.heart_alert_active);

    telemetry_repo::insert_heart_rate(&state.pool, report.dependent_id, report.bpm, assessment.alerted())
        .await?;

    let rescue = matches!(assessment.decision, VitalDecision::Raise(_))
        .then_some((RescueKind::HeartRate, None));
    let rescue_id = alerts::open_then_latch(&state, &contact, rescue, async {
        if assessment.active != thresholds.heart_alert_active {
            threshold_repo::set_heart_alert(&state.pool, report.dependent_id, assessment.active).await?;
        }
        Ok::<_, DbError>(())
    })
    .await?;

    if let Some(messages) = format::heart_rate(
        &display_name(&contact),
        report.bpm,
        assessment.decision,
        range,
        rescue_id,
    ) {
        alerts::dispatch(&state, &contact, messages);
    }

    Ok(Json(HeartRateAck {
        success: true,
        alerted: assessment.alerted(),
        thresholds: ThresholdSettings::from(&thresholds),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/device/temperature
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TemperatureReport {
    pub dependent_id: Uuid,
    pub celsius: f64,
}

#[derive(Debug, Serialize)]
pub struct TemperatureAck {
    pub success: bool,
    pub alerted: bool,
    pub max_celsius: f64,
}

#[instrument(skip(state, report), fields(dependent_id = %report.dependent_id))]
pub async fn temperature(
    State(state): State<AppState>,
    ApiJson(report): ApiJson<TemperatureReport>,
) -> Result<Json<TemperatureAck>, ApiError> {
    if !report.celsius.is_finite() || !(20.0..=50.0).contains(&report.celsius) {
        return Err(ApiError::Validation("celsius must be between 20 and 50".into()));
    }

    let contact = dependent_repo::get_contact(&state.pool, report.dependent_id)
        .await
        .or_not_found("dependent")?;
    let thresholds = load_thresholds(&state, report.dependent_id).await?;

    let assessment = state.assessor.temperature(
        report.celsius,
        thresholds.max_celsius,
        thresholds.temperature_alert_active,
    );

    telemetry_repo::insert_temperature(
        &state.pool,
        report.dependent_id,
        report.celsius,
        assessment.alerted(),
    )
    .await?;

    let rescue = matches!(assessment.decision, VitalDecision::Raise(_))
        .then_some((RescueKind::Temperature, None));
    let rescue_id = alerts::open_then_latch(&state, &contact, rescue, async {
        if assessment.active != thresholds.temperature_alert_active {
            threshold_repo::set_temperature_alert(&state.pool, report.dependent_id, assessment.active)
                .await?;
        }
        Ok::<_, DbError>(())
    })
    .await?;

    if let Some(messages) = format::temperature(
        &display_name(&contact),
        report.celsius,
        assessment.decision,
        thresholds.max_celsius,
        rescue_id,
    ) {
        alerts::dispatch(&state, &contact, messages);
    }

    Ok(Json(TemperatureAck {
        success: true,
        alerted: assessment.alerted(),
        max_celsius: thresholds.max_celsius,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/device/fall
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct FallReport {
    pub dependent_id: Uuid,
    pub code: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FallAck {
    pub success: bool,
    pub alert_id: Option<Uuid>,
}

#[instrument(skip(state, report), fields(dependent_id = %report.dependent_id, code = report.code))]
pub async fn fall(
    State(state): State<AppState>,
    ApiJson(report): ApiJson<FallReport>,
) -> Result<Json<FallAck>, ApiError> {
    let code = FallCode::try_from(report.code)?;
    let reported = match (report.latitude, report.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
        (None, None) => None,
        _ => {
            return Err(ApiError::Validation(
                "latitude and longitude must be sent together".into(),
            ))
        }
    };

    let contact = dependent_repo::get_contact(&state.pool, report.dependent_id)
        .await
        .or_not_found("dependent")?;

    telemetry_repo::insert_fall(
        &state.pool,
        report.dependent_id,
        code.code(),
        reported.map(|p| p.latitude),
        reported.map(|p| p.longitude),
    )
    .await?;

    // Fall back to the last known position so the caregiver still gets a map.
    let position = match reported {
        Some(p) => Some(p),
        None => telemetry_repo::latest_location(&state.pool, report.dependent_id)
            .await?
            .and_then(|row| Coordinate::new(row.latitude, row.longitude).ok()),
    };

    let alert_id = if code.requires_rescue() {
        let kind = match code {
            FallCode::Sos => RescueKind::Sos,
            _ => RescueKind::Fall,
        };
        Some(alerts::open_rescue(&state, &contact, kind, position).await?.id)
    } else {
        None
    };

    let messages = format::fall(&display_name(&contact), code, position, alert_id);
    alerts::dispatch(&state, &contact, messages);

    Ok(Json(FallAck {
        success: true,
        alert_id,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/device/:dependent_id/config
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DeviceConfig {
    pub success: bool,
    pub safe_zone: Option<SafeZoneSettings>,
    pub thresholds: ThresholdSettings,
}

pub async fn config(
    ApiPath(dependent_id): ApiPath<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<DeviceConfig>, ApiError> {
    dependent_repo::get_dependent(&state.pool, dependent_id)
        .await
        .or_not_found("dependent")?;

    let zone = zone_repo::get_safe_zone(&state.pool, dependent_id).await?;
    let thresholds = load_thresholds(&state, dependent_id).await?;

    Ok(Json(DeviceConfig {
        success: true,
        safe_zone: zone.as_ref().map(SafeZoneSettings::from),
        thresholds: ThresholdSettings::from(&thresholds),
    }))
}
