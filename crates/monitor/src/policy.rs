//! Tuning knobs for the alert rules.
//!
//! The policy can be loaded from a TOML file; every field is optional and
//! falls back to [`AlertPolicy::default`].
//!
//! ```toml
//! near_ratio = 0.8
//! heart_rate_band = 5
//! temperature_band = 0.5
//!
//! [defaults]
//! min_bpm = 50
//! max_bpm = 120
//! max_celsius = 37.5
//! inner_radius_m = 100
//! outer_radius_m = 500
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::MonitorError;

/// Thresholds applied to a dependent who has not configured their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultThresholds {
    pub min_bpm: i32,
    pub max_bpm: i32,
    pub max_celsius: f64,
    pub inner_radius_m: i32,
    pub outer_radius_m: i32,
}

impl Default for DefaultThresholds {
    fn default() -> Self {
        Self {
            min_bpm: 50,
            max_bpm: 120,
            max_celsius: 37.5,
            inner_radius_m: 100,
            outer_radius_m: 500,
        }
    }
}

/// Alert rule configuration shared by every request handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Fraction of the outer radius past which the wearer is "approaching" it.
    pub near_ratio: f64,
    /// Heart rate must come back this many bpm inside the range to clear an alert.
    pub heart_rate_band: i32,
    /// Temperature must drop this many degrees below the limit to clear an alert.
    pub temperature_band: f64,
    pub defaults: DefaultThresholds,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            near_ratio: 0.8,
            heart_rate_band: 5,
            temperature_band: 0.5,
            defaults: DefaultThresholds::default(),
        }
    }
}

impl AlertPolicy {
    /// Parse and validate a policy from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, MonitorError> {
        let policy: AlertPolicy = toml::from_str(content)
            .map_err(|e| MonitorError::InvalidPolicy(format!("failed to parse: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Read, parse and validate a policy file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::InvalidPolicy(format!("cannot read {}: {e}", path.display()))
        })?;
        let policy = Self::from_toml(&content)?;
        info!("Loaded alert policy from {}", path.display());
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if !(self.near_ratio > 0.0 && self.near_ratio < 1.0) {
            return Err(MonitorError::InvalidPolicy(
                "near_ratio must be between 0 and 1".into(),
            ));
        }
        if self.heart_rate_band < 0 || self.temperature_band < 0.0 {
            return Err(MonitorError::InvalidPolicy("bands cannot be negative".into()));
        }
        validate_heart_rate(self.defaults.min_bpm, self.defaults.max_bpm, self.heart_rate_band)?;
        validate_radii(self.defaults.inner_radius_m, self.defaults.outer_radius_m)?;
        Ok(())
    }
}

/// A heart-rate range must be positive and wide enough for a latched alert
/// to clear: recovery needs a reading in `min + band..=max - band`.
pub fn validate_heart_rate(min_bpm: i32, max_bpm: i32, band: i32) -> Result<(), MonitorError> {
    if min_bpm <= 0 || min_bpm >= max_bpm {
        return Err(MonitorError::InvalidPolicy(format!(
            "heart-rate range {min_bpm}..{max_bpm} is empty"
        )));
    }
    if max_bpm - min_bpm < 2 * band {
        return Err(MonitorError::InvalidPolicy(format!(
            "heart-rate range {min_bpm}..{max_bpm} must be at least {} bpm wide",
            2 * band
        )));
    }
    Ok(())
}

/// The inner radius must be positive and strictly inside the outer one.
pub fn validate_radii(inner_radius_m: i32, outer_radius_m: i32) -> Result<(), MonitorError> {
    if inner_radius_m <= 0 || inner_radius_m >= outer_radius_m {
        return Err(MonitorError::InvalidPolicy(format!(
            "inner radius {inner_radius_m} m must be positive and smaller than outer radius {outer_radius_m} m"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(AlertPolicy::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let policy = AlertPolicy::from_toml("near_ratio = 0.9\n[defaults]\nmax_bpm = 140\n")
            .expect("valid policy");
        assert_eq!(policy.near_ratio, 0.9);
        assert_eq!(policy.defaults.max_bpm, 140);
        assert_eq!(policy.defaults.min_bpm, 50);
        assert_eq!(policy.heart_rate_band, 5);
    }

    #[test]
    fn near_ratio_out_of_range_is_rejected() {
        assert!(AlertPolicy::from_toml("near_ratio = 1.5").is_err());
        assert!(AlertPolicy::from_toml("near_ratio = 0.0").is_err());
    }

    #[test]
    fn inverted_radii_are_rejected() {
        let err = AlertPolicy::from_toml("[defaults]\ninner_radius_m = 600\n").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidPolicy(_)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(AlertPolicy::from_toml("near_ratio = [").is_err());
    }

    #[test]
    fn heart_rate_range_validation() {
        assert!(validate_heart_rate(50, 120, 5).is_ok());
        assert!(validate_heart_rate(120, 50, 5).is_err());
        assert!(validate_heart_rate(0, 50, 5).is_err());
    }

    #[test]
    fn heart_rate_range_must_leave_room_to_recover() {
        assert!(validate_heart_rate(100, 105, 5).is_err());
        assert!(validate_heart_rate(100, 109, 5).is_err());
        assert!(validate_heart_rate(100, 110, 5).is_ok());
    }

    #[test]
    fn narrow_default_range_is_rejected() {
        let err = AlertPolicy::from_toml("heart_rate_band = 10\n[defaults]\nmin_bpm = 100\nmax_bpm = 115\n")
            .unwrap_err();
        assert!(matches!(err, MonitorError::InvalidPolicy(_)));
    }
}
