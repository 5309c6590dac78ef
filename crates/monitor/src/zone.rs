//! Safe-zone classification and notification latching.
//!
//! A safe zone is two concentric circles around the dependent's home. Every
//! location report is classified into a [`ZoneLevel`], then run through
//! [`evaluate`] together with the persisted [`ZoneFlags`]:
//!
//! 1. Each level above `Inside` notifies once per excursion.
//! 2. Stepping back down a level re-arms the levels above it.
//! 3. Returning inside after any notification sends a single `Returned` event
//!    and clears every latch.

use serde::{Deserialize, Serialize};

use crate::geo::{distance_m, Coordinate};

/// Where a reading sits relative to the two radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneLevel {
    Inside = 0,
    OutsideInner = 1,
    NearOuter = 2,
    OutsideOuter = 3,
}

impl ZoneLevel {
    /// Numeric code stored in `location_records.zone_level` and sent to devices.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// The geofence configured for one dependent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub center: Coordinate,
    pub inner_radius_m: f64,
    pub outer_radius_m: f64,
}

impl SafeZone {
    /// Distance from the zone centre to `position`, in metres.
    pub fn distance_to(&self, position: Coordinate) -> f64 {
        distance_m(self.center, position)
    }

    /// Classify `position` against this zone.
    pub fn classify(&self, position: Coordinate, near_ratio: f64) -> (ZoneLevel, f64) {
        let distance = self.distance_to(position);
        (
            classify(distance, self.inner_radius_m, self.outer_radius_m, near_ratio),
            distance,
        )
    }
}

/// Classify a distance against the inner and outer radii.
///
/// `near_ratio` is the fraction of the outer radius past which the wearer is
/// considered to be approaching the outer boundary.
pub fn classify(distance: f64, inner_radius: f64, outer_radius: f64, near_ratio: f64) -> ZoneLevel {
    if distance <= inner_radius {
        ZoneLevel::Inside
    } else if distance > outer_radius {
        ZoneLevel::OutsideOuter
    } else if distance >= outer_radius * near_ratio {
        ZoneLevel::NearOuter
    } else {
        ZoneLevel::OutsideInner
    }
}

/// Persisted "already notified" latches for one dependent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFlags {
    pub inner: bool,
    pub near: bool,
    pub outer: bool,
}

impl ZoneFlags {
    pub fn any(&self) -> bool {
        self.inner || self.near || self.outer
    }
}

/// A zone transition worth telling the caregiver about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneEvent {
    LeftInner,
    ApproachingOuter,
    LeftOuter,
    Returned,
}

/// Outcome of [`evaluate`]: an optional event plus the latches to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneDecision {
    pub event: Option<ZoneEvent>,
    pub flags: ZoneFlags,
}

/// Advance the latch state for a new reading at `level`.
pub fn evaluate(flags: ZoneFlags, level: ZoneLevel) -> ZoneDecision {
    match level {
        ZoneLevel::Inside => ZoneDecision {
            event: flags.any().then_some(ZoneEvent::Returned),
            flags: ZoneFlags::default(),
        },
        ZoneLevel::OutsideInner => ZoneDecision {
            event: (!flags.inner).then_some(ZoneEvent::LeftInner),
            flags: ZoneFlags { inner: true, near: false, outer: false },
        },
        ZoneLevel::NearOuter => ZoneDecision {
            event: (!flags.near).then_some(ZoneEvent::ApproachingOuter),
            flags: ZoneFlags { inner: true, near: true, outer: false },
        },
        ZoneLevel::OutsideOuter => ZoneDecision {
            event: (!flags.outer).then_some(ZoneEvent::LeftOuter),
            flags: ZoneFlags { inner: true, near: true, outer: true },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEAR: f64 = 0.8;

    fn run(levels: &[ZoneLevel]) -> Vec<Option<ZoneEvent>> {
        let mut flags = ZoneFlags::default();
        levels
            .iter()
            .map(|&level| {
                let decision = evaluate(flags, level);
                flags = decision.flags;
                decision.event
            })
            .collect()
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify(0.0, 100.0, 500.0, NEAR), ZoneLevel::Inside);
        assert_eq!(classify(100.0, 100.0, 500.0, NEAR), ZoneLevel::Inside);
        assert_eq!(classify(100.1, 100.0, 500.0, NEAR), ZoneLevel::OutsideInner);
        assert_eq!(classify(399.9, 100.0, 500.0, NEAR), ZoneLevel::OutsideInner);
        assert_eq!(classify(400.0, 100.0, 500.0, NEAR), ZoneLevel::NearOuter);
        assert_eq!(classify(500.0, 100.0, 500.0, NEAR), ZoneLevel::NearOuter);
        assert_eq!(classify(500.1, 100.0, 500.0, NEAR), ZoneLevel::OutsideOuter);
    }

    #[test]
    fn full_excursion_notifies_each_level_once() {
        use ZoneLevel::*;
        let events = run(&[
            Inside,
            OutsideInner,
            OutsideInner,
            NearOuter,
            NearOuter,
            OutsideOuter,
            OutsideOuter,
            Inside,
            Inside,
        ]);
        assert_eq!(
            events,
            vec![
                None,
                Some(ZoneEvent::LeftInner),
                None,
                Some(ZoneEvent::ApproachingOuter),
                None,
                Some(ZoneEvent::LeftOuter),
                None,
                Some(ZoneEvent::Returned),
                None,
            ]
        );
    }

    #[test]
    fn jumping_straight_out_reports_only_the_outer_exit() {
        use ZoneLevel::*;
        let events = run(&[Inside, OutsideOuter, NearOuter]);
        assert_eq!(events, vec![None, Some(ZoneEvent::LeftOuter), None]);
    }

    #[test]
    fn stepping_back_rearms_the_outer_latch() {
        use ZoneLevel::*;
        let events = run(&[OutsideOuter, OutsideInner, OutsideOuter]);
        assert_eq!(
            events,
            vec![Some(ZoneEvent::LeftOuter), None, Some(ZoneEvent::LeftOuter)]
        );
    }

    #[test]
    fn returning_without_prior_notification_is_silent() {
        let decision = evaluate(ZoneFlags::default(), ZoneLevel::Inside);
        assert_eq!(decision.event, None);
        assert!(!decision.flags.any());
    }

    #[test]
    fn safe_zone_classifies_real_positions() {
        let zone = SafeZone {
            center: Coordinate::new(13.7563, 100.5018).unwrap(),
            inner_radius_m: 100.0,
            outer_radius_m: 500.0,
        };
        // ~0.001 deg latitude is ~111 m.
        let (level, distance) =
            zone.classify(Coordinate::new(13.7573, 100.5018).unwrap(), NEAR);
        assert_eq!(level, ZoneLevel::OutsideInner);
        assert!((distance - 111.2).abs() < 1.0);
    }
}
