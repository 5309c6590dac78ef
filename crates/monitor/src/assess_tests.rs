//! End-to-end tests for the assessor.
//!
//! These replay realistic telemetry sequences the way the device endpoints
//! do: load the latch, assess, store the latch back, count notifications.

use crate::{
    Assessor, AlertPolicy, Coordinate, Deviation, HeartRateRange, SafeZone, VitalDecision,
    ZoneEvent, ZoneFlags, ZoneLevel,
};

/// Home in central Bangkok with a 100 m / 500 m zone.
fn home_zone() -> SafeZone {
    SafeZone {
        center: Coordinate::new(13.7563, 100.5018).unwrap(),
        inner_radius_m: 100.0,
        outer_radius_m: 500.0,
    }
}

/// A point `metres` north of the home centre.
fn north_of_home(metres: f64) -> Coordinate {
    // One degree of latitude is ~111 195 m with the mean earth radius.
    Coordinate::new(13.7563 + metres / 111_195.0, 100.5018).unwrap()
}

// ============================================================
// Location
// ============================================================

#[test]
fn walk_out_and_back_produces_four_notifications() {
    let assessor = Assessor::default();
    let zone = home_zone();
    let mut flags = ZoneFlags::default();
    let mut events = Vec::new();

    for metres in [10.0, 50.0, 150.0, 200.0, 420.0, 450.0, 600.0, 700.0, 300.0, 20.0, 5.0] {
        let result = assessor.location(&zone, flags, north_of_home(metres));
        flags = result.flags;
        events.extend(result.event);
    }

    assert_eq!(
        events,
        vec![
            ZoneEvent::LeftInner,
            ZoneEvent::ApproachingOuter,
            ZoneEvent::LeftOuter,
            ZoneEvent::Returned,
        ]
    );
    assert_eq!(flags, ZoneFlags::default());
}

#[test]
fn reported_distance_matches_position() {
    let assessor = Assessor::default();
    let result = assessor.location(&home_zone(), ZoneFlags::default(), north_of_home(250.0));
    assert_eq!(result.level, ZoneLevel::OutsideInner);
    assert!((result.distance_m - 250.0).abs() < 1.0, "got {}", result.distance_m);
}

#[test]
fn near_ratio_comes_from_policy() {
    let assessor = Assessor::new(AlertPolicy {
        near_ratio: 0.5,
        ..AlertPolicy::default()
    });
    let result = assessor.location(&home_zone(), ZoneFlags::default(), north_of_home(300.0));
    assert_eq!(result.level, ZoneLevel::NearOuter);
    assert_eq!(result.event, Some(ZoneEvent::ApproachingOuter));
}

// ============================================================
// Vitals
// ============================================================

#[test]
fn heart_rate_stream_alerts_once_per_excursion() {
    let assessor = Assessor::default();
    let range = HeartRateRange { min_bpm: 50, max_bpm: 120 };
    let mut active = false;
    let mut raised = 0;
    let mut cleared = 0;

    for bpm in [80, 125, 130, 128, 119, 110, 90, 45, 44, 60] {
        let a = assessor.heart_rate(bpm, range, active);
        active = a.active;
        match a.decision {
            VitalDecision::Raise(_) => raised += 1,
            VitalDecision::Clear => cleared += 1,
            VitalDecision::Hold => {}
        }
    }

    assert_eq!(raised, 2);
    assert_eq!(cleared, 2);
    assert!(!active);
}

#[test]
fn narrowest_accepted_range_still_recovers() {
    let assessor = Assessor::default();
    let band = assessor.policy().heart_rate_band;
    let range = HeartRateRange { min_bpm: 100, max_bpm: 100 + 2 * band };
    assert!(crate::policy::validate_heart_rate(range.min_bpm, range.max_bpm, band).is_ok());

    let mut active = false;
    let mut decisions = Vec::new();
    for bpm in [112, 103, 105, 130, 60] {
        let a = assessor.heart_rate(bpm, range, active);
        active = a.active;
        decisions.push(a.decision);
    }

    assert_eq!(
        decisions,
        vec![
            VitalDecision::Raise(Deviation::High),
            VitalDecision::Hold,
            VitalDecision::Clear,
            VitalDecision::Raise(Deviation::High),
            VitalDecision::Hold,
        ]
    );
}

#[test]
fn temperature_latch_survives_readings_just_under_the_limit() {
    let assessor = Assessor::default();
    let first = assessor.temperature(38.2, 37.5, false);
    assert!(first.alerted());
    assert_eq!(first.decision, VitalDecision::Raise(Deviation::High));

    let second = assessor.temperature(37.3, 37.5, first.active);
    assert!(!second.alerted());
    assert!(second.active);

    let third = assessor.temperature(36.9, 37.5, second.active);
    assert_eq!(third.decision, VitalDecision::Clear);
    assert!(!third.active);
}
