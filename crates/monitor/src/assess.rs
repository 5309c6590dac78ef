//! One entry point per telemetry kind, combining the policy with the
//! individual rules. Handlers call these and persist whatever comes back.

use serde::Serialize;
use tracing::debug;

use crate::{
    geo::Coordinate,
    policy::AlertPolicy,
    vitals::{evaluate_heart_rate, evaluate_temperature, HeartRateRange, VitalDecision},
    zone::{evaluate, SafeZone, ZoneEvent, ZoneFlags, ZoneLevel},
};

/// Outcome of a location report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationAssessment {
    pub level: ZoneLevel,
    pub distance_m: f64,
    pub event: Option<ZoneEvent>,
    #[serde(skip)]
    pub flags: ZoneFlags,
}

/// Outcome of a vital-sign report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalAssessment {
    pub decision: VitalDecision,
    /// Latch value to persist.
    pub active: bool,
}

impl VitalAssessment {
    fn new(decision: VitalDecision, was_active: bool) -> Self {
        Self {
            decision,
            active: decision.next_latch(was_active),
        }
    }

    /// Whether this reading raised a new alert.
    pub fn alerted(&self) -> bool {
        matches!(self.decision, VitalDecision::Raise(_))
    }
}

/// Stateless evaluator bound to one [`AlertPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Assessor {
    policy: AlertPolicy,
}

impl Assessor {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn location(&self, zone: &SafeZone, flags: ZoneFlags, position: Coordinate) -> LocationAssessment {
        let (level, distance_m) = zone.classify(position, self.policy.near_ratio);
        let decision = evaluate(flags, level);
        debug!(?level, distance_m, event = ?decision.event, "location assessed");

        LocationAssessment {
            level,
            distance_m,
            event: decision.event,
            flags: decision.flags,
        }
    }

    pub fn heart_rate(&self, bpm: i32, range: HeartRateRange, active: bool) -> VitalAssessment {
        let decision = evaluate_heart_rate(bpm, range, active, self.policy.heart_rate_band);
        debug!(bpm, ?decision, "heart rate assessed");
        VitalAssessment::new(decision, active)
    }

    pub fn temperature(&self, celsius: f64, max_celsius: f64, active: bool) -> VitalAssessment {
        let decision = evaluate_temperature(celsius, max_celsius, active, self.policy.temperature_band);
        debug!(celsius, ?decision, "temperature assessed");
        VitalAssessment::new(decision, active)
    }
}
