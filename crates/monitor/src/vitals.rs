//! Heart-rate and body-temperature threshold monitoring with hysteresis.
//!
//! An alert is raised once when a reading leaves the allowed range and the
//! latch is set. The latch is only cleared once a reading comes back inside
//! the range by at least `band`, so a value hovering around a threshold does
//! not flood the caregiver with notifications.

use serde::{Deserialize, Serialize};

/// Allowed heart-rate range, in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateRange {
    pub min_bpm: i32,
    pub max_bpm: i32,
}

/// Which side of the range a reading fell out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    High,
    Low,
}

/// Result of evaluating one reading against its latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalDecision {
    /// Out of range and not yet alerted: notify and set the latch.
    Raise(Deviation),
    /// Back inside the band while latched: notify recovery and clear the latch.
    Clear,
    /// Nothing to send; the latch keeps its current value.
    Hold,
}

impl VitalDecision {
    /// The latch value to persist after this decision, given the previous one.
    pub fn next_latch(self, active: bool) -> bool {
        match self {
            Self::Raise(_) => true,
            Self::Clear => false,
            Self::Hold => active,
        }
    }
}

/// Evaluate a heart-rate reading.
pub fn evaluate_heart_rate(bpm: i32, range: HeartRateRange, active: bool, band: i32) -> VitalDecision {
    if active {
        let recovered = bpm >= range.min_bpm + band && bpm <= range.max_bpm - band;
        return if recovered {
            VitalDecision::Clear
        } else {
            VitalDecision::Hold
        };
    }

    if bpm > range.max_bpm {
        VitalDecision::Raise(Deviation::High)
    } else if bpm < range.min_bpm {
        VitalDecision::Raise(Deviation::Low)
    } else {
        VitalDecision::Hold
    }
}

/// Evaluate a body-temperature reading against its upper bound.
pub fn evaluate_temperature(celsius: f64, max_celsius: f64, active: bool, band: f64) -> VitalDecision {
    if active {
        return if celsius <= max_celsius - band {
            VitalDecision::Clear
        } else {
            VitalDecision::Hold
        };
    }

    if celsius > max_celsius {
        VitalDecision::Raise(Deviation::High)
    } else {
        VitalDecision::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: HeartRateRange = HeartRateRange { min_bpm: 50, max_bpm: 120 };
    const BAND: i32 = 5;

    fn replay_heart(readings: &[i32]) -> Vec<VitalDecision> {
        let mut active = false;
        readings
            .iter()
            .map(|&bpm| {
                let d = evaluate_heart_rate(bpm, RANGE, active, BAND);
                active = d.next_latch(active);
                d
            })
            .collect()
    }

    #[test]
    fn in_range_reading_holds() {
        assert_eq!(evaluate_heart_rate(80, RANGE, false, BAND), VitalDecision::Hold);
        assert_eq!(evaluate_heart_rate(120, RANGE, false, BAND), VitalDecision::Hold);
        assert_eq!(evaluate_heart_rate(50, RANGE, false, BAND), VitalDecision::Hold);
    }

    #[test]
    fn high_and_low_raise() {
        assert_eq!(
            evaluate_heart_rate(121, RANGE, false, BAND),
            VitalDecision::Raise(Deviation::High)
        );
        assert_eq!(
            evaluate_heart_rate(49, RANGE, false, BAND),
            VitalDecision::Raise(Deviation::Low)
        );
    }

    #[test]
    fn latched_alert_is_not_repeated_and_clears_only_inside_band() {
        use VitalDecision::*;
        let decisions = replay_heart(&[130, 140, 118, 116, 115, 130]);
        assert_eq!(
            decisions,
            vec![Raise(Deviation::High), Hold, Hold, Hold, Clear, Raise(Deviation::High)]
        );
    }

    #[test]
    fn low_excursion_clears_at_min_plus_band() {
        use VitalDecision::*;
        let decisions = replay_heart(&[40, 52, 55]);
        assert_eq!(decisions, vec![Raise(Deviation::Low), Hold, Clear]);
    }

    #[test]
    fn temperature_hysteresis() {
        let max = 37.5;
        let band = 0.5;
        assert_eq!(
            evaluate_temperature(38.0, max, false, band),
            VitalDecision::Raise(Deviation::High)
        );
        assert_eq!(evaluate_temperature(37.2, max, true, band), VitalDecision::Hold);
        assert_eq!(evaluate_temperature(37.0, max, true, band), VitalDecision::Clear);
        assert_eq!(evaluate_temperature(37.5, max, false, band), VitalDecision::Hold);
    }
}
