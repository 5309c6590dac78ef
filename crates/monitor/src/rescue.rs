//! Rescue alerts opened by falls, SOS presses, zone exits and vital-sign alarms.

use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// What opened the rescue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RescueKind {
    Fall,
    Sos,
    Zone,
    HeartRate,
    Temperature,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RescueStatus {
    Pending,
    Accepted,
    Closed,
}

impl RescueStatus {
    /// A responder takes the case.
    pub fn accept(self) -> Result<Self, MonitorError> {
        match self {
            Self::Pending => Ok(Self::Accepted),
            from => Err(invalid(from, "accept")),
        }
    }

    /// The case is resolved, whether or not anyone accepted it first.
    pub fn close(self) -> Result<Self, MonitorError> {
        match self {
            Self::Pending | Self::Accepted => Ok(Self::Closed),
            from => Err(invalid(from, "close")),
        }
    }
}

fn invalid(from: RescueStatus, action: &'static str) -> MonitorError {
    MonitorError::InvalidTransition {
        entity: "rescue alert",
        from: from.to_string(),
        action,
    }
}

impl std::fmt::Display for RescueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fall        => write!(f, "FALL"),
            Self::Sos         => write!(f, "SOS"),
            Self::Zone        => write!(f, "ZONE"),
            Self::HeartRate   => write!(f, "HEART_RATE"),
            Self::Temperature => write!(f, "TEMPERATURE"),
            Self::Manual      => write!(f, "MANUAL"),
        }
    }
}

impl std::str::FromStr for RescueKind {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FALL"        => Ok(Self::Fall),
            "SOS"         => Ok(Self::Sos),
            "ZONE"        => Ok(Self::Zone),
            "HEART_RATE"  => Ok(Self::HeartRate),
            "TEMPERATURE" => Ok(Self::Temperature),
            "MANUAL"      => Ok(Self::Manual),
            other => Err(MonitorError::UnknownStatus {
                entity: "rescue kind",
                value: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for RescueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending  => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Closed   => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for RescueStatus {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING"  => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "CLOSED"   => Ok(Self::Closed),
            other => Err(MonitorError::UnknownStatus {
                entity: "rescue alert",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RescueStatus::*;

    #[test]
    fn pending_can_be_accepted_then_closed() {
        assert_eq!(Pending.accept().and_then(RescueStatus::close), Ok(Closed));
    }

    #[test]
    fn pending_can_be_closed_directly() {
        assert_eq!(Pending.close(), Ok(Closed));
    }

    #[test]
    fn accepted_cannot_be_accepted_twice() {
        assert!(Accepted.accept().is_err());
    }

    #[test]
    fn closed_is_terminal() {
        assert!(Closed.accept().is_err());
        assert!(Closed.close().is_err());
    }
}
