//! Fall-sensor codes reported by the wearable.

use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// What the device saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallCode {
    /// A fall was detected but the wearer pressed "I'm OK" before the countdown ran out.
    Recovered,
    /// A fall was detected and the wearer did not respond.
    Fallen,
    /// The wearer pressed the SOS button.
    Sos,
}

impl FallCode {
    /// Whether the caregiver must be alerted and a rescue opened.
    pub fn requires_rescue(self) -> bool {
        matches!(self, Self::Fallen | Self::Sos)
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Recovered => 0,
            Self::Fallen => 1,
            Self::Sos => 2,
        }
    }
}

impl TryFrom<i32> for FallCode {
    type Error = MonitorError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Recovered),
            1 => Ok(Self::Fallen),
            2 => Ok(Self::Sos),
            other => Err(MonitorError::UnknownFallCode(other)),
        }
    }
}

impl std::fmt::Display for FallCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recovered => write!(f, "recovered"),
            Self::Fallen    => write!(f, "fallen"),
            Self::Sos       => write!(f, "sos"),
        }
    }
}
