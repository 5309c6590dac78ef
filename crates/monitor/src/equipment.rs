//! Equipment availability.

use serde::{Deserialize, Serialize};

use crate::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Available,
    Borrowed,
    Maintenance,
}

impl EquipmentStatus {
    pub const ALL: [EquipmentStatus; 3] = [Self::Available, Self::Borrowed, Self::Maintenance];

    /// Check that moving to `to` is allowed. Setting the current status again is a no-op.
    ///
    /// Borrowed equipment must come back before it can go to maintenance.
    pub fn can_become(self, to: Self) -> Result<(), MonitorError> {
        use EquipmentStatus::*;

        match (self, to) {
            (a, b) if a == b => Ok(()),
            (Available, Borrowed)
            | (Borrowed, Available)
            | (Available, Maintenance)
            | (Maintenance, Available) => Ok(()),
            (from, _) => Err(MonitorError::InvalidTransition {
                entity: "equipment",
                from: from.to_string(),
                action: match to {
                    Available => "release",
                    Borrowed => "lend",
                    Maintenance => "send to maintenance",
                },
            }),
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available   => write!(f, "AVAILABLE"),
            Self::Borrowed    => write!(f, "BORROWED"),
            Self::Maintenance => write!(f, "MAINTENANCE"),
        }
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE"   => Ok(Self::Available),
            "BORROWED"    => Ok(Self::Borrowed),
            "MAINTENANCE" => Ok(Self::Maintenance),
            other => Err(MonitorError::UnknownStatus {
                entity: "equipment",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EquipmentStatus::*;

    #[test]
    fn lending_cycle_is_allowed() {
        assert!(Available.can_become(Borrowed).is_ok());
        assert!(Borrowed.can_become(Available).is_ok());
    }

    #[test]
    fn borrowed_equipment_cannot_go_to_maintenance() {
        assert!(Borrowed.can_become(Maintenance).is_err());
        assert!(Maintenance.can_become(Borrowed).is_err());
    }

    #[test]
    fn same_status_is_a_no_op() {
        for s in EquipmentStatus::ALL {
            assert!(s.can_become(s).is_ok());
        }
    }
}
