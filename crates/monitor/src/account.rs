//! User roles and account status.

use serde::{Deserialize, Serialize};

use crate::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Caregiver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin     => write!(f, "ADMIN"),
            Self::Caregiver => write!(f, "CAREGIVER"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN"     => Ok(Self::Admin),
            "CAREGIVER" => Ok(Self::Caregiver),
            other => Err(MonitorError::UnknownStatus { entity: "user role", value: other.to_owned() }),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active   => write!(f, "ACTIVE"),
            Self::Inactive => write!(f, "INACTIVE"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE"   => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(MonitorError::UnknownStatus { entity: "user", value: other.to_owned() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_their_column_value() {
        for role in [UserRole::Admin, UserRole::Caregiver] {
            assert_eq!(role.to_string().parse::<UserRole>(), Ok(role));
        }
        assert_eq!(UserRole::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "ROOT".parse::<UserRole>().unwrap_err();
        assert!(matches!(err, MonitorError::UnknownStatus { entity: "user role", .. }));
    }
}
