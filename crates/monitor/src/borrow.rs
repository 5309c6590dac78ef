//! Equipment lending workflow.
//!
//! ```text
//! PENDING ──approve──▶ APPROVED ──request_return──▶ RETURN_PENDING ──confirm──▶ RETURNED
//!    │                                                   │
//!    └──reject──▶ REJECTED                               └──fail──▶ RETURN_FAILED
//! ```

use serde::{Deserialize, Serialize};

use crate::MonitorError;

/// Possible statuses for a borrow transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Pending,
    Approved,
    Rejected,
    ReturnPending,
    Returned,
    ReturnFailed,
}

/// Actions an admin or borrower can take on a borrow transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowAction {
    Approve,
    Reject,
    RequestReturn,
    ConfirmReturn,
    FailReturn,
}

impl BorrowAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Approve       => "approve",
            Self::Reject        => "reject",
            Self::RequestReturn => "request return of",
            Self::ConfirmReturn => "confirm return of",
            Self::FailReturn    => "fail return of",
        }
    }
}

impl BorrowStatus {
    pub const ALL: [BorrowStatus; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::ReturnPending,
        Self::Returned,
        Self::ReturnFailed,
    ];

    /// Apply `action`, returning the new status.
    pub fn transition(self, action: BorrowAction) -> Result<Self, MonitorError> {
        use BorrowAction::*;
        use BorrowStatus::*;

        match (self, action) {
            (Pending, Approve)             => Ok(Approved),
            (Pending, Reject)              => Ok(Rejected),
            (Approved, RequestReturn)      => Ok(ReturnPending),
            (ReturnPending, ConfirmReturn) => Ok(Returned),
            (ReturnPending, FailReturn)    => Ok(ReturnFailed),
            (from, action) => Err(MonitorError::InvalidTransition {
                entity: "borrow",
                from: from.to_string(),
                action: action.verb(),
            }),
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending       => write!(f, "PENDING"),
            Self::Approved      => write!(f, "APPROVED"),
            Self::Rejected      => write!(f, "REJECTED"),
            Self::ReturnPending => write!(f, "RETURN_PENDING"),
            Self::Returned      => write!(f, "RETURNED"),
            Self::ReturnFailed  => write!(f, "RETURN_FAILED"),
        }
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = MonitorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING"        => Ok(Self::Pending),
            "APPROVED"       => Ok(Self::Approved),
            "REJECTED"       => Ok(Self::Rejected),
            "RETURN_PENDING" => Ok(Self::ReturnPending),
            "RETURNED"       => Ok(Self::Returned),
            "RETURN_FAILED"  => Ok(Self::ReturnFailed),
            other => Err(MonitorError::UnknownStatus {
                entity: "borrow",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BorrowAction::*;
    use BorrowStatus::*;

    const ACTIONS: [BorrowAction; 5] = [Approve, Reject, RequestReturn, ConfirmReturn, FailReturn];

    #[test]
    fn happy_path_to_returned() {
        let status = Pending
            .transition(Approve)
            .and_then(|s| s.transition(RequestReturn))
            .and_then(|s| s.transition(ConfirmReturn))
            .expect("legal path");
        assert_eq!(status, Returned);
    }

    #[test]
    fn only_listed_transitions_are_legal() {
        let legal = [
            (Pending, Approve),
            (Pending, Reject),
            (Approved, RequestReturn),
            (ReturnPending, ConfirmReturn),
            (ReturnPending, FailReturn),
        ];

        for from in BorrowStatus::ALL {
            for action in ACTIONS {
                let result = from.transition(action);
                assert_eq!(
                    result.is_ok(),
                    legal.contains(&(from, action)),
                    "{from} + {action:?}"
                );
            }
        }
    }

    #[test]
    fn rejected_cannot_be_approved() {
        let err = Rejected.transition(Approve).unwrap_err();
        assert_eq!(err.to_string(), "cannot approve a borrow in status REJECTED");
    }

    #[test]
    fn status_strings_parse() {
        for status in BorrowStatus::ALL {
            assert_eq!(status.to_string().parse::<BorrowStatus>(), Ok(status));
        }
        assert!("LOST".parse::<BorrowStatus>().is_err());
    }
}
