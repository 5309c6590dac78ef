//! `monitor` crate: alert rules and lending/rescue state machines.
//!
//! Everything here is pure: no database, no network. Handlers in the `api`
//! crate fetch the persisted state, ask this crate what to do, then persist
//! the result and send whatever notification it asked for.

pub mod account;
pub mod assess;
pub mod borrow;
pub mod equipment;
pub mod error;
pub mod fall;
pub mod geo;
pub mod policy;
pub mod rescue;
pub mod vitals;
pub mod zone;

pub use assess::{Assessor, LocationAssessment, VitalAssessment};
pub use borrow::{BorrowAction, BorrowStatus};
pub use equipment::EquipmentStatus;
pub use error::MonitorError;
pub use fall::FallCode;
pub use geo::Coordinate;
pub use policy::AlertPolicy;
pub use rescue::{RescueKind, RescueStatus};
pub use vitals::{Deviation, HeartRateRange, VitalDecision};
pub use zone::{SafeZone, ZoneEvent, ZoneFlags, ZoneLevel};

#[cfg(test)]
mod assess_tests;
