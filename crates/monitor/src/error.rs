//! Monitor-level error types.

use thiserror::Error;

/// Errors produced by the alert rules and the lending/rescue state machines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    // ------ State machine errors ------

    /// The requested action is not allowed from the current status.
    #[error("cannot {action} a {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    /// A status string read from storage or a request did not parse.
    #[error("unknown {entity} status: '{value}'")]
    UnknownStatus {
        entity: &'static str,
        value: String,
    },

    // ------ Telemetry errors ------

    /// The device reported a fall code we do not understand.
    #[error("unknown fall code: {0}")]
    UnknownFallCode(i32),

    /// Latitude/longitude out of range or not finite.
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    // ------ Configuration errors ------

    /// The alert policy failed validation.
    #[error("invalid alert policy: {0}")]
    InvalidPolicy(String),
}
