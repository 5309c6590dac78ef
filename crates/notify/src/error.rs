//! Notification-level error type.

use thiserror::Error;

/// Errors returned by a [`Notifier`](crate::Notifier).
///
/// [`send_with_retry`](crate::retry::send_with_retry) uses the variant to
/// decide retry behaviour:
/// - `Retryable`: transport failure, rate limit or server error; try again with back-off.
/// - `Fatal`: the request itself is wrong (bad token, unknown recipient); give up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Transient failure; the send should be re-tried.
    #[error("retryable notification error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal notification error: {0}")]
    Fatal(String),
}

impl NotifyError {
    /// Classify a non-success HTTP status returned by the messaging API.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = format!("HTTP {status}: {body}");
        if status == 429 || status >= 500 {
            Self::Retryable(detail)
        } else {
            Self::Fatal(detail)
        }
    }
}
