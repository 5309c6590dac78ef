//! Retry wrapper around [`Notifier::push`].
//!
//! Retryable failures are re-tried with exponential back-off up to
//! `max_retries`; a fatal failure is returned immediately.

use std::time::Duration;

use tracing::warn;

use crate::{Message, Notifier, NotifyError};

/// Tuning knobs for [`send_with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of times a retryable failure will be retried.
    pub max_retries: u32,
    /// Base delay for exponential back-off between retries.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Push `messages` to `to`, retrying transient failures.
pub async fn send_with_retry(
    notifier: &dyn Notifier,
    to: &str,
    messages: Vec<Message>,
    config: &RetryConfig,
) -> Result<(), NotifyError> {
    let mut attempts = 0u32;

    loop {
        match notifier.push(to, messages.clone()).await {
            Ok(()) => return Ok(()),

            Err(NotifyError::Fatal(msg)) => return Err(NotifyError::Fatal(msg)),

            Err(NotifyError::Retryable(msg)) => {
                attempts += 1;
                if attempts > config.max_retries {
                    return Err(NotifyError::Retryable(format!(
                        "gave up after {attempts} attempts: {msg}"
                    )));
                }

                let delay = config.base_delay * 2u32.pow(attempts.saturating_sub(1));

                warn!(
                    "push to '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                    to, attempts, config.max_retries, delay, msg
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNotifier;

    fn config() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_time_without_retry() {
        let notifier = MockNotifier::succeeding();
        send_with_retry(&notifier, "U1", vec![Message::text("hi")], &config())
            .await
            .expect("should send");
        assert_eq!(notifier.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_notifier_recovers_within_budget() {
        let notifier = MockNotifier::flaky(2);
        send_with_retry(&notifier, "U1", vec![Message::text("hi")], &config())
            .await
            .expect("third attempt should succeed");
        assert_eq!(notifier.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_failure_gives_up_after_budget() {
        let notifier = MockNotifier::failing_retryable("503");
        let err = send_with_retry(&notifier, "U1", vec![Message::text("hi")], &config())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Retryable(_)));
        // One initial attempt plus three retries.
        assert_eq!(notifier.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_failure_is_not_retried() {
        let notifier = MockNotifier::failing_fatal("bad token");
        let err = send_with_retry(&notifier, "U1", vec![Message::text("hi")], &config())
            .await
            .unwrap_err();
        assert_eq!(err, NotifyError::Fatal("bad token".into()));
        assert_eq!(notifier.call_count(), 1);
    }
}
