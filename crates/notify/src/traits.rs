//! The `Notifier` trait: the contract every outbound messenger must fulfil.

use async_trait::async_trait;

use crate::{Message, NotifyError};

/// Sends chat messages to caregivers.
///
/// Implemented by [`LineClient`](crate::line::LineClient) in production and
/// by [`MockNotifier`](crate::mock::MockNotifier) in tests.  Handlers hold it
/// as `Arc<dyn Notifier>`.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push `messages` to the chat user `to` without a prior user action.
    async fn push(&self, to: &str, messages: Vec<Message>) -> Result<(), NotifyError>;

    /// Answer a webhook event using its one-shot `reply_token`.
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), NotifyError>;
}
