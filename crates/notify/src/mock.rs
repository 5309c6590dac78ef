//! `MockNotifier`: a test double for `Notifier`.
//!
//! Useful in unit and integration tests where talking to the real LINE API
//! is either unavailable or irrelevant.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{Message, Notifier, NotifyError};

/// Behaviour injected into `MockNotifier` at construction time.
pub enum MockBehaviour {
    /// Accept every message.
    Succeed,
    /// Fail the first `n` calls with a `Retryable` error, then succeed.
    FlakyFor(usize),
    /// Always fail with a `Retryable` error.
    FailRetryable(String),
    /// Always fail with a `Fatal` error.
    FailFatal(String),
}

/// How a message reached the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Push { to: String },
    Reply { reply_token: String },
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessages {
    pub delivery: Delivery,
    pub messages: Vec<Message>,
}

/// A mock notifier that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNotifier {
    /// What the notifier will do when called.
    pub behaviour: MockBehaviour,
    /// All calls seen by this notifier (in call order), including failed ones.
    pub calls: Arc<Mutex<Vec<SentMessages>>>,
}

impl MockNotifier {
    /// Create a mock that accepts everything.
    pub fn succeeding() -> Self {
        Self::with(MockBehaviour::Succeed)
    }

    /// Create a mock that fails `n` times with a `Retryable` error before succeeding.
    pub fn flaky(n: usize) -> Self {
        Self::with(MockBehaviour::FlakyFor(n))
    }

    /// Create a mock that always fails with a `Retryable` error.
    pub fn failing_retryable(msg: impl Into<String>) -> Self {
        Self::with(MockBehaviour::FailRetryable(msg.into()))
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(msg: impl Into<String>) -> Self {
        Self::with(MockBehaviour::FailFatal(msg.into()))
    }

    fn with(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this notifier has been called.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every push recipient, in call order.
    pub fn pushed_to(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match &c.delivery {
                Delivery::Push { to } => Some(to.clone()),
                Delivery::Reply { .. } => None,
            })
            .collect()
    }

    fn record(&self, delivery: Delivery, messages: Vec<Message>) -> Result<(), NotifyError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(SentMessages { delivery, messages });
        let attempt = calls.len();

        match &self.behaviour {
            MockBehaviour::Succeed => Ok(()),
            MockBehaviour::FlakyFor(n) if attempt <= *n => {
                Err(NotifyError::Retryable(format!("flaky attempt {attempt}")))
            }
            MockBehaviour::FlakyFor(_) => Ok(()),
            MockBehaviour::FailRetryable(msg) => Err(NotifyError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg)     => Err(NotifyError::Fatal(msg.clone())),
        }
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn push(&self, to: &str, messages: Vec<Message>) -> Result<(), NotifyError> {
        self.record(Delivery::Push { to: to.to_owned() }, messages)
    }

    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), NotifyError> {
        self.record(
            Delivery::Reply {
                reply_token: reply_token.to_owned(),
            },
            messages,
        )
    }
}
