//! `notify` crate: the `Notifier` trait and the LINE chat integration.
//!
//! Every outbound messenger implements [`Notifier`]; the `api` crate holds
//! one as `Arc<dyn Notifier>`.  The inbound side lives here too: webhook
//! signature checks, the webhook event model, and chat command parsing.

pub mod command;
pub mod error;
pub mod format;
pub mod line;
pub mod message;
pub mod mock;
pub mod retry;
pub mod signature;
pub mod traits;
pub mod webhook;

pub use error::NotifyError;
pub use line::LineClient;
pub use message::Message;
pub use retry::{send_with_retry, RetryConfig};
pub use traits::Notifier;
