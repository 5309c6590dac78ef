//! LINE Messaging API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{message::MAX_MESSAGES_PER_REQUEST, Message, Notifier, NotifyError};

pub const DEFAULT_API_BASE: &str = "https://api.line.me";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: &'a [Message],
}

/// Sends messages through the LINE Messaging API using a channel access token.
#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl LineClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_base(DEFAULT_API_BASE, access_token)
    }

    /// Point the client at another API host (a local stub, for instance).
    pub fn with_base(api_base: impl Into<String>, access_token: impl Into<String>) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Fatal(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), NotifyError> {
        let url = format!("{}{}", self.api_base, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| NotifyError::Retryable(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!("{path} -> {status}");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::from_status(status.as_u16(), &body))
    }
}

#[async_trait]
impl Notifier for LineClient {
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn push(&self, to: &str, messages: Vec<Message>) -> Result<(), NotifyError> {
        for chunk in messages.chunks(MAX_MESSAGES_PER_REQUEST) {
            self.post("/v2/bot/message/push", &PushRequest { to, messages: chunk })
                .await?;
        }
        Ok(())
    }

    /// A reply token can be used once, so anything past the per-request
    /// limit is dropped.
    #[instrument(skip(self, reply_token, messages), fields(count = messages.len()))]
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<(), NotifyError> {
        let count = messages.len().min(MAX_MESSAGES_PER_REQUEST);
        if count < messages.len() {
            warn!(dropped = messages.len() - count, "reply exceeds the per-request limit");
        }
        self.post(
            "/v2/bot/message/reply",
            &ReplyRequest {
                reply_token,
                messages: &messages[..count],
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_body_shape() {
        let messages = [Message::text("hi")];
        let body = serde_json::to_value(PushRequest { to: "U1", messages: &messages }).unwrap();
        assert_eq!(body, json!({ "to": "U1", "messages": [{ "type": "text", "text": "hi" }] }));
    }

    #[test]
    fn reply_body_uses_camel_case_token() {
        let messages = [Message::text("hi")];
        let body = serde_json::to_value(ReplyRequest { reply_token: "r1", messages: &messages }).unwrap();
        assert_eq!(body["replyToken"], "r1");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base() {
        let client = LineClient::with_base("http://localhost:9000/", "token").unwrap();
        assert_eq!(client.api_base, "http://localhost:9000");
    }

    #[tokio::test]
    async fn unreachable_host_is_retryable() {
        // Port 9 (discard) on localhost is closed on test machines.
        let client = LineClient::with_base("http://127.0.0.1:9", "token").unwrap();
        let err = client.push("U1", vec![Message::text("hi")]).await.unwrap_err();
        assert!(matches!(err, NotifyError::Retryable(_)));
    }
}
