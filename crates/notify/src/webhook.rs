//! Webhook payload sent by the LINE platform.
//!
//! Only the fields the dispatcher reads are modelled; unknown event and
//! message types deserialize to an `Other` variant instead of failing the
//! whole batch.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Postback {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text {
        text: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: Source,
        message: EventMessage,
    },
    Postback {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: Source,
        postback: Postback,
    },
    Follow {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: Source,
    },
    Unfollow {
        source: Source,
    },
    #[serde(other)]
    Other,
}

impl Event {
    /// The LINE user who triggered the event, when it came from a 1:1 chat.
    pub fn user_id(&self) -> Option<&str> {
        let source = match self {
            Self::Message { source, .. }
            | Self::Postback { source, .. }
            | Self::Follow { source, .. }
            | Self::Unfollow { source } => source,
            Self::Other => return None,
        };
        source.user_id.as_deref()
    }

    pub fn reply_token(&self) -> Option<&str> {
        match self {
            Self::Message { reply_token, .. }
            | Self::Postback { reply_token, .. }
            | Self::Follow { reply_token, .. } => Some(reply_token),
            Self::Unfollow { .. } | Self::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_mixed_batch() {
        let body = r#"{
            "destination": "Uxxxxxxxx",
            "events": [
                {
                    "type": "message",
                    "replyToken": "r1",
                    "timestamp": 1462629479859,
                    "mode": "active",
                    "source": { "type": "user", "userId": "U1" },
                    "message": { "id": "1", "type": "text", "text": "location" }
                },
                {
                    "type": "postback",
                    "replyToken": "r2",
                    "source": { "type": "user", "userId": "U2" },
                    "postback": { "data": "action=accept_rescue&id=abc" }
                },
                {
                    "type": "follow",
                    "replyToken": "r3",
                    "source": { "type": "user", "userId": "U3" }
                },
                {
                    "type": "beacon",
                    "replyToken": "r4",
                    "source": { "type": "user", "userId": "U4" }
                },
                {
                    "type": "message",
                    "replyToken": "r5",
                    "source": { "type": "user", "userId": "U5" },
                    "message": { "id": "2", "type": "sticker", "packageId": "1" }
                }
            ]
        }"#;

        let payload: WebhookPayload = serde_json::from_str(body).expect("valid payload");
        assert_eq!(payload.events.len(), 5);

        assert!(matches!(
            &payload.events[0],
            Event::Message { message: EventMessage::Text { text }, .. } if text == "location"
        ));
        assert_eq!(payload.events[0].user_id(), Some("U1"));
        assert_eq!(payload.events[1].reply_token(), Some("r2"));
        assert!(matches!(payload.events[2], Event::Follow { .. }));
        assert_eq!(payload.events[3], Event::Other);
        assert!(matches!(
            payload.events[4],
            Event::Message { message: EventMessage::Other, .. }
        ));
    }

    #[test]
    fn verification_ping_has_no_events() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"destination":"U0","events":[]}"#).unwrap();
        assert!(payload.events.is_empty());
    }
}
