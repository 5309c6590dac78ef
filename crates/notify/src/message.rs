//! LINE message objects.
//!
//! Only the subset the service sends is modelled: text, location, and a
//! buttons template whose actions are postbacks or links.

use serde::{Deserialize, Serialize};

/// Maximum number of message objects in one push or reply request.
pub const MAX_MESSAGES_PER_REQUEST: usize = 5;

const MAX_TEXT_CHARS: usize = 5000;
const MAX_BUTTONS_TEXT_CHARS: usize = 160;
const MAX_LABEL_CHARS: usize = 20;
const MAX_ACTIONS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
    },
    Location {
        title: String,
        address: String,
        latitude: f64,
        longitude: f64,
    },
    Template {
        #[serde(rename = "altText")]
        alt_text: String,
        template: Template,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Template {
    Buttons { text: String, actions: Vec<Action> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
    Postback {
        label: String,
        data: String,
        #[serde(rename = "displayText", skip_serializing_if = "Option::is_none")]
        display_text: Option<String>,
    },
    Uri {
        label: String,
        uri: String,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: truncate(text.into(), MAX_TEXT_CHARS),
        }
    }

    pub fn location(title: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self::Location {
            title: truncate(title.into(), 100),
            address: format!("{latitude:.6}, {longitude:.6}"),
            latitude,
            longitude,
        }
    }

    /// A buttons template. `alt_text` is shown in chat lists and on clients
    /// that cannot render templates.
    pub fn buttons(alt_text: impl Into<String>, text: impl Into<String>, actions: Vec<Action>) -> Self {
        let mut actions = actions;
        actions.truncate(MAX_ACTIONS);
        Self::Template {
            alt_text: truncate(alt_text.into(), 400),
            template: Template::Buttons {
                text: truncate(text.into(), MAX_BUTTONS_TEXT_CHARS),
                actions,
            },
        }
    }
}

impl Action {
    pub fn postback(label: impl Into<String>, data: impl Into<String>) -> Self {
        let label = truncate(label.into(), MAX_LABEL_CHARS);
        Self::Postback {
            display_text: Some(label.clone()),
            label,
            data: data.into(),
        }
    }

    pub fn uri(label: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::Uri {
            label: truncate(label.into(), MAX_LABEL_CHARS),
            uri: uri.into(),
        }
    }
}

/// Cut `s` to at most `max` characters (not bytes).
fn truncate(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}
