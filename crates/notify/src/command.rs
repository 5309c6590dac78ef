//! Chat command and postback parsing.
//!
//! Caregivers drive the bot from the LINE rich menu, which sends fixed
//! text keywords, or by typing them.  Keywords are matched case-insensitively
//! in English or Thai, with or without a leading `/`.

use thiserror::Error;
use uuid::Uuid;

/// Supported chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Register,
    Location,
    Status,
    RequestHelp,
    Borrow,
    Settings,
}

/// Parse error for chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("message is empty")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

const KEYWORDS: &[(&str, ChatCommand)] = &[
    ("help", ChatCommand::Help),
    ("menu", ChatCommand::Help),
    ("เมนู", ChatCommand::Help),
    ("register", ChatCommand::Register),
    ("ลงทะเบียน", ChatCommand::Register),
    ("location", ChatCommand::Location),
    ("where", ChatCommand::Location),
    ("ดูตำแหน่ง", ChatCommand::Location),
    ("ตำแหน่ง", ChatCommand::Location),
    ("status", ChatCommand::Status),
    ("สถานะ", ChatCommand::Status),
    ("sos", ChatCommand::RequestHelp),
    ("request help", ChatCommand::RequestHelp),
    ("ขอความช่วยเหลือ", ChatCommand::RequestHelp),
    ("borrow", ChatCommand::Borrow),
    ("ยืมอุปกรณ์", ChatCommand::Borrow),
    ("settings", ChatCommand::Settings),
    ("ตั้งค่า", ChatCommand::Settings),
];

/// Parse a chat message into a bot command.
pub fn parse_command(text: &str) -> Result<ChatCommand, CommandParseError> {
    let normalized = text.trim().trim_start_matches('/').to_lowercase();
    let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        return Err(CommandParseError::Empty);
    }

    KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == normalized)
        .map(|(_, command)| *command)
        .ok_or(CommandParseError::UnknownCommand(normalized))
}

/// Actions carried in the `data` field of postback buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostbackAction {
    AcceptRescue(Uuid),
    CloseRescue(Uuid),
}

impl PostbackAction {
    /// Encode as `action=<name>&id=<uuid>`.
    pub fn to_data(self) -> String {
        match self {
            Self::AcceptRescue(id) => format!("action=accept_rescue&id={id}"),
            Self::CloseRescue(id) => format!("action=close_rescue&id={id}"),
        }
    }
}

/// Parse postback `data`. Returns `None` for anything this bot did not send.
pub fn parse_postback(data: &str) -> Option<PostbackAction> {
    let mut action = None;
    let mut id = None;

    for pair in data.split('&') {
        match pair.split_once('=') {
            Some(("action", value)) => action = Some(value),
            Some(("id", value)) => id = Uuid::parse_str(value).ok(),
            _ => {}
        }
    }

    match (action?, id?) {
        ("accept_rescue", id) => Some(PostbackAction::AcceptRescue(id)),
        ("close_rescue", id) => Some(PostbackAction::CloseRescue(id)),
        _ => None,
    }
}
