//! Shared domain and messaging types.

use crate::error::{Result, RotaError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest number of assignees one assignment may pick.
pub const MAX_ASSIGNEES: usize = 3;

/// A team member, identified by `@handle` or numeric user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Participant(String);

impl Participant {
    /// Normalize a raw token: numeric ids stay as-is, handles get a leading `@`.
    pub fn parse(raw: &str) -> Result<Self> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(RotaError::Validation("empty participant identifier".into()));
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return Ok(Self(token.to_string()));
        }
        let handle = token.strip_prefix('@').unwrap_or(token);
        if handle.is_empty() || handle.contains('@') || handle.chars().any(char::is_whitespace) {
            return Err(RotaError::Validation(format!("invalid participant '{token}'")));
        }
        Ok(Self(format!("@{handle}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Participant {
    type Err = RotaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Split free text (spaces, commas, newlines) into participants, keeping order.
///
/// Duplicates are kept so that roster validation can reject them.
pub fn parse_participants(raw: &str) -> Result<Vec<Participant>> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(Participant::parse)
        .collect()
}

/// Selection policy for an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Fair round-robin over the full roster order.
    Rotating,
    /// Uniform random draw without replacement.
    Random,
}

impl Policy {
    /// Key used in callback data.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Rotating => "round",
            Self::Random => "random",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rotating => "Round-Robin",
            Self::Random => "Random",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Policy {
    type Err = RotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "round" | "round_robin" | "round-robin" | "rotating" => Ok(Self::Rotating),
            "random" => Ok(Self::Random),
            other => Err(RotaError::Validation(format!("unknown policy '{other}'"))),
        }
    }
}

/// Where a message goes: a numeric chat or a public `@channel`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatTarget {
    Id(i64),
    Username(String),
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

/// Who sent an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: String,
}

/// Plain text message from a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub sender: Sender,
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Inline button press.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingCallback {
    pub callback_id: String,
    pub chat_id: i64,
    /// Message carrying the keyboard, if Telegram still has it.
    pub message_id: Option<i64>,
    pub sender: Sender,
    pub data: String,
}

/// Anything the bot reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Incoming {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

impl Incoming {
    pub fn chat_id(&self) -> i64 {
        match self {
            Self::Message(m) => m.chat_id,
            Self::Callback(c) => c.chat_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Buttons under the message that fire callbacks.
    Inline(Vec<Vec<InlineButton>>),
    /// Persistent reply keyboard that sends its label as text.
    Reply(Vec<Vec<String>>),
}

/// Completion poll posted under an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<String>,
    pub anonymous: bool,
    pub multiple_answers: bool,
    pub reply_to: Option<i64>,
}
