//! Inline button payloads.

use rotabot_core::types::{Participant, Policy};
use std::fmt;

const SEP: &str = "::";

/// Decoded `callback_data` of an inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Toggle(Participant),
    Next,
    Cancel,
    Policy(Policy),
    Count(usize),
}

impl CallbackAction {
    /// Decode callback data; `None` for anything the bot did not emit.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "next" => return Some(Self::Next),
            "cancel" => return Some(Self::Cancel),
            _ => {}
        }
        let (kind, value) = data.split_once(SEP)?;
        match kind {
            "toggle" => Participant::parse(value).ok().map(Self::Toggle),
            "policy" => value.parse().ok().map(Self::Policy),
            "count" => value.parse().ok().map(Self::Count),
            _ => None,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle(p) => write!(f, "toggle{SEP}{p}"),
            Self::Next => f.write_str("next"),
            Self::Cancel => f.write_str("cancel"),
            Self::Policy(p) => write!(f, "policy{SEP}{}", p.key()),
            Self::Count(n) => write!(f, "count{SEP}{n}"),
        }
    }
}
