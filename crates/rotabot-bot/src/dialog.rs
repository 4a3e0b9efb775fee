//! Per-chat conversation state.
//!
//! A chat is either waiting for a roster (after `/configure`) or walking an
//! `/assign` dialog, never both. Either belongs to the user who started it.

use rotabot_core::error::{Result, RotaError};
use rotabot_core::types::{Participant, Policy};
use std::collections::HashMap;

/// Where an `/assign` dialog currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectActive,
    ChoosePolicy,
    ChooseCount,
    AwaitDescription,
    AwaitChannel,
}

/// One in-progress `/assign` conversation.
#[derive(Debug, Clone)]
pub struct Dialog {
    pub owner: i64,
    pub step: Step,
    pub active: Vec<Participant>,
    pub policy: Option<Policy>,
    pub count: Option<usize>,
    pub description: String,
    /// Message that carries the inline keyboard.
    pub keyboard_message: Option<i64>,
}

/// Everything needed to run the selection once the channel is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub active: Vec<Participant>,
    pub policy: Policy,
    pub count: usize,
    pub description: String,
}

fn stale() -> RotaError {
    RotaError::Validation("This button is no longer active".into())
}

impl Dialog {
    pub fn new(owner: i64) -> Self {
        Self {
            owner,
            step: Step::SelectActive,
            active: Vec::new(),
            policy: None,
            count: None,
            description: String::new(),
            keyboard_message: None,
        }
    }

    fn require_step(&self, step: Step) -> Result<()> {
        if self.step == step { Ok(()) } else { Err(stale()) }
    }

    /// Flip a member's active flag; only roster members can be switched on.
    pub fn toggle(&mut self, participant: &Participant, roster: &[Participant]) -> Result<()> {
        self.require_step(Step::SelectActive)?;
        if let Some(pos) = self.active.iter().position(|p| p == participant) {
            self.active.remove(pos);
        } else if roster.contains(participant) {
            self.active.push(participant.clone());
        } else {
            return Err(RotaError::Validation(format!("{participant} is not in the roster")));
        }
        Ok(())
    }

    pub fn confirm_active(&mut self) -> Result<()> {
        self.require_step(Step::SelectActive)?;
        if self.active.is_empty() {
            return Err(RotaError::Validation("Select at least one participant".into()));
        }
        self.step = Step::ChoosePolicy;
        Ok(())
    }

    pub fn choose_policy(&mut self, policy: Policy) -> Result<()> {
        self.require_step(Step::ChoosePolicy)?;
        self.policy = Some(policy);
        self.step = Step::ChooseCount;
        Ok(())
    }

    /// Largest count the count keyboard should offer.
    pub fn max_count(&self, limit: usize) -> usize {
        self.active.len().min(limit)
    }

    pub fn choose_count(&mut self, count: usize, limit: usize) -> Result<()> {
        self.require_step(Step::ChooseCount)?;
        if count == 0 || count > limit {
            return Err(RotaError::InvalidCount(count));
        }
        if count > self.active.len() {
            return Err(RotaError::InsufficientParticipants {
                requested: count,
                available: self.active.len(),
            });
        }
        self.count = Some(count);
        self.step = Step::AwaitDescription;
        Ok(())
    }

    pub fn set_description(&mut self, text: &str) -> Result<()> {
        self.require_step(Step::AwaitDescription)?;
        self.description = text.trim().to_string();
        self.step = Step::AwaitChannel;
        Ok(())
    }

    /// The finished request, if the dialog reached the channel step.
    pub fn request(&self) -> Result<Request> {
        self.require_step(Step::AwaitChannel)?;
        match (self.policy, self.count) {
            (Some(policy), Some(count)) => Ok(Request {
                active: self.active.clone(),
                policy,
                count,
                description: self.description.clone(),
            }),
            _ => Err(stale()),
        }
    }
}

/// Conversation state for every chat.
#[derive(Debug, Default)]
pub struct Dialogs {
    pending: HashMap<i64, Dialog>,
    /// chat id → user whose next message is a roster.
    expect_config: HashMap<i64, i64>,
}

impl Dialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh `/assign` dialog, replacing whatever the chat had pending.
    pub fn start(&mut self, chat_id: i64, owner: i64) -> &mut Dialog {
        if self.expect_config.remove(&chat_id).is_some() {
            tracing::debug!("Chat {chat_id}: pending /configure dropped by /assign");
        }
        let slot = self.pending.entry(chat_id).or_insert_with(|| Dialog::new(owner));
        *slot = Dialog::new(owner);
        slot
    }

    pub fn get(&self, chat_id: i64) -> Option<&Dialog> {
        self.pending.get(&chat_id)
    }

    pub fn get_mut(&mut self, chat_id: i64) -> Option<&mut Dialog> {
        self.pending.get_mut(&chat_id)
    }

    pub fn finish(&mut self, chat_id: i64) -> Option<Dialog> {
        self.pending.remove(&chat_id)
    }

    /// Wait for a roster from `user_id`, dropping any `/assign` dialog in the chat.
    pub fn expect_config(&mut self, chat_id: i64, user_id: i64) {
        if self.pending.remove(&chat_id).is_some() {
            tracing::debug!("Chat {chat_id}: pending /assign dropped by /configure");
        }
        self.expect_config.insert(chat_id, user_id);
    }

    /// Consume the roster expectation if `user_id` set it.
    pub fn take_config(&mut self, chat_id: i64, user_id: i64) -> bool {
        if self.expect_config.get(&chat_id) == Some(&user_id) {
            self.expect_config.remove(&chat_id);
            true
        } else {
            false
        }
    }

    /// Drop everything pending in a chat; returns true if anything was dropped.
    pub fn cancel(&mut self, chat_id: i64) -> bool {
        let dialog = self.pending.remove(&chat_id).is_some();
        let config = self.expect_config.remove(&chat_id).is_some();
        dialog || config
    }
}
