//! Per-chat registry of rotas.

use rotabot_core::error::{Result, RotaError};
use rotabot_core::types::{Participant, Policy};
use std::collections::HashMap;

use crate::roster::Rota;
use crate::selector::Assignment;

/// In-memory rota state for every chat the bot talks to.
#[derive(Debug, Default)]
pub struct RotaBook {
    rotas: HashMap<i64, Rota>,
}

impl RotaBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a chat's roster. On error the chat keeps its old roster.
    pub fn configure(&mut self, chat_id: i64, participants: Vec<Participant>) -> Result<()> {
        self.rotas.entry(chat_id).or_default().configure(participants)?;
        tracing::info!("Chat {chat_id}: roster configured");
        Ok(())
    }

    /// Seed the roster from `defaults` if the chat has none yet.
    ///
    /// Returns true when the defaults were applied.
    pub fn ensure_default(&mut self, chat_id: i64, defaults: &[Participant]) -> Result<bool> {
        let rota = self.rotas.entry(chat_id).or_default();
        if rota.is_configured() || defaults.is_empty() {
            return Ok(false);
        }
        rota.configure(defaults.to_vec())?;
        tracing::info!("Chat {chat_id}: default roster applied");
        Ok(true)
    }

    /// Current roster for a chat; empty if never configured.
    pub fn roster(&self, chat_id: i64) -> &[Participant] {
        self.rotas.get(&chat_id).map(Rota::roster).unwrap_or(&[])
    }

    /// Run a selection for a chat. Unknown chats are left untouched.
    pub fn select(
        &mut self,
        chat_id: i64,
        active: &[Participant],
        policy: Policy,
        count: usize,
    ) -> Result<Assignment> {
        let rota = self.rotas.get_mut(&chat_id).ok_or_else(|| {
            RotaError::InconsistentState(format!("chat {chat_id} has no roster"))
        })?;
        let assignment = rota.select(active, policy, count)?;
        tracing::info!(
            "Chat {chat_id}: {} picked {}",
            policy,
            assignment.joined()
        );
        Ok(assignment)
    }

    /// Forget a chat's roster and cursor; returns true if there was one.
    pub fn reset(&mut self, chat_id: i64) -> bool {
        let removed = self.rotas.remove(&chat_id).is_some();
        if removed {
            tracing::info!("Chat {chat_id}: rota reset");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rotas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotas.is_empty()
    }
}
