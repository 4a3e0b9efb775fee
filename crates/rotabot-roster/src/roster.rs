//! Roster store and the per-chat rotation state.

use rotabot_core::error::{Result, RotaError};
use rotabot_core::types::{Participant, Policy};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::selector::{self, Assignment};

/// Ordered, duplicate-free list of participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<Participant>,
}

impl Roster {
    /// Build a roster, rejecting empty input and duplicate identifiers.
    pub fn new(participants: Vec<Participant>) -> Result<Self> {
        if participants.is_empty() {
            return Err(RotaError::Validation("roster cannot be empty".into()));
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for p in &participants {
            if !seen.insert(p) {
                return Err(RotaError::Validation(format!("duplicate participant {p}")));
            }
        }
        Ok(Self {
            members: participants,
        })
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, participant: &Participant) -> bool {
        self.members.contains(participant)
    }
}

/// One chat's roster plus its rotation cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rota {
    roster: Roster,
    cursor: usize,
}

impl Rota {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster wholesale. On error the current roster is kept.
    pub fn configure(&mut self, participants: Vec<Participant>) -> Result<()> {
        let roster = Roster::new(participants)?;
        tracing::debug!("Roster configured with {} participants", roster.len());
        self.roster = roster;
        self.cursor = 0;
        Ok(())
    }

    pub fn roster(&self) -> &[Participant] {
        self.roster.members()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_configured(&self) -> bool {
        !self.roster.is_empty()
    }

    /// Pick `count` assignees from `active` using the thread-local RNG.
    pub fn select(
        &mut self,
        active: &[Participant],
        policy: Policy,
        count: usize,
    ) -> Result<Assignment> {
        self.select_with(active, policy, count, &mut rand::thread_rng())
    }

    /// Pick `count` assignees with a caller-supplied RNG.
    ///
    /// The cursor only moves on a successful rotating selection.
    pub fn select_with<R: Rng + ?Sized>(
        &mut self,
        active: &[Participant],
        policy: Policy,
        count: usize,
        rng: &mut R,
    ) -> Result<Assignment> {
        match policy {
            Policy::Random => selector::select_random(&self.roster, active, count, rng),
            Policy::Rotating => {
                let (assignment, next) =
                    selector::select_rotating(&self.roster, self.cursor, active, count)?;
                self.cursor = next;
                Ok(assignment)
            }
        }
    }
}
