//! Assignee selection policies.
//!
//! Both policies share one validation pass and then run as pure functions;
//! the rotating one returns the next cursor instead of mutating anything.

use rand::Rng;
use rand::seq::SliceRandom;
use rotabot_core::error::{Result, RotaError};
use rotabot_core::types::{MAX_ASSIGNEES, Participant, Policy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::roster::Roster;

/// Outcome of one selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub policy: Policy,
    pub assignees: Vec<Participant>,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.assignees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignees.is_empty()
    }

    /// `@a, @b` style list.
    pub fn joined(&self) -> String {
        self.assignees
            .iter()
            .map(Participant::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Check count and membership; returns `active` without duplicates, order kept.
fn validate(roster: &Roster, active: &[Participant], count: usize) -> Result<Vec<Participant>> {
    if !(1..=MAX_ASSIGNEES).contains(&count) {
        return Err(RotaError::InvalidCount(count));
    }

    let mut seen = HashSet::with_capacity(active.len());
    let unique: Vec<Participant> = active
        .iter()
        .filter(|p| seen.insert(*p))
        .cloned()
        .collect();

    if count > unique.len() {
        return Err(RotaError::InsufficientParticipants {
            requested: count,
            available: unique.len(),
        });
    }
    if roster.is_empty() {
        return Err(RotaError::InconsistentState("roster is empty".into()));
    }
    if let Some(stranger) = unique.iter().find(|p| !roster.contains(p)) {
        return Err(RotaError::InconsistentState(format!(
            "{stranger} is not in the roster"
        )));
    }
    Ok(unique)
}

/// Draw `count` distinct participants uniformly at random from `active`.
pub fn select_random<R: Rng + ?Sized>(
    roster: &Roster,
    active: &[Participant],
    count: usize,
    rng: &mut R,
) -> Result<Assignment> {
    let mut pool = validate(roster, active, count)?;
    let (picked, _) = pool.partial_shuffle(rng, count);
    Ok(Assignment {
        policy: Policy::Random,
        assignees: picked.to_vec(),
    })
}

/// Walk the full roster from `cursor`, wrapping, taking active members until
/// `count` are collected.
///
/// Returns the assignment and the cursor for the next call: the index right
/// after the last pick. A cursor past the end of a shrunk roster is wrapped.
pub fn select_rotating(
    roster: &Roster,
    cursor: usize,
    active: &[Participant],
    count: usize,
) -> Result<(Assignment, usize)> {
    let active: HashSet<Participant> = validate(roster, active, count)?.into_iter().collect();
    let members = roster.members();
    let len = members.len();
    let start = cursor % len;

    let mut assignees = Vec::with_capacity(count);
    let mut last = start;
    for offset in 0..len {
        let idx = (start + offset) % len;
        if active.contains(&members[idx]) {
            assignees.push(members[idx].clone());
            last = idx;
            if assignees.len() == count {
                break;
            }
        }
    }

    if assignees.len() < count {
        return Err(RotaError::InconsistentState(format!(
            "only {} of {count} active participants reachable in roster",
            assignees.len()
        )));
    }

    let next = (last + 1) % len;
    tracing::debug!(
        "Rotation picked {} from cursor {start}, next cursor {next}",
        assignees.len()
    );
    Ok((
        Assignment {
            policy: Policy::Rotating,
            assignees,
        },
        next,
    ))
}
