//! # RotaBot Roster
//!
//! Team roster and assignee selection.
//!
//! ## Architecture
//! ```text
//! RotaBook (per chat)
//!   └── Rota
//!         ├── Roster: ordered, duplicate-free participants
//!         └── cursor: next rotation position in the full roster
//!
//! select(active, policy, count)
//!   ├── Rotating → walk roster from cursor, skip inactive, advance cursor
//!   └── Random   → uniform draw without replacement, stateless
//! ```

pub mod book;
pub mod roster;
pub mod selector;

pub use book::RotaBook;
pub use roster::{Rota, Roster};
pub use selector::{Assignment, select_random, select_rotating};
