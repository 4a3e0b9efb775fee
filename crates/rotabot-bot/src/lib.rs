//! # RotaBot Bot
//!
//! Conversation flow that turns chat commands and button presses into
//! roster updates and assignments.
//!
//! ## Flow
//! ```text
//! /configure → next text = roster
//! /assign    → toggle active members → Next
//!            → policy (Round-Robin | Random)
//!            → count (1..3)
//!            → description text
//!            → @channel text → select → post + completion poll
//! ```

pub mod callback;
pub mod dialog;
pub mod format;
pub mod handler;
pub mod keyboard;

pub use callback::CallbackAction;
pub use dialog::{Dialog, Dialogs, Step};
pub use handler::Bot;
