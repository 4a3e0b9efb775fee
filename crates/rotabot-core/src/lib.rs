//! # RotaBot Core
//! Shared error type, configuration, domain types and the messenger trait
//! every other crate builds on.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RotaBotConfig;
pub use error::{Result, RotaError};
pub use traits::Messenger;
pub use types::{Participant, Policy};
