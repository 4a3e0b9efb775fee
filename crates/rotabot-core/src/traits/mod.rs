//! Trait seams between the bot logic and its transports.

pub mod messenger;

pub use messenger::Messenger;
