//! # RotaBot Channels
//! Chat platform transports implementing [`rotabot_core::Messenger`].

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramPollingStream};
