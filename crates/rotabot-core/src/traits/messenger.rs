//! Messenger trait — the outbound half of a chat platform.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatTarget, Keyboard, Poll};

/// Outbound operations the bot needs from a chat platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Platform name, for logs.
    fn name(&self) -> &str;

    /// Send a text message; returns the new message id.
    async fn send_text(
        &self,
        chat: &ChatTarget,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64>;

    /// Replace the text (and inline keyboard) of an existing message.
    async fn edit_text(
        &self,
        chat: &ChatTarget,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    /// Replace only the inline keyboard of an existing message.
    async fn edit_keyboard(
        &self,
        chat: &ChatTarget,
        message_id: i64,
        keyboard: &Keyboard,
    ) -> Result<()>;

    /// Acknowledge a button press, optionally with a popup text.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>, alert: bool)
        -> Result<()>;

    /// Post a poll; returns its message id.
    async fn send_poll(&self, chat: &ChatTarget, poll: &Poll) -> Result<i64>;
}
