//! Telegram Bot channel — long polling + message sending via Bot API.

use async_trait::async_trait;
use futures::stream::Stream;
use rotabot_core::config::TelegramConfig;
use rotabot_core::error::{Result, RotaError};
use rotabot_core::traits::Messenger;
use rotabot_core::types::{
    ChatTarget, Incoming, IncomingCallback, IncomingMessage, Keyboard, Poll, Sender,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll as TaskPoll};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const ERROR_BACKOFF_SECS: u64 = 5;

/// Telegram Bot channel with polling loop.
#[derive(Clone)]
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    api_base: String,
    last_update_id: i64,
}

impl TelegramChannel {
    /// The HTTP timeout outlives the long-poll timeout so `getUpdates` is not cut short.
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.poll_timeout + 10))
            .build()
            .map_err(|e| RotaError::Channel(format!("HTTP client error: {e}")))?;
        Ok(Self {
            config,
            client,
            api_base: DEFAULT_API_BASE.into(),
            last_update_id: 0,
        })
    }

    /// Point the client at another Bot API server (local bot API, test double).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.config.bot_token, method)
    }

    /// POST a Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: &serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| RotaError::Channel(format!("Telegram {method} failed: {e}")))?;

        let body: TelegramApiResponse<T> = response
            .json()
            .await
            .map_err(|e| RotaError::Channel(format!("Invalid Telegram {method} response: {e}")))?;

        body.into_result(method)
    }

    /// Get updates using long polling.
    pub async fn get_updates(&mut self) -> Result<Vec<TelegramUpdate>> {
        let updates: Vec<TelegramUpdate> = self
            .call(
                "getUpdates",
                &serde_json::json!({
                    "offset": self.last_update_id + 1,
                    "timeout": self.config.poll_timeout,
                    "allowed_updates": ["message", "callback_query"],
                }),
            )
            .await?;

        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Verify the token before polling starts.
    pub async fn connect(&self) -> Result<TelegramUser> {
        let me = self.get_me().await?;
        tracing::info!(
            "Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );
        Ok(me)
    }

    /// Start polling loop — returns a stream of incoming updates.
    pub fn start_polling(&self) -> TelegramPollingStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut channel = self.clone();

        tokio::spawn(async move {
            tracing::info!("Telegram polling loop started");

            loop {
                match channel.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            if let Some(incoming) = update.to_incoming()
                                && tx.send(incoming).is_err()
                            {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(ERROR_BACKOFF_SECS))
                            .await;
                    }
                }

                if tx.is_closed() {
                    tracing::info!("Telegram polling stopped (receiver dropped)");
                    return;
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(
                    channel.config.poll_interval,
                ))
                .await;
            }
        });

        TelegramPollingStream { rx }
    }
}

/// Stream of incoming Telegram updates from polling.
pub struct TelegramPollingStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<Incoming>,
}

impl Stream for TelegramPollingStream {
    type Item = Incoming;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> TaskPoll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Bot API `reply_markup` JSON for a keyboard.
pub fn reply_markup(keyboard: &Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::Inline(rows) => serde_json::json!({
            "inline_keyboard": rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| serde_json::json!({"text": b.text, "callback_data": b.data}))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
        }),
        Keyboard::Reply(rows) => serde_json::json!({
            "keyboard": rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| serde_json::json!({"text": label}))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
        }),
    }
}

#[async_trait]
impl Messenger for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(
        &self,
        chat: &ChatTarget,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64> {
        let mut body = serde_json::json!({
            "chat_id": chat,
            "text": text,
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = reply_markup(kb);
        }
        let sent: TelegramMessage = self.call("sendMessage", &body).await?;
        Ok(sent.message_id)
    }

    async fn edit_text(
        &self,
        chat: &ChatTarget,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat,
            "message_id": message_id,
            "text": text,
        });
        if let Some(kb @ Keyboard::Inline(_)) = keyboard {
            body["reply_markup"] = reply_markup(kb);
        }
        let _: serde_json::Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat: &ChatTarget,
        message_id: i64,
        keyboard: &Keyboard,
    ) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat,
            "message_id": message_id,
            "reply_markup": reply_markup(keyboard),
        });
        let _: serde_json::Value = self.call("editMessageReplyMarkup", &body).await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "callback_query_id": callback_id,
            "show_alert": alert,
        });
        if let Some(text) = text {
            body["text"] = serde_json::Value::String(text.to_string());
        }
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    async fn send_poll(&self, chat: &ChatTarget, poll: &Poll) -> Result<i64> {
        let mut body = serde_json::json!({
            "chat_id": chat,
            "question": poll.question,
            "options": poll.options,
            "is_anonymous": poll.anonymous,
            "allows_multiple_answers": poll.multiple_answers,
        });
        if let Some(reply_to) = poll.reply_to {
            body["reply_to_message_id"] = serde_json::json!(reply_to);
        }
        let sent: TelegramMessage = self.call("sendPoll", &body).await?;
        Ok(sent.message_id)
    }
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

impl<T> TelegramApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(RotaError::Channel(format!(
                "Telegram API error in {method}: {}",
                self.description.unwrap_or_default()
            )));
        }
        self.result
            .ok_or_else(|| RotaError::Channel(format!("Telegram {method} returned no result")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub date: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl TelegramUser {
    fn to_sender(&self) -> Sender {
        Sender {
            id: self.id,
            username: self.username.clone(),
            display_name: format!(
                "{}{}",
                self.first_name,
                self.last_name
                    .as_deref()
                    .map(|l| format!(" {l}"))
                    .unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
}

impl TelegramUpdate {
    /// Convert to a RotaBot incoming update.
    pub fn to_incoming(&self) -> Option<Incoming> {
        if let Some(cb) = &self.callback_query {
            if cb.from.is_bot {
                return None;
            }
            let data = cb.data.as_ref()?;
            // Without the originating message the private chat is the user's own id.
            let (chat_id, message_id) = match &cb.message {
                Some(m) => (m.chat.id, Some(m.message_id)),
                None => (cb.from.id, None),
            };
            return Some(Incoming::Callback(IncomingCallback {
                callback_id: cb.id.clone(),
                chat_id,
                message_id,
                sender: cb.from.to_sender(),
                data: data.clone(),
            }));
        }

        let msg = self.message.as_ref()?;
        let text = msg.text.as_ref()?;
        let from = msg.from.as_ref()?;

        // Skip bot messages
        if from.is_bot {
            return None;
        }

        Some(Incoming::Message(IncomingMessage {
            chat_id: msg.chat.id,
            message_id: msg.message_id,
            sender: from.to_sender(),
            text: text.clone(),
            timestamp: chrono::DateTime::from_timestamp(msg.date, 0)
                .unwrap_or_else(chrono::Utc::now),
        }))
    }
}
