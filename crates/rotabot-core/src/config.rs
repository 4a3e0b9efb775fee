//! RotaBot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RotaError};
use crate::types::{MAX_ASSIGNEES, Participant};

/// Environment variable that overrides `telegram.bot_token`.
pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RotaBotConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub roster: RosterConfig,
}

impl RotaBotConfig {
    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RotaError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RotaError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Write config to a path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RotaError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV)
            && !token.trim().is_empty()
        {
            self.telegram.bot_token = token.trim().to_string();
        }
    }

    /// Check the values the bot cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(RotaError::Config(format!(
                "Telegram bot token is missing (set {TOKEN_ENV} or telegram.bot_token)"
            )));
        }
        if self.roster.max_count == 0 || self.roster.max_count > MAX_ASSIGNEES {
            return Err(RotaError::Config(format!(
                "roster.max_count must be between 1 and {MAX_ASSIGNEES}"
            )));
        }
        self.roster.default_participants()?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the RotaBot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rotabot")
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Seconds to wait between long-poll requests.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Long-poll timeout passed to getUpdates.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,
}

fn default_poll_interval() -> u64 { 1 }
fn default_poll_timeout() -> u64 { 30 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
        }
    }
}

/// Admin allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Usernames (with or without `@`) or numeric user ids. Empty allows everyone.
    #[serde(default)]
    pub admins: Vec<String>,
}

/// Roster defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Roster used by `/assign` in chats that never ran `/configure`.
    #[serde(default)]
    pub default: Vec<String>,
    /// Highest count offered on the count keyboard.
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

fn default_max_count() -> usize { MAX_ASSIGNEES }

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            default: Vec::new(),
            max_count: default_max_count(),
        }
    }
}

impl RosterConfig {
    /// Parse the configured default roster.
    pub fn default_participants(&self) -> Result<Vec<Participant>> {
        self.default.iter().map(|raw| Participant::parse(raw)).collect()
    }
}
