//! This module defines the data structures for notifier configurations.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::{HttpRetryConfig, deserialize_string_list};

fn default_telegram_api_url() -> Url {
    Url::parse("https://api.telegram.org").expect("static Telegram URL is valid")
}

fn default_discord_api_url() -> Url {
    Url::parse("https://discord.com/api/v10").expect("static Discord URL is valid")
}

/// Configuration for a Telegram bot notifier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TelegramConfig {
    /// The Telegram bot token.
    pub token: String,
    /// The chats every alert is delivered to.
    #[serde(deserialize_with = "deserialize_string_list")]
    pub chat_ids: Vec<String>,
    /// Base URL of the Bot API.
    #[serde(default = "default_telegram_api_url")]
    pub api_url: Url,
    /// Whether to disable web page preview for the message.
    #[serde(default)]
    pub disable_web_preview: bool,
    /// The retry policy configuration for HTTP requests.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_ids: Vec::new(),
            api_url: default_telegram_api_url(),
            disable_web_preview: false,
            retry_policy: HttpRetryConfig::default(),
        }
    }
}

/// Configuration for a Discord bot notifier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DiscordConfig {
    /// The Discord bot token.
    pub token: String,
    /// The channels every alert is posted to.
    #[serde(deserialize_with = "deserialize_string_list")]
    pub channel_ids: Vec<String>,
    /// Base URL of the Discord REST API.
    #[serde(default = "default_discord_api_url")]
    pub api_url: Url,
    /// The retry policy configuration for HTTP requests.
    #[serde(default)]
    pub retry_policy: HttpRetryConfig,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_ids: Vec::new(),
            api_url: default_discord_api_url(),
            retry_policy: HttpRetryConfig::default(),
        }
    }
}

/// Configuration for a Stdout notifier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct StdoutConfig {}

/// The notification backend alerts are dispatched through.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// A Telegram bot.
    Telegram(TelegramConfig),
    /// A Discord bot.
    Discord(DiscordConfig),
    /// Standard output, for local runs.
    Stdout(StdoutConfig),
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig::Stdout(StdoutConfig::default())
    }
}

/// Error types for notifier configuration validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifierConfigError {
    /// Error for empty Telegram token.
    #[error("Telegram token cannot be empty.")]
    EmptyTelegramToken,

    /// Error for missing Telegram chat IDs.
    #[error("At least one Telegram chat ID is required.")]
    MissingTelegramChatIds,

    /// Error for empty Discord token.
    #[error("Discord token cannot be empty.")]
    EmptyDiscordToken,

    /// Error for missing Discord channel IDs.
    #[error("At least one Discord channel ID is required.")]
    MissingDiscordChannelIds,
}

impl NotifierConfig {
    /// Validates the notifier configuration.
    pub fn validate(&self) -> Result<(), NotifierConfigError> {
        match self {
            NotifierConfig::Telegram(config) => {
                if config.token.is_empty() {
                    return Err(NotifierConfigError::EmptyTelegramToken);
                }
                if config.chat_ids.is_empty() {
                    return Err(NotifierConfigError::MissingTelegramChatIds);
                }
                Ok(())
            }
            NotifierConfig::Discord(config) => {
                if config.token.is_empty() {
                    return Err(NotifierConfigError::EmptyDiscordToken);
                }
                if config.channel_ids.is_empty() {
                    return Err(NotifierConfigError::MissingDiscordChannelIds);
                }
                Ok(())
            }
            // Standard output notifier requires no validation.
            NotifierConfig::Stdout(_) => Ok(()),
        }
    }

    /// The provider name, as written in configuration.
    pub fn provider(&self) -> &'static str {
        match self {
            NotifierConfig::Telegram(_) => "telegram",
            NotifierConfig::Discord(_) => "discord",
            NotifierConfig::Stdout(_) => "stdout",
        }
    }
}
