//! # Notification Channels
//!
//! Delivery of rendered alerts to chat backends.
//!
//! ## Core Components
//!
//! - **`Notifier` Trait**: the interface the intake pipeline sends through. A
//!   notifier knows its [`ChannelKind`] so the pipeline can render the record
//!   in the right markup before calling `send`.
//! - **Implementations**: [`TelegramNotifier`], [`DiscordNotifier`] and
//!   [`StdoutNotifier`]. Exactly one is active, chosen at startup by
//!   [`build_notifier`] from the `notifier` configuration section.
//! - **Rendering**: the [`render`] module turns an error record into a title
//!   and body for a given channel kind.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    config::BaseHttpClientConfig, http_client::build_notifier_client,
    models::notifier::NotifierConfig,
};

mod discord;
pub mod error;
pub mod render;
mod stdout;
mod telegram;

pub use discord::DiscordNotifier;
use error::NotificationError;
pub use render::{AlertRenderer, ChannelKind};
pub use stdout::StdoutNotifier;
pub use telegram::TelegramNotifier;

/// A destination alerts are delivered to.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// The markup this notifier expects.
    fn channel_kind(&self) -> ChannelKind;

    /// Delivers a pre-rendered message to every configured recipient. Fails
    /// if any recipient failed, after all of them were attempted.
    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError>;
}

/// Builds the notifier selected by configuration.
pub fn build_notifier(
    config: &NotifierConfig,
    http_config: &BaseHttpClientConfig,
) -> Result<Arc<dyn Notifier>, NotificationError> {
    config.validate().map_err(|e| NotificationError::ConfigError(e.to_string()))?;

    let notifier: Arc<dyn Notifier> = match config {
        NotifierConfig::Telegram(tg) => {
            let client = build_notifier_client(http_config, &tg.retry_policy)?;
            Arc::new(TelegramNotifier::new(tg, client))
        }
        NotifierConfig::Discord(dc) => {
            let client = build_notifier_client(http_config, &dc.retry_policy)?;
            Arc::new(DiscordNotifier::new(dc, client))
        }
        NotifierConfig::Stdout(_) => Arc::new(StdoutNotifier),
    };
    tracing::info!(provider = notifier.name(), "Notifier initialized.");
    Ok(notifier)
}
