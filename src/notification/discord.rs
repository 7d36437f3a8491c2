//! Discord bot notifier.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;

use super::{Notifier, error::NotificationError, render::ChannelKind};
use crate::models::notifier::DiscordConfig;

/// Posts alerts to one or more Discord channels as a bot.
#[derive(Debug)]
pub struct DiscordNotifier {
    base_url: String,
    authorization: String,
    channel_ids: Vec<String>,
    client: ClientWithMiddleware,
}

impl DiscordNotifier {
    /// Creates a new notifier sending through `client`.
    pub fn new(config: &DiscordConfig, client: ClientWithMiddleware) -> Self {
        Self {
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            authorization: format!("Bot {}", config.token),
            channel_ids: config.channel_ids.clone(),
            client,
        }
    }

    async fn send_to(&self, channel_id: &str, content: &str) -> Result<(), NotificationError> {
        let url = format!("{}/channels/{}/messages", self.base_url, channel_id);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, &self.authorization)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::NotifyFailed(format!(
                "Discord request failed with status: {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn channel_kind(&self) -> ChannelKind {
        ChannelKind::Discord
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        let content = format!("{title}\n{body}");
        let mut results = Vec::with_capacity(self.channel_ids.len());
        for channel_id in &self.channel_ids {
            let result = self.send_to(channel_id, &content).await;
            if let Err(e) = &result {
                tracing::warn!(channel_id = %channel_id, error = %e, "Failed to deliver Discord message.");
            }
            results.push((format!("channel {channel_id}"), result));
        }
        NotificationError::collect(results)
    }
}
