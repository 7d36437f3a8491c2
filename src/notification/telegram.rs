//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;

use super::{Notifier, error::NotificationError, render::ChannelKind};
use crate::models::notifier::TelegramConfig;

/// Sends alerts to one or more Telegram chats through `sendMessage`.
#[derive(Debug)]
pub struct TelegramNotifier {
    endpoint: String,
    chat_ids: Vec<String>,
    disable_web_preview: bool,
    client: ClientWithMiddleware,
}

impl TelegramNotifier {
    /// Creates a new notifier sending through `client`.
    pub fn new(config: &TelegramConfig, client: ClientWithMiddleware) -> Self {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            config.api_url.as_str().trim_end_matches('/'),
            config.token
        );
        Self {
            endpoint,
            chat_ids: config.chat_ids.clone(),
            disable_web_preview: config.disable_web_preview,
            client,
        }
    }

    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": self.disable_web_preview,
        });
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::NotifyFailed(format!(
                "Telegram request failed with status: {status}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn channel_kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        let text = format!("{title}\n{body}");
        let mut results = Vec::with_capacity(self.chat_ids.len());
        for chat_id in &self.chat_ids {
            let result = self.send_to(chat_id, &text).await;
            if let Err(e) = &result {
                tracing::warn!(chat_id = %chat_id, error = %e, "Failed to deliver Telegram message.");
            }
            results.push((format!("chat {chat_id}"), result));
        }
        NotificationError::collect(results)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use url::Url;

    use super::*;

    fn notifier(server_url: &str, chat_ids: &[&str]) -> TelegramNotifier {
        let config = TelegramConfig {
            token: "123:abc".to_string(),
            chat_ids: chat_ids.iter().map(|c| c.to_string()).collect(),
            api_url: Url::parse(server_url).unwrap(),
            disable_web_preview: true,
            ..Default::default()
        };
        let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build();
        TelegramNotifier::new(&config, client)
    }

    #[tokio::test]
    async fn test_send_posts_html_message_to_every_chat() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": "-100",
                "text": "<b>title</b>\n\nbody",
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            })))
            .with_status(200)
            .create_async()
            .await;
        let second = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "chat_id": "42" })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = notifier(&server.url(), &["-100", "42"]);
        notifier.send("<b>title</b>\n", "body").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_attempts_all_chats_and_reports_failure() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "chat_id": "1" })))
            .with_status(403)
            .create_async()
            .await;
        let succeeding = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "chat_id": "2" })))
            .with_status(200)
            .create_async()
            .await;

        let notifier = notifier(&server.url(), &["1", "2"]);
        let result = notifier.send("t", "b").await;

        assert!(matches!(
            result,
            Err(NotificationError::DeliveryFailed { failed: 1, attempted: 2, .. })
        ));
        failing.assert_async().await;
        succeeding.assert_async().await;
    }
}
