use async_trait::async_trait;

use super::{Notifier, error::NotificationError, render::ChannelKind};

/// A notifier that prints alerts to standard output.
#[derive(Debug, Default)]
pub struct StdoutNotifier;

impl StdoutNotifier {
    fn format(title: &str, body: &str) -> String {
        format!("=== Sentinel alert ===\n{title}{body}")
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn channel_kind(&self) -> ChannelKind {
        ChannelKind::Plain
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        println!("{}", Self::format(title, body));
        Ok(())
    }
}
