use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;

use crate::{
    models::NotificationMessage,
    notification::{ChannelKind, Notifier, error::NotificationError},
};

/// A notifier that keeps every message it is asked to send.
#[derive(Debug)]
pub struct RecordingNotifier {
    kind: ChannelKind,
    fail: AtomicBool,
    sent: Mutex<Vec<NotificationMessage>>,
}

impl RecordingNotifier {
    /// Creates a notifier rendering for `kind` that accepts every message.
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind, fail: AtomicBool::new(false), sent: Mutex::new(Vec::new()) }
    }

    /// Makes subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Messages delivered so far. Failed sends are not recorded.
    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn channel_kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, title: &str, body: &str) -> Result<(), NotificationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::NotifyFailed("recording notifier set to fail".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(NotificationMessage { title: title.to_string(), body: body.to_string() });
        Ok(())
    }
}
