//! Notification port.
//!
//! Delivery is best-effort and fire-and-forget: approval transitions never
//! fail because a push could not be delivered. Callers log and swallow
//! errors from this trait.

use anyhow::Result;
use async_trait::async_trait;

/// A single push message addressed to a device token.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub push_token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a single notification.
    async fn notify(&self, message: PushMessage) -> Result<()>;

    /// Send a batch of notifications in one call where the backend supports
    /// it. Default implementation falls back to sequential sends.
    async fn notify_batch(&self, messages: Vec<PushMessage>) -> Result<()> {
        for message in messages {
            self.notify(message).await?;
        }
        Ok(())
    }
}

/// Notifier that records messages instead of sending them. Used by tests to
/// assert on the notify-on-transition contract.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<PushMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: PushMessage) -> Result<()> {
        self.sent.lock().expect("notifier mutex poisoned").push(message);
        Ok(())
    }
}
