use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::notifier::{Notifier, PushMessage};

/// Expo Push Notification client
/// Sends push notifications to the mobile app students and lecturers use.
pub struct ExpoNotifier {
    client: Client,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExpoMessage {
    to: String,
    title: String,
    body: String,
    data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    sound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpoResponse {
    data: Vec<ExpoTicket>,
}

#[derive(Debug, Deserialize)]
struct ExpoTicket {
    status: String,
    #[allow(dead_code)]
    id: Option<String>,
    #[allow(dead_code)]
    message: Option<String>,
}

impl ExpoNotifier {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            access_token,
        }
    }

    fn to_expo(message: PushMessage) -> ExpoMessage {
        ExpoMessage {
            to: message.push_token,
            title: message.title,
            body: message.body,
            data: message.data,
            sound: Some("default".to_string()),
        }
    }

    async fn post(&self, payload: &impl Serialize, count: usize) -> Result<()> {
        let mut request = self
            .client
            .post("https://exp.host/--/api/v2/push/send")
            .json(payload);

        // Access token raises the rate limit ceiling
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        info!("Sending {} Expo push notification(s)", count);

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            error!("Expo push failed {}: {}", status, body);
            anyhow::bail!("Expo push API error {}: {}", status, body);
        }

        let expo_response: ExpoResponse = response.json().await?;

        // Log ticket errors but don't fail the whole send
        let mut error_count = 0;
        for ticket in &expo_response.data {
            if ticket.status == "error" {
                error!("Expo ticket error: {:?}", ticket);
                error_count += 1;
            }
        }

        if error_count > 0 {
            error!(
                "{} out of {} notifications failed",
                error_count,
                expo_response.data.len()
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for ExpoNotifier {
    async fn notify(&self, message: PushMessage) -> Result<()> {
        self.post(&Self::to_expo(message), 1).await
    }

    async fn notify_batch(&self, messages: Vec<PushMessage>) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let count = messages.len();
        let payload: Vec<ExpoMessage> = messages.into_iter().map(Self::to_expo).collect();
        self.post(&payload, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expo_notifier_creation() {
        let notifier = ExpoNotifier::new(None);
        assert!(notifier.access_token.is_none());

        let with_token = ExpoNotifier::new(Some("test-token".to_string()));
        assert!(with_token.access_token.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires valid Expo push token
    async fn test_send_notification() {
        let notifier = ExpoNotifier::new(None);
        let token = std::env::var("TEST_EXPO_TOKEN").expect("TEST_EXPO_TOKEN not set");

        let result = notifier
            .notify(PushMessage {
                push_token: token,
                title: "Test Notification".to_string(),
                body: "This is a test message".to_string(),
                data: serde_json::json!({"test": true}),
            })
            .await;

        assert!(result.is_ok());
    }
}
