use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use super::record::Posting;

/// Outbound notification seam.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a free-form service message (startup banner and the like).
    async fn announce(&self, text: &str) -> Result<(), NotifyError>;

    /// Deliver one new-posting notification.
    async fn notify(&self, posting: &Posting) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("chat transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned status {0}")]
    Status(StatusCode),
}

/// Render the human-readable message for one posting. Rows without an
/// application link simply omit the apply line.
pub fn render_posting(posting: &Posting) -> String {
    let mut message = format!(
        "🆕 **New opening!**\n\
         🏢 **Company:** {}\n\
         💼 **Role:** {}\n\
         📍 **Location:** {}\n",
        posting.company, posting.role, posting.location
    );
    if let Some(link) = &posting.link {
        message.push_str(&format!("🔗 **Apply:** {link}\n"));
    }
    message
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Delay between consecutive posting messages, to stay under the webhook
/// rate limit.
const MESSAGE_PACING: Duration = Duration::from_secs(1);

/// Delivers notifications to a Discord channel webhook.
pub struct DiscordWebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordWebhookNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }

    async fn post(&self, content: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhookNotifier {
    async fn announce(&self, text: &str) -> Result<(), NotifyError> {
        self.post(text).await
    }

    async fn notify(&self, posting: &Posting) -> Result<(), NotifyError> {
        self.post(&render_posting(posting)).await?;
        tokio::time::sleep(MESSAGE_PACING).await;
        Ok(())
    }
}
