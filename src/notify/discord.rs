use async_trait::async_trait;
use serde::Serialize;

use super::{check_status, Notification, NotificationSink, NotifyError};
use crate::config::DiscordWebhookConfig;

#[derive(Debug, Serialize)]
struct WebhookMessage {
    content: String,
}

pub struct DiscordWebhookSink {
    client: reqwest::Client,
    config: DiscordWebhookConfig,
}

impl DiscordWebhookSink {
    pub fn new(client: reqwest::Client, config: DiscordWebhookConfig) -> Self {
        Self { client, config }
    }

    fn content(&self, notification: &Notification) -> String {
        if self.config.mentions.is_empty() {
            notification.summary.clone()
        } else {
            format!("{}\n{}", notification.summary, self.config.mentions)
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordWebhookSink {
    fn name(&self) -> &str {
        "discord_webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&WebhookMessage {
                content: self.content(notification),
            })
            .send()
            .await?;
        check_status(response).await
    }
}
