use async_trait::async_trait;
use serde::Serialize;

use super::{check_status, Notification, NotificationSink, NotifyError};
use crate::config::GotifyConfig;

#[derive(Debug, Serialize)]
struct GotifyMessage<'a> {
    title: &'a str,
    message: &'a str,
    priority: u8,
}

/// Pushes to a Gotify server application.
pub struct GotifySink {
    client: reqwest::Client,
    config: GotifyConfig,
}

impl GotifySink {
    pub fn new(client: reqwest::Client, config: GotifyConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, notification: &Notification) -> reqwest::RequestBuilder {
        let url = format!("{}/message", self.config.url.trim_end_matches('/'));
        self.client
            .post(url)
            .query(&[("token", self.config.app_token.as_str())])
            .json(&GotifyMessage {
                title: &notification.title,
                message: &notification.summary,
                priority: self.config.priority,
            })
    }
}

#[async_trait]
impl NotificationSink for GotifySink {
    fn name(&self) -> &str {
        "gotify"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.request(notification).send().await?;
        check_status(response).await
    }
}
