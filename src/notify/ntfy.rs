use async_trait::async_trait;

use super::{check_status, Notification, NotificationSink, NotifyError};
use crate::config::NtfyConfig;

/// Publishes to an ntfy topic.
pub struct NtfySink {
    client: reqwest::Client,
    config: NtfyConfig,
}

impl NtfySink {
    pub fn new(client: reqwest::Client, config: NtfyConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, notification: &Notification) -> reqwest::RequestBuilder {
        let config = &self.config;
        let mut request = self
            .client
            .post(&config.topic_url)
            .header("Title", notification.title.as_str())
            .header("Click", notification.tracking_url.as_str())
            .body(notification.summary.clone());

        if !config.auth_token.is_empty() {
            request = request.bearer_auth(&config.auth_token);
        } else if !config.auth_user.is_empty() || !config.auth_password.is_empty() {
            request = request.basic_auth(&config.auth_user, Some(&config.auth_password));
        }
        request
    }
}

#[async_trait]
impl NotificationSink for NtfySink {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.request(notification).send().await?;
        check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            title: "RS41 sonde triggered range ring Near".into(),
            summary: "A RS41 sonde has triggered range ring Near. (Serial: V1)".into(),
            body: String::new(),
            tracking_url: "https://sondehub.org/V1".into(),
        }
    }

    fn sink(user: &str, password: &str, token: &str) -> NtfySink {
        NtfySink::new(
            reqwest::Client::new(),
            NtfyConfig {
                enabled: true,
                topic_url: "https://ntfy.example.org/sondes".into(),
                auth_user: user.into(),
                auth_password: password.into(),
                auth_token: token.into(),
            },
        )
    }

    #[test]
    fn posts_summary_with_title() {
        let request = sink("", "", "").request(&notification()).build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "https://ntfy.example.org/sondes");
        assert_eq!(
            request.headers()["Title"],
            "RS41 sonde triggered range ring Near"
        );
        assert_eq!(request.headers()["Click"], "https://sondehub.org/V1");
        assert!(request.headers().get("Authorization").is_none());
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()).unwrap(),
            notification().summary.as_bytes()
        );
    }

    #[test]
    fn token_takes_precedence_over_basic_auth() {
        let request = sink("user", "pass", "tk_123")
            .request(&notification())
            .build()
            .unwrap();
        assert_eq!(request.headers()["Authorization"], "Bearer tk_123");
    }

    #[test]
    fn basic_auth_from_user_and_password() {
        let request = sink("user", "pass", "")
            .request(&notification())
            .build()
            .unwrap();
        // base64("user:pass")
        assert_eq!(request.headers()["Authorization"], "Basic dXNlcjpwYXNz");
    }
}
