mod discord;
mod email;
mod error;
mod gotify;
mod message;
mod ntfy;

use async_trait::async_trait;
use std::time::Duration;

pub use discord::DiscordWebhookSink;
pub use email::EmailSink;
pub use error::NotifyError;
pub use gotify::GotifySink;
pub use message::Notification;
pub use ntfy::NtfySink;

use crate::config::Config;
use crate::predict::LandingPrediction;
use crate::tracker::{RangeRing, SondeFrame};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A notification service.
///
/// Implementors only need `send`; the range ring methods format the shared
/// message text and hand it over.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    async fn notify_range_ring(
        &self,
        frame: &SondeFrame,
        ring: &RangeRing,
        distance_m: f64,
    ) -> Result<(), NotifyError> {
        self.send(&Notification::range_ring(frame, ring, distance_m))
            .await
    }

    async fn notify_range_ring_prediction(
        &self,
        frame: &SondeFrame,
        prediction: &LandingPrediction,
        ring: &RangeRing,
        prediction_distance_m: f64,
        latest_distance_m: f64,
    ) -> Result<(), NotifyError> {
        self.send(&Notification::range_ring_prediction(
            frame,
            prediction,
            ring,
            prediction_distance_m,
            latest_distance_m,
        ))
        .await
    }
}

/// Map a non-2xx response to `NotifyError::Status`.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Enabled sinks in dispatch order: ntfy, gotify, Discord, email.
pub fn build_sinks(config: &Config) -> Result<Vec<Box<dyn NotificationSink>>, NotifyError> {
    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let mut sinks: Vec<Box<dyn NotificationSink>> = Vec::new();

    if let Some(ntfy) = config.ntfy.as_ref().filter(|c| c.enabled) {
        sinks.push(Box::new(NtfySink::new(client.clone(), ntfy.clone())));
    }
    if let Some(gotify) = config.gotify.as_ref().filter(|c| c.enabled) {
        sinks.push(Box::new(GotifySink::new(client.clone(), gotify.clone())));
    }
    if let Some(discord) = config.discord_webhook.as_ref().filter(|c| c.enabled) {
        sinks.push(Box::new(DiscordWebhookSink::new(
            client.clone(),
            discord.clone(),
        )));
    }
    if let Some(email) = config.email.as_ref().filter(|c| c.enabled) {
        sinks.push(Box::new(EmailSink::new(email.clone())?));
    }

    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinks_follow_config_order() {
        let yaml = r#"
station:
  coordinates: "48.137, 11.575"
range_rings:
  - name: near
    radius: 5
    max_altitude: 1
email:
  smtp_host: mail.example.org
  smtp_port: 465
  security: ssl
  sender: notifier@example.org
  destinations: [me@example.org]
discord_webhook:
  url: https://discord.com/api/webhooks/1/x
gotify:
  enabled: false
  url: https://gotify.example.org
  app_token: abc
ntfy:
  topic_url: https://ntfy.sh/sondes
"#;
        let config = Config::from_str(yaml).unwrap();
        let sinks = build_sinks(&config).unwrap();
        let names: Vec<&str> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["ntfy", "discord_webhook", "email"]);
        assert_eq!(names, config.enabled_sinks());
    }
}
