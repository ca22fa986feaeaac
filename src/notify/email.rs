use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tokio::time::timeout;

use super::{Notification, NotificationSink, NotifyError};
use crate::config::{EmailConfig, SmtpSecurity};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends one plain-text mail per destination.
pub struct EmailSink {
    config: EmailConfig,
    sender: Mailbox,
    destinations: Vec<Mailbox>,
}

impl EmailSink {
    pub fn new(config: EmailConfig) -> Result<Self, NotifyError> {
        let sender = config.sender.parse::<Mailbox>()?;
        let destinations = config
            .destinations
            .iter()
            .map(|d| d.parse::<Mailbox>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            sender,
            destinations,
        })
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let config = &self.config;
        log::debug!(
            "Connecting to SMTP server {}:{} ({})",
            config.smtp_host,
            config.smtp_port,
            config.security
        );
        let builder = match config.security {
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.as_str())
            }
            SmtpSecurity::Ssl => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            SmtpSecurity::Tls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
        };

        let mut builder = builder.port(config.smtp_port).timeout(Some(SMTP_TIMEOUT));
        if !config.smtp_login.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_login.clone(),
                config.smtp_password.clone(),
            ));
        }
        Ok(builder.build())
    }

    fn message(&self, to: &Mailbox, notification: &Notification) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(self.sender.clone())
            .to(to.clone())
            .subject(notification.title.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?)
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mailer = self.transport()?;

        for destination in &self.destinations {
            log::debug!("Sending mail to {}", destination);
            let message = self.message(destination, notification)?;
            let response = timeout(SMTP_TIMEOUT, mailer.send(message)).await??;
            if !response.is_positive() {
                return Err(NotifyError::Rejected(format!("{:?}", response)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(destinations: &[&str]) -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_host: "mail.example.org".into(),
            smtp_port: 587,
            security: SmtpSecurity::Tls,
            smtp_login: "notifier".into(),
            smtp_password: "secret".into(),
            sender: "Sonde Notifier <notifier@example.org>".into(),
            destinations: destinations.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn builds_plain_text_message() {
        let sink = EmailSink::new(config(&["a@example.org", "b@example.org"])).unwrap();
        assert_eq!(sink.destinations.len(), 2);

        let notification = Notification {
            title: "RS41 sonde triggered range ring Near".into(),
            summary: String::new(),
            body: "Serial:    V1\n".into(),
            tracking_url: String::new(),
        };
        let message = sink.message(&sink.destinations[0], &notification).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: RS41 sonde triggered range ring Near"));
        assert!(raw.contains("To: a@example.org"));
        assert!(raw.contains("Serial:    V1"));
    }

    #[test]
    fn rejects_bad_destination() {
        assert!(matches!(
            EmailSink::new(config(&["nope"])),
            Err(NotifyError::Address(_))
        ));
    }
}
