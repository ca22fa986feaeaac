use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::tracker::{RangeRing, RingRegistry, Station, TrackerError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("range rings: {0}")]
    Rings(#[from] TrackerError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub station: StationConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    pub range_rings: Vec<RangeRingConfig>,
    pub ntfy: Option<NtfyConfig>,
    pub gotify: Option<GotifyConfig>,
    pub discord_webhook: Option<DiscordWebhookConfig>,
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StationConfig {
    pub name: Option<String>,
    pub coordinates: String,
}

/// Where the AutoRX payload summaries arrive.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    #[serde(default = "default_listener_host")]
    pub host: String,
    #[serde(default = "default_listener_port")]
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_listener_host(),
            port: default_listener_port(),
        }
    }
}

fn default_listener_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listener_port() -> u16 {
    55673
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    #[serde(
        default = "default_check_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub check_interval: Duration,
    #[serde(
        default = "default_max_sonde_age",
        deserialize_with = "deserialize_duration"
    )]
    pub max_sonde_age: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
            max_sonde_age: default_max_sonde_age(),
        }
    }
}

fn default_check_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_max_sonde_age() -> Duration {
    Duration::from_secs(5 * 60 * 60)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PredictionConfig {
    pub enabled: bool,
    pub api_url: String,
    /// m/s
    pub ascent_rate: f64,
    /// m
    pub burst_altitude: f64,
    /// m/s at sea level
    pub descent_rate: f64,
    pub only_predict_descending: bool,
    /// Predict on every n-th check.
    pub cycles: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.v2.sondehub.org/tawhiri".to_string(),
            ascent_rate: 5.0,
            burst_altitude: 33000.0,
            descent_rate: 5.0,
            only_predict_descending: false,
            cycles: 1,
            timeout: Duration::from_secs(3),
        }
    }
}

/// One range ring as written in the config file, in kilometers.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeRingConfig {
    pub name: String,
    pub radius: f64,
    pub max_altitude: f64,
    #[serde(default)]
    pub only_descending: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NtfyConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub topic_url: String,
    #[serde(default)]
    pub auth_user: String,
    #[serde(default)]
    pub auth_password: String,
    #[serde(default)]
    pub auth_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GotifyConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub url: String,
    pub app_token: String,
    #[serde(default = "default_gotify_priority")]
    pub priority: u8,
}

fn default_gotify_priority() -> u8 {
    5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscordWebhookConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub mentions: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SmtpSecurity {
    /// Plaintext
    None,
    /// Implicit TLS
    Ssl,
    /// STARTTLS
    Tls,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    #[serde(default)]
    pub smtp_login: String,
    #[serde(default)]
    pub smtp_password: String,
    pub sender: String,
    pub destinations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub debug: bool,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            timestamps: true,
        }
    }
}

fn enabled() -> bool {
    true
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.station()?;
        self.range_ring_registry()?;

        if self.notifier.check_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "notifier.check_interval must be greater than zero".into(),
            ));
        }
        if self.prediction.cycles == 0 {
            return Err(ConfigError::Invalid(
                "prediction.cycles must be at least 1".into(),
            ));
        }
        if let Some(email) = self.email.as_ref().filter(|e| e.enabled) {
            if email.destinations.is_empty() {
                return Err(ConfigError::Invalid(
                    "email.destinations must not be empty".into(),
                ));
            }
            for address in std::iter::once(&email.sender).chain(&email.destinations) {
                address.parse::<lettre::message::Mailbox>().map_err(|e| {
                    ConfigError::Invalid(format!("invalid email address '{}': {}", address, e))
                })?;
            }
        }
        Ok(())
    }

    pub fn station(&self) -> Result<Station, ConfigError> {
        Station::from_coordinates(&self.station.coordinates).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "station.coordinates '{}' is not a 'lat, lon' pair",
                self.station.coordinates
            ))
        })
    }

    /// Range rings converted to meters, sorted by radius.
    pub fn range_ring_registry(&self) -> Result<RingRegistry, ConfigError> {
        let rings = self
            .range_rings
            .iter()
            .map(|ring| RangeRing {
                id: 0,
                name: ring.name.clone(),
                range_m: ring.radius * 1000.0,
                max_altitude_m: ring.max_altitude * 1000.0,
                only_descending: ring.only_descending,
            })
            .collect();
        Ok(RingRegistry::new(rings)?)
    }

    /// Names of the enabled notification services, in dispatch order.
    pub fn enabled_sinks(&self) -> Vec<&'static str> {
        let mut sinks = Vec::new();
        if self.ntfy.as_ref().is_some_and(|c| c.enabled) {
            sinks.push("ntfy");
        }
        if self.gotify.as_ref().is_some_and(|c| c.enabled) {
            sinks.push("gotify");
        }
        if self.discord_webhook.as_ref().is_some_and(|c| c.enabled) {
            sinks.push("discord_webhook");
        }
        if self.email.as_ref().is_some_and(|c| c.enabled) {
            sinks.push("email");
        }
        sinks
    }
}
