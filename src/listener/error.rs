use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid packet: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid frequency '{0}'")]
    InvalidFrequency(String),
    #[error("position {latitude}, {longitude} is out of range")]
    InvalidPosition { latitude: f64, longitude: f64 },
    #[error("listener is already running")]
    AlreadyRunning,
}
