use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API returned status code {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response has no descent trajectory")]
    MissingTrajectory,
    #[error("invalid landing time '{0}'")]
    Timestamp(String),
}
