use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("at least one range ring must be configured")]
    NoRangeRings,
    #[error("range ring '{0}' has an invalid radius or altitude")]
    InvalidThreshold(String),
}
