mod error;
mod tawhiri;
mod types;

pub use tawhiri::{LandingPredictor, TawhiriPredictor};
pub use types::LandingPrediction;
