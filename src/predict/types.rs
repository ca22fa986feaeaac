use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::Station;

/// Forecast landing point of a sonde.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingPrediction {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub landing_time: DateTime<Utc>,
}

impl LandingPrediction {
    pub fn distance_from(&self, station: &Station) -> f64 {
        station.distance_m(self.latitude, self.longitude)
    }
}

/// Response body of the Tawhiri prediction API.
#[derive(Debug, Deserialize)]
pub(crate) struct TawhiriResponse {
    pub prediction: Vec<TawhiriStage>,
}

/// One flight phase (ascent, descent, ...) of a prediction.
#[derive(Debug, Deserialize)]
pub(crate) struct TawhiriStage {
    pub trajectory: Vec<TawhiriPoint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TawhiriPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub datetime: String,
}
