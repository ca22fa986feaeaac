use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, error};

use super::error::PredictError;
use super::types::{LandingPrediction, TawhiriResponse};
use crate::config::PredictionConfig;

/// Source of landing forecasts for the notifier.
#[async_trait]
pub trait LandingPredictor: Send + Sync {
    /// Forecast where a sonde at the given position will land. Every failure
    /// is logged and reported as `None`.
    async fn predict_landing(
        &self,
        now: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        descending: bool,
    ) -> Option<LandingPrediction>;
}

/// Landing predictions from a Tawhiri instance (e.g. the SondeHub one).
pub struct TawhiriPredictor {
    client: reqwest::Client,
    api_url: String,
    ascent_rate: f64,
    burst_altitude: f64,
    descent_rate: f64,
}

impl TawhiriPredictor {
    pub fn new(config: &PredictionConfig) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            ascent_rate: config.ascent_rate,
            burst_altitude: config.burst_altitude,
            descent_rate: config.descent_rate,
        })
    }

    /// Query parameters for one request. A descending sonde has already
    /// burst, so the burst altitude is placed just above it to skip the
    /// ascent leg.
    pub fn query(
        &self,
        now: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        descending: bool,
    ) -> Vec<(&'static str, String)> {
        let launch_altitude = altitude.trunc();
        let burst_altitude = if descending {
            launch_altitude + 0.1
        } else {
            self.burst_altitude
        };

        vec![
            ("launch_latitude", latitude.to_string()),
            ("launch_longitude", longitude.to_string()),
            ("launch_altitude", format!("{}", launch_altitude as i64)),
            (
                "launch_datetime",
                now.to_rfc3339_opts(SecondsFormat::Micros, true),
            ),
            ("ascent_rate", self.ascent_rate.to_string()),
            ("burst_altitude", burst_altitude.to_string()),
            ("descent_rate", self.descent_rate.to_string()),
        ]
    }

    async fn request(
        &self,
        query: &[(&'static str, String)],
    ) -> Result<LandingPrediction, PredictError> {
        let response = self.client.get(&self.api_url).query(query).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(PredictError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_landing(&body)
    }
}

#[async_trait]
impl LandingPredictor for TawhiriPredictor {
    async fn predict_landing(
        &self,
        now: DateTime<Utc>,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        descending: bool,
    ) -> Option<LandingPrediction> {
        debug!(
            "Running prediction for {}, {}, {}m {}",
            latitude,
            longitude,
            altitude.trunc(),
            if descending { "descending" } else { "rising" }
        );

        let query = self.query(now, latitude, longitude, altitude, descending);
        match self.request(&query).await {
            Ok(landing) => Some(landing),
            Err(e) => {
                error!("Error while getting prediction from Tawhiri API: {}", e);
                None
            }
        }
    }
}

/// Extract the landing point: the last point of the second (descent) stage.
pub fn parse_landing(body: &str) -> Result<LandingPrediction, PredictError> {
    let response: TawhiriResponse = serde_json::from_str(body)?;
    let landing = response
        .prediction
        .get(1)
        .and_then(|stage| stage.trajectory.last())
        .ok_or(PredictError::MissingTrajectory)?;

    let landing_time = DateTime::parse_from_rfc3339(&landing.datetime)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| PredictError::Timestamp(landing.datetime.clone()))?;

    Ok(LandingPrediction {
        latitude: landing.latitude,
        longitude: normalize_longitude(landing.longitude),
        altitude: landing.altitude,
        landing_time,
    })
}

/// Tawhiri reports longitudes in 0..360.
fn normalize_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}
