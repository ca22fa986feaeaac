use crate::predict::LandingPrediction;
use crate::tracker::{RangeRing, SondeFrame};

const SONDEHUB_URL: &str = "https://sondehub.org";

/// Text of one alert, shared by every sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Subject line.
    pub title: String,
    /// One-line text for push and chat services.
    pub summary: String,
    /// Multi-line report for email.
    pub body: String,
    pub tracking_url: String,
}

impl Notification {
    pub fn range_ring(frame: &SondeFrame, ring: &RangeRing, distance_m: f64) -> Self {
        let tracking_url = tracking_url(&frame.serial);
        let body = format!(
            "Serial:    {}\n\
             Type:      {}\n\
             Distance:  {:.1}km (threshold: {:.1}km)\n\
             Altitude:  {}m (threshold: {:.0}m)\n\
             Frequency: {:.2} MHz\n\
             Position:  {:.5} {:.5}\n\
             \n\
             Track on SondeHub:\n\
             {}\n",
            frame.serial,
            frame.model,
            distance_m / 1000.0,
            ring.range_m / 1000.0,
            frame.altitude,
            ring.max_altitude_m,
            frame.frequency_mhz,
            frame.latitude,
            frame.longitude,
            tracking_url,
        );

        Self {
            title: format!("{} sonde triggered range ring {}", frame.model, ring.name),
            summary: format!(
                "A {} sonde has triggered range ring {}. (Serial: {})",
                frame.model, ring.name, frame.serial
            ),
            body,
            tracking_url,
        }
    }

    pub fn range_ring_prediction(
        frame: &SondeFrame,
        prediction: &LandingPrediction,
        ring: &RangeRing,
        prediction_distance_m: f64,
        latest_distance_m: f64,
    ) -> Self {
        let tracking_url = tracking_url(&frame.serial);
        let body = format!(
            "Serial:    {}\n\
             Type:      {}\n\
             Frequency: {:.2} MHz\n\
             \n\
             Predicted data\n\
             Landing Time:      {}\n\
             Landing Distance:  {:.1}km (threshold: {:.1}km)\n\
             Landing Altitude:  {:.0}m (threshold: {:.0}m)\n\
             Landing Position:  {:.5} {:.5}\n\
             \n\
             Current data\n\
             Distance:  {:.1}km\n\
             Altitude:  {}m\n\
             Position:  {:.5} {:.5}\n\
             \n\
             Track on SondeHub:\n\
             {}\n",
            frame.serial,
            frame.model,
            frame.frequency_mhz,
            prediction.landing_time.format("%Y-%m-%d %H:%M:%SZ"),
            prediction_distance_m / 1000.0,
            ring.range_m / 1000.0,
            prediction.altitude,
            ring.max_altitude_m,
            prediction.latitude,
            prediction.longitude,
            latest_distance_m / 1000.0,
            frame.altitude,
            frame.latitude,
            frame.longitude,
            tracking_url,
        );

        Self {
            title: format!(
                "{} sonde landing prediction triggered range ring {}",
                frame.model, ring.name
            ),
            summary: format!(
                "A landing prediction for a {} sonde has triggered range ring {}. (Serial: {})",
                frame.model, ring.name, frame.serial
            ),
            body,
            tracking_url,
        }
    }
}

fn tracking_url(serial: &str) -> String {
    format!("{}/{}", SONDEHUB_URL, serial)
}
