use chrono::{DateTime, Utc};
use serde::Serialize;

use super::station::Station;

/// One telemetry observation of a sonde.
///
/// `received_at` is stamped by the listener when the datagram arrives; the
/// decoder's own frame time lacks a date and is not trusted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SondeFrame {
    pub serial: String,
    pub frame_number: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i64,
    pub model: String,
    pub frequency_mhz: f64,
    pub received_at: DateTime<Utc>,
}

impl SondeFrame {
    /// Geodesic distance in meters from `station` to this frame's position.
    pub fn distance_from(&self, station: &Station) -> f64 {
        station.distance_m(self.latitude, self.longitude)
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.received_at
    }
}
