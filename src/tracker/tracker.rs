use chrono::{DateTime, Duration, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::frame::SondeFrame;
use super::rings::NotifiedRings;
use super::window::AltitudeWindow;

/// Everything known about one sonde. Purging drops the whole struct, so the
/// latest frame, altitude window and notified rings always go together.
#[derive(Debug, Clone)]
pub struct TrackedSonde {
    pub latest_frame: SondeFrame,
    pub altitudes: AltitudeWindow,
    pub notified: NotifiedRings,
}

impl TrackedSonde {
    fn new(frame: SondeFrame) -> Self {
        let mut altitudes = AltitudeWindow::default();
        altitudes.push(frame.altitude);
        Self {
            latest_frame: frame,
            altitudes,
            notified: NotifiedRings::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Tracker {
    sondes: HashMap<String, TrackedSonde>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame` as the latest for its serial and append its altitude to
    /// the trend window. Returns `true` the first time a serial is seen.
    pub fn ingest(&mut self, frame: SondeFrame) -> bool {
        match self.sondes.entry(frame.serial.clone()) {
            Entry::Occupied(mut entry) => {
                let sonde = entry.get_mut();
                sonde.altitudes.push(frame.altitude);
                sonde.latest_frame = frame;
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(TrackedSonde::new(frame));
                true
            }
        }
    }

    /// Remove every sonde whose latest frame is at least `max_age` old and
    /// return the removed serials.
    pub fn purge(&mut self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .sondes
            .iter()
            .filter(|(_, sonde)| sonde.latest_frame.age(now) >= max_age)
            .map(|(serial, _)| serial.clone())
            .collect();

        for serial in &stale {
            self.sondes.remove(serial);
        }

        stale
    }

    pub fn get(&self, serial: &str) -> Option<&TrackedSonde> {
        self.sondes.get(serial)
    }

    pub fn get_mut(&mut self, serial: &str) -> Option<&mut TrackedSonde> {
        self.sondes.get_mut(serial)
    }

    /// Tracked serials in a stable order.
    pub fn serials(&self) -> Vec<String> {
        let mut serials: Vec<String> = self.sondes.keys().cloned().collect();
        serials.sort();
        serials
    }

    pub fn len(&self) -> usize {
        self.sondes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sondes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::RingPrefix;

    fn frame(serial: &str, altitude: i64, received_at: DateTime<Utc>) -> SondeFrame {
        SondeFrame {
            serial: serial.to_string(),
            frame_number: 1,
            latitude: 48.0,
            longitude: 11.0,
            altitude,
            model: "RS41".to_string(),
            frequency_mhz: 403.0,
            received_at,
        }
    }

    #[test]
    fn ingest_reports_new_serials_once() {
        let now = Utc::now();
        let mut tracker = Tracker::new();
        assert!(tracker.ingest(frame("S1", 1000, now)));
        assert!(!tracker.ingest(frame("S1", 1100, now)));
        assert!(tracker.ingest(frame("S2", 1000, now)));
        assert_eq!(tracker.serials(), ["S1", "S2"]);
    }

    #[test]
    fn latest_frame_wins_and_window_is_bounded() {
        let now = Utc::now();
        let mut tracker = Tracker::new();
        for (i, altitude) in [1000, 2000, 3000, 4000, 5000, 6000, 7000].into_iter().enumerate() {
            let mut f = frame("S1", altitude, now);
            f.frame_number = i as u64;
            tracker.ingest(f);
        }

        let sonde = tracker.get("S1").unwrap();
        assert_eq!(sonde.latest_frame.frame_number, 6);
        assert_eq!(sonde.latest_frame.altitude, 7000);
        assert_eq!(sonde.altitudes.samples(), vec![3000, 4000, 5000, 6000, 7000]);
    }

    #[test]
    fn purge_drops_whole_sonde_at_max_age() {
        let now = Utc::now();
        let max_age = Duration::hours(5);
        let mut tracker = Tracker::new();
        tracker.ingest(frame("OLD", 1000, now - Duration::minutes(301)));
        tracker.ingest(frame("EDGE", 1000, now - Duration::hours(5)));
        tracker.ingest(frame("FRESH", 1000, now - Duration::minutes(299)));
        tracker
            .get_mut("OLD")
            .unwrap()
            .notified
            .insert(RingPrefix::Live, 0);

        let mut removed = tracker.purge(now, max_age);
        removed.sort();
        assert_eq!(removed, ["EDGE", "OLD"]);
        assert_eq!(tracker.serials(), ["FRESH"]);

        // a returning serial starts from scratch
        assert!(tracker.ingest(frame("OLD", 900, now)));
        let sonde = tracker.get("OLD").unwrap();
        assert_eq!(sonde.notified, NotifiedRings::default());
        assert_eq!(sonde.altitudes.samples(), vec![900]);
    }
}
