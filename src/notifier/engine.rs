use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info};

use crate::config::{Config, ConfigError};
use crate::notify::NotificationSink;
use crate::predict::{LandingPrediction, LandingPredictor};
use crate::tracker::{
    RangeRing, RingPrefix, RingRegistry, SondeFrame, Station, Tracker, TriggeredRing,
    MIN_TREND_SAMPLES,
};

/// Timing and prediction knobs of the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub check_interval: Duration,
    pub max_sonde_age: Duration,
    pub prediction_enabled: bool,
    pub only_predict_descending: bool,
    pub prediction_cycles: u32,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let to_chrono = |name: &str, value: std::time::Duration| {
            Duration::from_std(value)
                .map_err(|_| ConfigError::Invalid(format!("{} is out of range", name)))
        };

        Ok(Self {
            check_interval: to_chrono("notifier.check_interval", config.notifier.check_interval)?,
            max_sonde_age: to_chrono("notifier.max_sonde_age", config.notifier.max_sonde_age)?,
            prediction_enabled: config.prediction.enabled,
            only_predict_descending: config.prediction.only_predict_descending,
            prediction_cycles: config.prediction.cycles.max(1),
        })
    }
}

/// Tracks sondes and decides when range rings fire.
///
/// The engine is the only owner of the tracking state. Frames and ticks are
/// fed to it one at a time by the runner, so a tick never sees a sonde that
/// is half ingested or half purged.
pub struct NotifierEngine {
    station: Station,
    registry: RingRegistry,
    settings: EngineSettings,
    tracker: Tracker,
    predictor: Box<dyn LandingPredictor>,
    sinks: Vec<Box<dyn NotificationSink>>,
    prediction_counter: u32,
}

impl NotifierEngine {
    pub fn new(
        station: Station,
        registry: RingRegistry,
        settings: EngineSettings,
        predictor: Box<dyn LandingPredictor>,
        sinks: Vec<Box<dyn NotificationSink>>,
    ) -> Self {
        Self {
            station,
            registry,
            settings,
            tracker: Tracker::new(),
            predictor,
            sinks,
            prediction_counter: 0,
        }
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn ingest(&mut self, frame: SondeFrame) {
        let serial = frame.serial.clone();
        let model = frame.model.clone();
        if self.tracker.ingest(frame) {
            info!("Tracking new {} sonde {}", model, serial);
        }
    }

    /// Narrowest unfired ring that `serial` satisfies under `prefix`.
    pub fn check_rings(
        &self,
        serial: &str,
        distance_m: f64,
        altitude_m: f64,
        descending: bool,
        prefix: RingPrefix,
    ) -> Option<TriggeredRing> {
        let sonde = self.tracker.get(serial)?;
        self.registry
            .check_rings(&sonde.notified, distance_m, altitude_m, descending, prefix)
    }

    pub fn mark_notified(&mut self, serial: &str, ring: &RangeRing, prefix: RingPrefix) {
        if let Some(sonde) = self.tracker.get_mut(serial) {
            self.registry.mark_notified(&mut sonde.notified, ring, prefix);
        }
    }

    /// One evaluation pass: purge, live checks, then predictions.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        for serial in self.tracker.purge(now, self.settings.max_sonde_age) {
            info!("Stopped tracking sonde {}", serial);
        }

        if self.tracker.is_empty() {
            debug!("Checking notifications, no sondes tracked");
        } else {
            debug!("Checking notifications for {} sondes", self.tracker.len());
        }

        for serial in self.tracker.serials() {
            self.check_live(&serial).await;
        }

        if !self.prediction_due() {
            return;
        }
        for serial in self.tracker.serials() {
            self.check_prediction(&serial, now).await;
        }
    }

    /// Advance the cycle counter. Predictions run on every n-th tick.
    fn prediction_due(&mut self) -> bool {
        if !self.settings.prediction_enabled {
            return false;
        }
        self.prediction_counter += 1;
        if self.prediction_counter >= self.settings.prediction_cycles {
            self.prediction_counter = 0;
            true
        } else {
            false
        }
    }

    async fn check_live(&mut self, serial: &str) {
        let Some(sonde) = self.tracker.get(serial) else {
            return;
        };
        let frame = sonde.latest_frame.clone();
        let descending = sonde.altitudes.is_descending();
        let distance = frame.distance_from(&self.station);

        let Some(triggered) = self.check_rings(
            serial,
            distance,
            frame.altitude as f64,
            descending,
            RingPrefix::Live,
        ) else {
            return;
        };

        info!(
            "Sonde {} triggered {} ({}) at {:.0}m",
            serial,
            triggered.label(),
            triggered.ring.name,
            distance
        );
        self.dispatch_live(&frame, &triggered.ring, distance).await;
        self.mark_notified(serial, &triggered.ring, RingPrefix::Live);
    }

    async fn check_prediction(&mut self, serial: &str, now: DateTime<Utc>) {
        let Some(sonde) = self.tracker.get(serial) else {
            return;
        };

        if sonde.altitudes.len() < MIN_TREND_SAMPLES {
            debug!(
                "Skipping prediction for sonde {} because not enough frames have been received",
                serial
            );
            return;
        }
        if sonde.latest_frame.age(now) > self.settings.check_interval {
            debug!(
                "Skipping prediction for sonde {} as last receive was too long ago",
                serial
            );
            return;
        }
        let descending = sonde.altitudes.is_descending();
        if self.settings.only_predict_descending && !descending {
            debug!("Skipping prediction for sonde {} as it is not descending", serial);
            return;
        }

        let frame = sonde.latest_frame.clone();
        let Some(prediction) = self
            .predictor
            .predict_landing(
                now,
                frame.latitude,
                frame.longitude,
                frame.altitude as f64,
                descending,
            )
            .await
        else {
            return;
        };

        let prediction_distance = prediction.distance_from(&self.station);
        let Some(triggered) = self.check_rings(
            serial,
            prediction_distance,
            prediction.altitude,
            descending,
            RingPrefix::Prediction,
        ) else {
            return;
        };

        info!(
            "Landing prediction for sonde {} triggered {} ({}) at {:.0}m",
            serial,
            triggered.label(),
            triggered.ring.name,
            prediction_distance
        );
        let latest_distance = frame.distance_from(&self.station);
        self.dispatch_prediction(
            &frame,
            &prediction,
            &triggered.ring,
            prediction_distance,
            latest_distance,
        )
        .await;
        self.mark_notified(serial, &triggered.ring, RingPrefix::Prediction);
    }

    async fn dispatch_live(&self, frame: &SondeFrame, ring: &RangeRing, distance_m: f64) {
        for sink in &self.sinks {
            match sink.notify_range_ring(frame, ring, distance_m).await {
                Ok(()) => info!("Sent {} notification for sonde {}", sink.name(), frame.serial),
                Err(e) => error!(
                    "Failed to send {} notification for sonde {}: {}",
                    sink.name(),
                    frame.serial,
                    e
                ),
            }
        }
    }

    async fn dispatch_prediction(
        &self,
        frame: &SondeFrame,
        prediction: &LandingPrediction,
        ring: &RangeRing,
        prediction_distance_m: f64,
        latest_distance_m: f64,
    ) {
        for sink in &self.sinks {
            match sink
                .notify_range_ring_prediction(
                    frame,
                    prediction,
                    ring,
                    prediction_distance_m,
                    latest_distance_m,
                )
                .await
            {
                Ok(()) => info!(
                    "Sent {} prediction notification for sonde {}",
                    sink.name(),
                    frame.serial
                ),
                Err(e) => error!(
                    "Failed to send {} prediction notification for sonde {}: {}",
                    sink.name(),
                    frame.serial,
                    e
                ),
            }
        }
    }
}
