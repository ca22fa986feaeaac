mod error;
mod frame;
mod rings;
mod station;
mod tracker;
mod window;

pub use error::TrackerError;
pub use frame::SondeFrame;
pub use rings::{RangeRing, RingPrefix, RingRegistry, TriggeredRing};
pub use station::Station;
pub use tracker::Tracker;
pub use window::MIN_TREND_SAMPLES;
