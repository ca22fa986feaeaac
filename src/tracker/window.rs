use std::collections::VecDeque;

pub const WINDOW_CAPACITY: usize = 5;
/// Fewer samples than this never count as a descent.
pub const MIN_TREND_SAMPLES: usize = 3;

/// Bounded FIFO of the most recent altitude samples of one sonde.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AltitudeWindow {
    samples: VecDeque<i64>,
}

impl AltitudeWindow {
    pub fn push(&mut self, altitude: i64) {
        if self.samples.len() == WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(altitude);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Samples in arrival order, oldest first.
    pub fn samples(&self) -> Vec<i64> {
        self.samples.iter().copied().collect()
    }

    pub fn is_descending(&self) -> bool {
        is_descending(&self.samples())
    }
}

/// A window is descending when it holds at least three samples and every
/// sample is strictly lower than the one before it.
pub fn is_descending(window: &[i64]) -> bool {
    window.len() >= MIN_TREND_SAMPLES && window.windows(2).all(|pair| pair[0] > pair[1])
}
