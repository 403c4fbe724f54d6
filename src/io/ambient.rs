//! Night detection from a lux reading.

use super::AmbientLight;
use crate::constants::DEFAULT_LUX_THRESHOLD;

/// Last lux reading compared against a night threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct LuxThreshold {
    threshold: f32,
    last_lux: f32,
    night: bool,
}

impl LuxThreshold {
    /// Start out in daylight with no reading yet.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_lux: 0.0,
            night: false,
        }
    }

    /// Apply a new reading. `None` is a failed read and keeps the previous state.
    pub fn update(&mut self, reading: Option<f32>) {
        let Some(lux) = reading else {
            log_debug!("Lux reading unavailable, keeping previous state");
            return;
        };
        if !lux.is_finite() || lux < 0.0 {
            log_debug!("Discarding invalid lux reading {lux}");
            return;
        }
        self.last_lux = lux;
        self.night = lux < self.threshold;
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Change the threshold; the night flag follows on the next reading.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }
}

impl Default for LuxThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_LUX_THRESHOLD)
    }
}

impl AmbientLight for LuxThreshold {
    fn is_night(&self) -> bool {
        self.night
    }

    fn last_lux(&self) -> f32 {
        self.last_lux
    }
}
