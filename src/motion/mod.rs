//! Inertial motion classification.
//!
//! Turns raw six-axis IMU samples into a debounced "the mower is moving"
//! signal. The classifier is a deliberately simple magnitude-of-deviation
//! detector:
//!
//! 1. [`MotionClassifier::calibrate`] averages samples taken at rest into a
//!    [`MotionBaseline`].
//! 2. Each [`MotionClassifier::detect_motion`] call measures the Euclidean
//!    distance of a fresh sample from that baseline, separately for the
//!    accelerometer and the gyroscope.
//! 3. Samples above either threshold are pulses; [`debounce::PulseWindow`]
//!    only declares motion once enough well-spaced pulses land inside one
//!    window, and only clears it after a quiet stop delay.

pub mod classifier;
pub mod debounce;

use crate::constants::{
    DEFAULT_ACCEL_THRESHOLD, DEFAULT_GYRO_THRESHOLD, DEFAULT_MOTION_PULSE_COUNT,
    DEFAULT_MOTION_STOP_DELAY_MS, DEFAULT_MOTION_WINDOW_MS,
};

pub use classifier::MotionClassifier;
pub use debounce::PulseWindow;

/// A three-axis reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Axes {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Axes {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two readings.
    pub fn distance(&self, other: &Axes) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One raw IMU sample: acceleration in g, angular rate in deg/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionSample {
    pub accel: Axes,
    pub gyro: Axes,
}

impl MotionSample {
    pub const fn new(accel: Axes, gyro: Axes) -> Self {
        Self { accel, gyro }
    }

    /// A sample of a level platform at rest: 1 g on Z, no rotation.
    pub const fn at_rest() -> Self {
        Self {
            accel: Axes::new(0.0, 0.0, 1.0),
            gyro: Axes::new(0.0, 0.0, 0.0),
        }
    }
}

/// Mean sensor reading captured while the platform was at rest.
///
/// Only a calibration run creates one; it stays fixed until the next run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionBaseline {
    pub accel: Axes,
    pub gyro: Axes,
}

impl MotionBaseline {
    /// Accelerometer deviation of `sample` from this baseline.
    pub fn accel_deviation(&self, sample: &MotionSample) -> f32 {
        sample.accel.distance(&self.accel)
    }

    /// Gyroscope deviation of `sample` from this baseline.
    pub fn gyro_deviation(&self, sample: &MotionSample) -> f32 {
        sample.gyro.distance(&self.gyro)
    }
}

/// Tunable thresholds and timings of the classifier.
///
/// Values are not range-checked here. A zero window expires immediately,
/// a zero threshold makes any noise qualify.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// Accelerometer deviation (g) above which a sample qualifies.
    pub accel_threshold: f32,
    /// Gyroscope deviation (deg/s) above which a sample qualifies.
    pub gyro_threshold: f32,
    /// Length of the pulse window.
    pub window_ms: u32,
    /// Pulses needed inside one window to declare motion.
    pub pulse_count: u32,
    /// Quiet time after the last pulse before motion ends.
    pub stop_delay_ms: u32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            accel_threshold: DEFAULT_ACCEL_THRESHOLD,
            gyro_threshold: DEFAULT_GYRO_THRESHOLD,
            window_ms: DEFAULT_MOTION_WINDOW_MS,
            pulse_count: DEFAULT_MOTION_PULSE_COUNT,
            stop_delay_ms: DEFAULT_MOTION_STOP_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_euclidean() {
        let a = Axes::new(0.0, 0.0, 0.0);
        let b = Axes::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_baseline_deviation_per_sensor() {
        let baseline = MotionBaseline {
            accel: Axes::new(0.0, 0.0, 1.0),
            gyro: Axes::new(1.0, 1.0, 1.0),
        };
        let sample = MotionSample::new(Axes::new(0.0, 0.0, 1.0), Axes::new(1.0, 3.0, 1.0));
        assert_eq!(baseline.accel_deviation(&sample), 0.0);
        assert_eq!(baseline.gyro_deviation(&sample), 2.0);
    }
}
