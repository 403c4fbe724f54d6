use anyhow::{Result, bail};

use super::{Axes, MotionBaseline, MotionSample, MotionSettings, PulseWindow};
use crate::constants::{CALIBRATION_SAMPLE_DELAY_MS, CALIBRATION_SETTLE_MS};
use crate::io::ImuSource;
use crate::time_source::Clock;

/// Debounced motion detector over an injected IMU and clock.
pub struct MotionClassifier {
    imu: Box<dyn ImuSource>,
    clock: Box<dyn Clock>,
    settings: MotionSettings,
    baseline: Option<MotionBaseline>,
    pulses: PulseWindow,
    last_sample: MotionSample,
    max_accel_deviation: f32,
    max_gyro_deviation: f32,
}

impl MotionClassifier {
    pub fn new(imu: Box<dyn ImuSource>, clock: Box<dyn Clock>, settings: MotionSettings) -> Self {
        Self {
            imu,
            clock,
            settings,
            baseline: None,
            pulses: PulseWindow::new(),
            last_sample: MotionSample::default(),
            max_accel_deviation: 0.0,
            max_gyro_deviation: 0.0,
        }
    }

    /// Average `samples` readings taken at rest into a new baseline.
    ///
    /// Each read is followed by a short pause. Resets pulse counting and the
    /// running maxima. A count of zero is rejected and leaves the previous
    /// calibration in place.
    pub fn calibrate(&mut self, samples: u32) -> Result<MotionBaseline> {
        if samples == 0 {
            bail!("Calibration needs at least one sample");
        }

        // f64 sums keep constant input exact.
        let mut accel = [0.0f64; 3];
        let mut gyro = [0.0f64; 3];
        for _ in 0..samples {
            let sample = self.imu.read();
            accel[0] += f64::from(sample.accel.x);
            accel[1] += f64::from(sample.accel.y);
            accel[2] += f64::from(sample.accel.z);
            gyro[0] += f64::from(sample.gyro.x);
            gyro[1] += f64::from(sample.gyro.y);
            gyro[2] += f64::from(sample.gyro.z);
            self.clock.sleep_ms(CALIBRATION_SAMPLE_DELAY_MS);
        }

        let n = f64::from(samples);
        let mean = |sums: [f64; 3]| {
            Axes::new(
                (sums[0] / n) as f32,
                (sums[1] / n) as f32,
                (sums[2] / n) as f32,
            )
        };
        let baseline = MotionBaseline {
            accel: mean(accel),
            gyro: mean(gyro),
        };

        self.baseline = Some(baseline);
        self.pulses.reset_pulses();
        self.reset_statistics();

        log_block_start!("Motion baseline calibrated from {samples} samples");
        log_indented!(
            "Accel (g): x={:.4} y={:.4} z={:.4}",
            baseline.accel.x,
            baseline.accel.y,
            baseline.accel.z
        );
        log_indented!(
            "Gyro (deg/s): x={:.4} y={:.4} z={:.4}",
            baseline.gyro.x,
            baseline.gyro.y,
            baseline.gyro.z
        );

        Ok(baseline)
    }

    /// Wait for the platform to settle after boot, then calibrate.
    pub fn settle_and_calibrate(&mut self, samples: u32) -> Result<MotionBaseline> {
        log_decorated!("Keep the mower still, calibrating motion sensor...");
        self.clock.sleep_ms(CALIBRATION_SETTLE_MS);
        self.calibrate(samples)
    }

    /// Read one sample and return the debounced moving state.
    ///
    /// Always `false` before calibration, without touching the sensor.
    pub fn detect_motion(&mut self) -> bool {
        let Some(baseline) = self.baseline else {
            return false;
        };

        let sample = self.imu.read();
        self.last_sample = sample;

        let accel_dev = baseline.accel_deviation(&sample);
        let gyro_dev = baseline.gyro_deviation(&sample);
        self.max_accel_deviation = self.max_accel_deviation.max(accel_dev);
        self.max_gyro_deviation = self.max_gyro_deviation.max(gyro_dev);

        let qualifying =
            accel_dev > self.settings.accel_threshold || gyro_dev > self.settings.gyro_threshold;

        let was_moving = self.pulses.is_moving();
        let now = self.clock.now_millis();
        let moving = self.pulses.update(qualifying, now, &self.settings);

        if moving != was_moving {
            if moving {
                log_info!(
                    "Motion started (accel {accel_dev:.3} g, gyro {gyro_dev:.2} deg/s)"
                );
            } else {
                log_info!("Motion stopped");
            }
        }

        moving
    }

    pub fn is_moving(&self) -> bool {
        self.pulses.is_moving()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<MotionBaseline> {
        self.baseline
    }

    /// Accelerometer deviation of the last sample, 0 before calibration.
    pub fn current_accel_deviation(&self) -> f32 {
        self.baseline
            .map_or(0.0, |baseline| baseline.accel_deviation(&self.last_sample))
    }

    /// Gyroscope deviation of the last sample, 0 before calibration.
    pub fn current_gyro_deviation(&self) -> f32 {
        self.baseline
            .map_or(0.0, |baseline| baseline.gyro_deviation(&self.last_sample))
    }

    pub fn max_accel_deviation(&self) -> f32 {
        self.max_accel_deviation
    }

    pub fn max_gyro_deviation(&self) -> f32 {
        self.max_gyro_deviation
    }

    /// Clear the running maxima.
    pub fn reset_statistics(&mut self) {
        self.max_accel_deviation = 0.0;
        self.max_gyro_deviation = 0.0;
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    /// Replace all settings; applies from the next sample.
    pub fn set_settings(&mut self, settings: MotionSettings) {
        self.settings = settings;
    }

    pub fn accel_threshold(&self) -> f32 {
        self.settings.accel_threshold
    }

    pub fn gyro_threshold(&self) -> f32 {
        self.settings.gyro_threshold
    }

    pub fn window_ms(&self) -> u32 {
        self.settings.window_ms
    }

    pub fn pulse_count(&self) -> u32 {
        self.settings.pulse_count
    }

    pub fn stop_delay_ms(&self) -> u32 {
        self.settings.stop_delay_ms
    }

    pub fn set_accel_threshold(&mut self, threshold: f32) {
        self.settings.accel_threshold = threshold;
    }

    pub fn set_gyro_threshold(&mut self, threshold: f32) {
        self.settings.gyro_threshold = threshold;
    }

    pub fn set_window_ms(&mut self, window_ms: u32) {
        self.settings.window_ms = window_ms;
    }

    pub fn set_pulse_count(&mut self, pulse_count: u32) {
        self.settings.pulse_count = pulse_count;
    }

    pub fn set_stop_delay_ms(&mut self, stop_delay_ms: u32) {
        self.settings.stop_delay_ms = stop_delay_ms;
    }

    /// Pulse-window state, for diagnostics.
    pub fn pulse_window(&self) -> &PulseWindow {
        &self.pulses
    }
}
