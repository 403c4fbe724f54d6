//! Application-wide defaults and limits.
//!
//! Defaults match the values the floodlight ships with; limits are only
//! enforced when a configuration file is validated.

// # Light sensor

/// Lux level below which it is considered night.
pub const DEFAULT_LUX_THRESHOLD: f32 = 10.0;

/// Floodlight brightness used when entering ON under automatic control.
pub const DEFAULT_BRIGHTNESS: u8 = 255;

// # Motion classifier

/// Accelerometer deviation threshold in g.
pub const DEFAULT_ACCEL_THRESHOLD: f32 = 0.10;

/// Gyroscope deviation threshold in degrees per second.
pub const DEFAULT_GYRO_THRESHOLD: f32 = 5.0;

/// Length of the pulse window in milliseconds.
pub const DEFAULT_MOTION_WINDOW_MS: u32 = 500;

/// Qualifying pulses required within one window.
pub const DEFAULT_MOTION_PULSE_COUNT: u32 = 3;

/// Quiet time after the last pulse before motion is considered stopped.
pub const DEFAULT_MOTION_STOP_DELAY_MS: u32 = 1000;

/// Minimum spacing between two counted pulses.
pub const PULSE_MIN_SPACING_MS: u32 = 50;

/// Samples averaged by a calibration run.
pub const DEFAULT_CALIBRATION_SAMPLES: u32 = 100;

/// Pause between calibration samples.
pub const CALIBRATION_SAMPLE_DELAY_MS: u32 = 10;

/// Settle time between boot and calibration.
pub const CALIBRATION_SETTLE_MS: u32 = 2000;

// # Decision engine

/// Grace period before the light switches off once conditions stop holding.
pub const DEFAULT_SHUTOFF_DELAY_MS: u32 = 30_000;

pub const DEFAULT_TIME_WINDOW_START: u8 = 22;
pub const DEFAULT_TIME_WINDOW_END: u8 = 6;

/// Highest valid hour-of-day.
pub const MAXIMUM_HOUR: u8 = 23;

/// Upper bound for configured delays and windows (one day).
pub const MAXIMUM_DELAY_MS: u32 = 86_400_000;

// # Actuator

/// Steps used by a brightness fade.
pub const FADE_STEPS: u32 = 50;

pub const DEFAULT_FADE_DURATION_MS: u32 = 500;

// # Event log

/// Capacity of the circular event log.
pub const MAX_LOG_ENTRIES: usize = 100;

/// Entries older than this are purged by retention cleanup.
pub const LOG_RETENTION_DAYS: u32 = 7;

/// Longest mode tag stored with an event.
pub const MAX_MODE_LEN: usize = 7;

// # Simulation

/// Poll period used when replaying a scenario.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 20;

// # Exit codes

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

#[cfg(test)]
pub mod test_constants {
    pub const TEST_SHUTOFF_DELAY_MS: u32 = 1_000;
    pub const TEST_MOTION_WINDOW_MS: u32 = 500;
    pub const TEST_PULSE_COUNT: u32 = 3;
    pub const TEST_STOP_DELAY_MS: u32 = 1_000;
    pub const TEST_BRIGHTNESS: u8 = 200;
}
