//! Configuration validation functionality.
//!
//! Only applied to values read from a file. Brightness needs no check: the
//! `u8` field type already rejects anything outside 0-255 at parse time.

use anyhow::Result;

use super::Config;
use crate::constants::*;

/// Reject values that make no physical sense.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lux) = config.light.lux_threshold {
        validate_threshold(lux, "lux_threshold")?;
    }

    let motion = &config.motion;
    if let Some(threshold) = motion.accel_threshold {
        validate_threshold(threshold, "accel_threshold")?;
    }
    if let Some(threshold) = motion.gyro_threshold {
        validate_threshold(threshold, "gyro_threshold")?;
    }
    if let Some(window) = motion.window_ms {
        validate_delay(window, "window_ms")?;
    }
    if let Some(delay) = motion.stop_delay_ms {
        validate_delay(delay, "stop_delay_ms")?;
    }
    if let Some(count) = motion.pulse_count
        && count == 0
    {
        anyhow::bail!("pulse_count must be at least 1");
    }
    if let Some(samples) = motion.calibration_samples
        && samples == 0
    {
        anyhow::bail!("calibration_samples must be at least 1");
    }

    let decision = &config.decision;
    if let Some(delay) = decision.shutoff_delay_ms {
        validate_delay(delay, "shutoff_delay_ms")?;
    }
    if let Some(hour) = decision.time_window_start {
        validate_hour(hour, "time_window_start")?;
    }
    if let Some(hour) = decision.time_window_end {
        validate_hour(hour, "time_window_end")?;
    }

    Ok(())
}

fn validate_threshold(value: f32, name: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("{name} must be a non-negative number (got {value})");
    }
    Ok(())
}

fn validate_delay(value: u32, name: &str) -> Result<()> {
    if value > MAXIMUM_DELAY_MS {
        anyhow::bail!("{name} ({value} ms) must not exceed {MAXIMUM_DELAY_MS} ms");
    }
    Ok(())
}

fn validate_hour(hour: u8, name: &str) -> Result<()> {
    if hour > MAXIMUM_HOUR {
        anyhow::bail!("{name} ({hour}) must be an hour between 0 and {MAXIMUM_HOUR}");
    }
    Ok(())
}
