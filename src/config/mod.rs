//! Configuration file for mowlight.
//!
//! Settings live in `mowlight.toml`, by default under
//! `$XDG_CONFIG_HOME/mowlight/`, or in the directory given with `--config`.
//! A commented default file is written on first load.
//!
//! ```toml
//! # Ambient light
//! [light]
//! lux_threshold = 10.0       # Below this lux level it is night
//! brightness = 255           # Floodlight brightness when switching on (0-255)
//!
//! # Motion detection
//! [motion]
//! accel_threshold = 0.1      # Accelerometer deviation threshold (g)
//! gyro_threshold = 5.0       # Gyroscope deviation threshold (deg/s)
//! window_ms = 500            # Pulse window length
//! pulse_count = 3            # Pulses within one window to count as moving
//! stop_delay_ms = 1000       # Quiet time before motion is over
//! calibration_samples = 100  # Samples averaged for the rest baseline
//!
//! # Decision engine
//! [decision]
//! shutoff_delay_ms = 30000   # Light stays on this long after conditions end
//! auto_mode = true           # Automatic control enabled
//! light_sensor_bypass = false
//! movement_bypass = false
//! time_window_enabled = false
//! time_window_invert = false
//! time_window_start = 22
//! time_window_end = 6
//! ```
//!
//! Every field is optional. Validation runs when a file is loaded; values set
//! at runtime through the engine are not range-checked.

pub mod builder;
pub mod loading;
pub mod store;
pub mod validation;


use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::decision::DecisionConfig;
use crate::motion::MotionSettings;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use store::TomlConfigStore;

/// `[light]` table.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct LightSection {
    pub lux_threshold: Option<f32>,
    pub brightness: Option<u8>,
}

/// `[motion]` table.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct MotionSection {
    pub accel_threshold: Option<f32>,
    pub gyro_threshold: Option<f32>,
    pub window_ms: Option<u32>,
    pub pulse_count: Option<u32>,
    pub stop_delay_ms: Option<u32>,
    pub calibration_samples: Option<u32>,
}

/// `[decision]` table.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct DecisionSection {
    pub shutoff_delay_ms: Option<u32>,
    pub auto_mode: Option<bool>,
    pub light_sensor_bypass: Option<bool>,
    pub movement_bypass: Option<bool>,
    pub time_window_enabled: Option<bool>,
    pub time_window_invert: Option<bool>,
    pub time_window_start: Option<u8>,
    pub time_window_end: Option<u8>,
}

/// Contents of `mowlight.toml`.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub light: LightSection,
    pub motion: MotionSection,
    pub decision: DecisionSection,
}

/// Every settable field as `(table, key)`. Keys are unique across tables.
pub const FIELDS: &[(&str, &str)] = &[
    ("light", "lux_threshold"),
    ("light", "brightness"),
    ("motion", "accel_threshold"),
    ("motion", "gyro_threshold"),
    ("motion", "window_ms"),
    ("motion", "pulse_count"),
    ("motion", "stop_delay_ms"),
    ("motion", "calibration_samples"),
    ("decision", "shutoff_delay_ms"),
    ("decision", "auto_mode"),
    ("decision", "light_sensor_bypass"),
    ("decision", "movement_bypass"),
    ("decision", "time_window_enabled"),
    ("decision", "time_window_invert"),
    ("decision", "time_window_start"),
    ("decision", "time_window_end"),
];

/// Resolve `key` or `table.key` to its table and key.
pub fn resolve_field(name: &str) -> Option<(&'static str, &'static str)> {
    let (table, key) = match name.split_once('.') {
        Some((table, key)) => (Some(table), key),
        None => (None, name),
    };
    FIELDS
        .iter()
        .copied()
        .find(|(t, k)| *k == key && table.is_none_or(|table| table == *t))
}

impl Config {
    pub fn load() -> Result<Self> {
        loading::load()
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        loading::load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        loading::get_config_path()
    }

    pub fn lux_threshold(&self) -> f32 {
        self.light.lux_threshold.unwrap_or(DEFAULT_LUX_THRESHOLD)
    }

    pub fn brightness(&self) -> u8 {
        self.light.brightness.unwrap_or(DEFAULT_BRIGHTNESS)
    }

    pub fn calibration_samples(&self) -> u32 {
        self.motion
            .calibration_samples
            .unwrap_or(DEFAULT_CALIBRATION_SAMPLES)
    }

    pub fn motion_settings(&self) -> MotionSettings {
        let m = &self.motion;
        MotionSettings {
            accel_threshold: m.accel_threshold.unwrap_or(DEFAULT_ACCEL_THRESHOLD),
            gyro_threshold: m.gyro_threshold.unwrap_or(DEFAULT_GYRO_THRESHOLD),
            window_ms: m.window_ms.unwrap_or(DEFAULT_MOTION_WINDOW_MS),
            pulse_count: m.pulse_count.unwrap_or(DEFAULT_MOTION_PULSE_COUNT),
            stop_delay_ms: m.stop_delay_ms.unwrap_or(DEFAULT_MOTION_STOP_DELAY_MS),
        }
    }

    pub fn decision_config(&self) -> DecisionConfig {
        let d = &self.decision;
        let defaults = DecisionConfig::default();
        DecisionConfig {
            shutoff_delay_ms: d.shutoff_delay_ms.unwrap_or(defaults.shutoff_delay_ms),
            auto_mode: d.auto_mode.unwrap_or(defaults.auto_mode),
            light_sensor_bypass: d
                .light_sensor_bypass
                .unwrap_or(defaults.light_sensor_bypass),
            movement_bypass: d.movement_bypass.unwrap_or(defaults.movement_bypass),
            time_window_enabled: d
                .time_window_enabled
                .unwrap_or(defaults.time_window_enabled),
            time_window_invert: d.time_window_invert.unwrap_or(defaults.time_window_invert),
            time_window_start: d.time_window_start.unwrap_or(defaults.time_window_start),
            time_window_end: d.time_window_end.unwrap_or(defaults.time_window_end),
        }
    }

    /// Current value of `table.key` rendered as TOML, if set.
    pub fn field_value(&self, table: &str, key: &str) -> Option<String> {
        let value = toml::Value::try_from(self).ok()?;
        value.get(table)?.get(key).map(|v| match v {
            // Fields are f32; print them at that precision.
            toml::Value::Float(f) => {
                let text = (*f as f32).to_string();
                if text.contains(['.', 'e', 'N', 'i']) {
                    text
                } else {
                    format!("{text}.0")
                }
            }
            other => other.to_string(),
        })
    }

    /// Log the effective settings.
    pub fn log_config(&self, source: &Path) {
        log_block_start!("Loaded configuration from {}", source.display());

        log_indented!(
            "Night below {} lux, brightness {}",
            self.lux_threshold(),
            self.brightness()
        );

        let motion = self.motion_settings();
        log_indented!(
            "Motion: accel > {} g or gyro > {} deg/s, {} pulses in {} ms, stop after {} ms",
            motion.accel_threshold,
            motion.gyro_threshold,
            motion.pulse_count,
            motion.window_ms,
            motion.stop_delay_ms
        );

        let decision = self.decision_config();
        log_indented!("Shutoff delay: {} ms", decision.shutoff_delay_ms);
        if !decision.auto_mode {
            log_indented!("Automatic mode: disabled");
        }
        if decision.light_sensor_bypass {
            log_indented!("Light sensor bypassed");
        }
        if decision.movement_bypass {
            log_indented!("Movement bypassed");
        }
        if decision.time_window_enabled {
            log_indented!(
                "Time window: {:02}:00-{:02}:00{}",
                decision.time_window_start,
                decision.time_window_end,
                if decision.time_window_invert {
                    " (inverted)"
                } else {
                    ""
                }
            );
        }
    }
}
