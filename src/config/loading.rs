//! Configuration loading functionality.
//!
//! Resolves the configuration path, creates a default file when none exists,
//! then parses, validates and fills in defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::constants::*;

/// Global configuration directory, set once at startup
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "mowlight.toml";

/// Set the configuration directory for the current process.
/// This can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `mowlight.toml`, honouring `--config`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("mowlight").join(CONFIG_FILE_NAME))
}

/// Load configuration, creating a default file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Load configuration from a specific path.
///
/// Does not create a default config if the path doesn't exist.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    apply_defaults(&mut config);
    Ok(config)
}

/// Parse and validate configuration text without applying defaults.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Fill every unset field with its default.
fn apply_defaults(config: &mut Config) {
    let light = &mut config.light;
    light.lux_threshold.get_or_insert(DEFAULT_LUX_THRESHOLD);
    light.brightness.get_or_insert(DEFAULT_BRIGHTNESS);

    let motion = &mut config.motion;
    motion.accel_threshold.get_or_insert(DEFAULT_ACCEL_THRESHOLD);
    motion.gyro_threshold.get_or_insert(DEFAULT_GYRO_THRESHOLD);
    motion.window_ms.get_or_insert(DEFAULT_MOTION_WINDOW_MS);
    motion.pulse_count.get_or_insert(DEFAULT_MOTION_PULSE_COUNT);
    motion.stop_delay_ms.get_or_insert(DEFAULT_MOTION_STOP_DELAY_MS);
    motion
        .calibration_samples
        .get_or_insert(DEFAULT_CALIBRATION_SAMPLES);

    let decision = &mut config.decision;
    decision.shutoff_delay_ms.get_or_insert(DEFAULT_SHUTOFF_DELAY_MS);
    decision.auto_mode.get_or_insert(true);
    decision.light_sensor_bypass.get_or_insert(false);
    decision.movement_bypass.get_or_insert(false);
    decision.time_window_enabled.get_or_insert(false);
    decision.time_window_invert.get_or_insert(false);
    decision.time_window_start.get_or_insert(DEFAULT_TIME_WINDOW_START);
    decision.time_window_end.get_or_insert(DEFAULT_TIME_WINDOW_END);
}
