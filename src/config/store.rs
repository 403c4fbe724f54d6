//! [`ConfigStore`] backed by `mowlight.toml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::builder::{default_config_content, set_field_in_content};
use super::loading::{load_from_path, parse_config};
use crate::constants::DEFAULT_BRIGHTNESS;
use crate::decision::DecisionConfig;
use crate::io::ConfigStore;

/// Reads and writes the configuration file on every call.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decision_fields(config: &DecisionConfig) -> [(&'static str, String); 8] {
    [
        ("shutoff_delay_ms", config.shutoff_delay_ms.to_string()),
        ("auto_mode", config.auto_mode.to_string()),
        ("light_sensor_bypass", config.light_sensor_bypass.to_string()),
        ("movement_bypass", config.movement_bypass.to_string()),
        ("time_window_enabled", config.time_window_enabled.to_string()),
        ("time_window_invert", config.time_window_invert.to_string()),
        ("time_window_start", config.time_window_start.to_string()),
        ("time_window_end", config.time_window_end.to_string()),
    ]
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<DecisionConfig> {
        Ok(load_from_path(&self.path)?.decision_config())
    }

    /// Rewrite the `[decision]` table; other tables and comments are kept.
    fn save(&mut self, config: &DecisionConfig) -> Result<()> {
        let mut content = if self.path.exists() {
            fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read config from {}", self.path.display()))?
        } else {
            default_config_content()
        };

        for (key, value) in decision_fields(config) {
            content = set_field_in_content(&content, "decision", key, &value);
        }

        // Never write a file the next load would reject.
        parse_config(&content).context("Refusing to save an invalid configuration")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))?;
        Ok(())
    }

    fn brightness(&self) -> u8 {
        match load_from_path(&self.path) {
            Ok(config) => config.brightness(),
            Err(e) => {
                log_warning!("Could not read brightness, using {DEFAULT_BRIGHTNESS}: {e:#}");
                DEFAULT_BRIGHTNESS
            }
        }
    }
}
