//! Configuration store that lives only in memory.

use anyhow::Result;

use super::ConfigStore;
use crate::constants::DEFAULT_BRIGHTNESS;
use crate::decision::DecisionConfig;

/// Holds a [`DecisionConfig`] and brightness for simulations and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfigStore {
    config: DecisionConfig,
    brightness: u8,
    saves: u32,
}

impl MemoryConfigStore {
    pub fn new(config: DecisionConfig, brightness: u8) -> Self {
        Self {
            config,
            brightness,
            saves: 0,
        }
    }

    /// Change the brightness returned by the next activation.
    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    /// Replace the stored configuration without counting it as a save.
    pub fn set_config(&mut self, config: DecisionConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new(DecisionConfig::default(), DEFAULT_BRIGHTNESS)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<DecisionConfig> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &DecisionConfig) -> Result<()> {
        self.config = config.clone();
        self.saves += 1;
        Ok(())
    }

    fn brightness(&self) -> u8 {
        self.brightness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryConfigStore::default();
        let config = DecisionConfig {
            shutoff_delay_ms: 5_000,
            ..DecisionConfig::default()
        };
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
        assert_eq!(store.save_count(), 1);
    }
}
