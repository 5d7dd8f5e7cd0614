//! Hero tuning.

use crate::config::{ConfigError, MachineConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_JUMP_DURATION_MS: u64 = 1000;
pub const DEFAULT_SHOOTING_INTERVAL_MS: u64 = 50;
pub const DEFAULT_INITIAL_AMMO: u32 = 40;

/// Hero machine settings. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    /// Airtime from jump press to landing.
    pub jump_duration_ms: u64,
    /// Time between two shots while firing.
    pub shooting_interval_ms: u64,
    /// Ammunition at start and after a reload.
    pub initial_ammo: u32,
    pub machine: MachineConfig,
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            jump_duration_ms: DEFAULT_JUMP_DURATION_MS,
            shooting_interval_ms: DEFAULT_SHOOTING_INTERVAL_MS,
            initial_ammo: DEFAULT_INITIAL_AMMO,
            machine: MachineConfig::default(),
        }
    }
}

impl HeroConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jump_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "jump_duration_ms must be positive".to_string(),
            ));
        }
        if self.shooting_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "shooting_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn jump_duration(&self) -> Duration {
        Duration::from_millis(self.jump_duration_ms)
    }

    pub fn shooting_interval(&self) -> Duration {
        Duration::from_millis(self.shooting_interval_ms)
    }
}
