//! Runtime configuration.
//!
//! Every field has a default, so a partial (or empty) JSON object is a valid
//! configuration.

use crate::core::DEFAULT_HISTORY_CAPACITY;
use crate::effects::{UndeliveredEffects, DEFAULT_EFFECT_BUFFER};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by every machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Effects held while no consumer is attached.
    pub effect_buffer: usize,
    /// Whether effects published with no consumer are held or discarded.
    pub undelivered: UndeliveredEffects,
    /// Transitions kept in the history.
    pub history_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            effect_buffer: DEFAULT_EFFECT_BUFFER,
            undelivered: UndeliveredEffects::Buffer,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl MachineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = MachineConfig::from_json("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.effect_buffer, 64);
        assert_eq!(config.history_capacity, 128);
    }

    #[test]
    fn partial_object_overrides_named_fields() {
        let config = MachineConfig::from_json(r#"{"undelivered": "drop"}"#).unwrap();
        assert_eq!(config.undelivered, UndeliveredEffects::Drop);
        assert_eq!(config.effect_buffer, DEFAULT_EFFECT_BUFFER);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = MachineConfig::from_json("{effect_buffer:").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
