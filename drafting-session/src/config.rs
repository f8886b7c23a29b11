//! Configuration for the drafting service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    /// Where template data comes from
    pub data: DataConfig,
    /// Session behavior
    pub session: SessionConfig,
}

impl DraftingConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Template data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Data directory with `districts.yaml`, `rules/` and `templates/`.
    /// The bundled data set is used when unset.
    pub data_dir: Option<PathBuf>,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum concurrently open sessions
    pub max_active_sessions: usize,
    /// Pre-fill fields that declare a default value
    pub seed_default_values: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_active_sessions: 1_000,
            seed_default_values: true,
        }
    }
}
