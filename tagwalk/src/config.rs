use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coerce::Coercer;
use crate::errors::ConfigError;
use crate::walker::Walker;

/// Settings for walks and coercions, usually read from a `tagwalk.toml`:
///
/// ```toml
/// [walker]
/// max_depth = 32
///
/// [coerce]
/// name_key = "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub walker: WalkerSettings,
    #[serde(default)]
    pub coerce: CoerceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkerSettings {
    /// Deepest record nesting a walk descends into before failing.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for WalkerSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> usize {
    64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoerceSettings {
    /// Annotation key whose names are matched against map keys when filling a record.
    #[serde(default = "default_name_key")]
    pub name_key: String,
}

impl Default for CoerceSettings {
    fn default() -> Self {
        Self {
            name_key: default_name_key(),
        }
    }
}

fn default_name_key() -> String {
    "json".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// A walker for `key` using these settings.
    pub fn walker(&self, key: impl Into<String>) -> Walker {
        Walker::new(key).with_settings(self.walker.clone())
    }

    pub fn coercer(&self) -> Coercer {
        Coercer::new(self.coerce.clone())
    }
}
