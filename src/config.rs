use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime configuration, usually loaded from a TOML file.
///
/// ```toml
/// [log]
/// name = "session"
/// directory = "/var/log/wizflow"
/// journal = "/var/log/wizflow/journal.txt"
/// batch = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log name; also the stem of the backing file name.
    pub name: String,
    /// Directory for the backing `.log` file. No backing file when unset.
    pub directory: Option<PathBuf>,
    /// File the live text journal is appended to. No journal when unset.
    pub journal: Option<PathBuf>,
    /// Unattended execution: problems opening the backing file go to stderr.
    pub batch: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: "wizflow".to_string(),
            directory: None,
            journal: None,
            batch: false,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
