//! Configuration management for the `cmdeng` shell.
//!
//! Handles loading configuration from TOML files, with the caller's default
//! level and per-command overrides for the built-in commands.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Per-command overrides, keyed by command name.
    #[serde(default)]
    pub commands: HashMap<String, CommandConfig>,
}

/// Session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Authorization level the session runs with.
    #[serde(default)]
    pub level: i32,

    /// Stop at the first failing line instead of continuing.
    #[serde(default)]
    pub stop_on_error: bool,
}

/// Overrides for a single built-in command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Minimum level required to run the command.
    pub min_level: Option<i32>,

    /// Replacement help text.
    pub help: Option<String>,

    /// Remove the command from the shell entirely.
    #[serde(default)]
    pub disabled: bool,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmd-engine")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Gets the overrides for a command, if any.
    pub fn command(&self, name: &str) -> Option<&CommandConfig> {
        self.commands.get(name)
    }
}
