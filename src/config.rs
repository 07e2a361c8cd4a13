//! Configuration loading and management
//!
//! Handles parsing of `.salesboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".salesboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Bootstrap configuration
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Undo prompt configuration
    #[serde(default)]
    pub undo: UndoConfig,
}

/// Bootstrap loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoaderConfig {
    /// Task list to fetch: a file path or an http(s) URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Number of synthetic tasks generated when the fetch fails
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,

    /// Seed for the synthetic generator
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fetch timeout in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_fallback_count() -> usize {
    50
}

fn default_seed() -> u64 {
    42
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source: None,
            fallback_count: default_fallback_count(),
            seed: default_seed(),
            timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

/// Undo prompt configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoConfig {
    /// How long a deletion stays undoable, in milliseconds
    #[serde(default = "default_undo_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_undo_timeout_ms() -> u64 {
    4_000
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_undo_timeout_ms(),
        }
    }
}

const MAX_FALLBACK_COUNT: usize = 10_000;

impl Config {
    /// Load configuration from a `.salesboard.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = Self::path_in(dir);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %err,
                        "ignoring invalid config"
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.loader.validate()?;
        self.undo.validate()?;
        Ok(())
    }
}

impl LoaderConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if let Some(source) = &self.source {
            if source.trim().is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "loader.source cannot be empty".to_string(),
                ));
            }
        }
        if self.fallback_count > MAX_FALLBACK_COUNT {
            return Err(crate::error::Error::InvalidConfig(format!(
                "loader.fallback_count must be <= {MAX_FALLBACK_COUNT}"
            )));
        }
        if self.timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "loader.timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl UndoConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "undo.timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.timeout_ms).unwrap_or(i64::MAX))
    }
}
