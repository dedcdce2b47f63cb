//! Configuration handling for twinbuild
//!
//! Parses the optional twinbuild.toml file. Every key has a default, so a
//! project without a config file builds with the stock layout.

mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine location
    #[serde(default)]
    pub engine: EngineConfig,

    /// Settings shared by both targets
    #[serde(default)]
    pub build: BuildSettings,

    /// Browser target overrides
    #[serde(default)]
    pub client: TargetOverrides,

    /// Server target overrides
    #[serde(default)]
    pub server: TargetOverrides,

    /// Directory containing the config file
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let canonical_path = absolute(path.as_ref())?;

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", canonical_path.display()))?;

        config.base_dir = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(config)
    }

    /// Load the config file if it exists, otherwise use defaults rooted at
    /// the current directory.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        debug!("No config file at {}, using defaults", path.display());
        Ok(Self {
            base_dir: std::env::current_dir()?,
            ..Self::default()
        })
    }

    /// Absolute asset root
    pub fn root(&self) -> PathBuf {
        self.base_dir.join(&self.engine.root)
    }

    /// Resolved browser target settings
    pub fn client_settings(&self) -> TargetSettings {
        self.client.apply(TargetSettings::client_defaults())
    }

    /// Resolved server target settings
    pub fn server_settings(&self) -> TargetSettings {
        self.server.apply(TargetSettings::server_defaults())
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
