//! Configuration schema definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Node executable used to run esbuild and its plugins
    #[serde(default = "default_node")]
    pub node: String,

    /// Asset root, relative to the config file. esbuild runs from here and
    /// resolves its npm packages from here.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            root: default_root(),
        }
    }
}

fn default_node() -> String {
    "node".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Settings shared by both targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    /// tsconfig passed to esbuild
    #[serde(default = "default_tsconfig")]
    pub tsconfig: String,

    /// esbuild log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            tsconfig: default_tsconfig(),
            log_level: default_log_level(),
        }
    }
}

fn default_tsconfig() -> String {
    "./tsconfig.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fixed, flag-independent values of one build target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Entry points, relative to the asset root
    pub entry_points: Vec<String>,

    /// Output directory, relative to the asset root
    pub outdir: PathBuf,

    /// esbuild language/runtime target
    pub es_target: String,
}

impl TargetSettings {
    /// Browser bundle defaults
    pub fn client_defaults() -> Self {
        Self {
            entry_points: vec!["js/app.js".to_string(), "js/sentry.js".to_string()],
            outdir: PathBuf::from("../priv/static/assets"),
            es_target: "es2022".to_string(),
        }
    }

    /// Server-rendering bundle defaults
    pub fn server_defaults() -> Self {
        Self {
            entry_points: vec!["js/server.js".to_string()],
            outdir: PathBuf::from("../priv/svelte"),
            es_target: "node22.17.0".to_string(),
        }
    }
}

/// Partial target settings as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetOverrides {
    #[serde(default)]
    pub entry_points: Option<Vec<String>>,

    #[serde(default)]
    pub outdir: Option<PathBuf>,

    #[serde(default)]
    pub es_target: Option<String>,
}

impl TargetOverrides {
    /// Apply these overrides on top of `base`
    pub fn apply(&self, base: TargetSettings) -> TargetSettings {
        TargetSettings {
            entry_points: self.entry_points.clone().unwrap_or(base.entry_points),
            outdir: self.outdir.clone().unwrap_or(base.outdir),
            es_target: self.es_target.clone().unwrap_or(base.es_target),
        }
    }
}
