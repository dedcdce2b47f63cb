//! Bundling engine seam
//!
//! The orchestrator never talks to esbuild directly. It is handed a
//! [`BundleEngine`], which lets tests drive it with fakes.

mod esbuild;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::targets::{Target, TargetConfig};

pub use esbuild::EsbuildEngine;

/// Errors reported by a bundling engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure
    #[error("{target} bundle failed ({})", describe_exit(.code))]
    Failed { target: Target, code: Option<i32> },

    /// The build request could not be encoded
    #[error("invalid engine request: {0}")]
    Request(#[from] serde_json::Error),

    /// I/O while talking to the engine process
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Result of a successful one-shot build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub target: Target,
    pub elapsed: Duration,
}

/// A live rebuild-on-change session for one target.
///
/// The session stays alive for as long as the handle is held.
#[async_trait]
pub trait WatchContext: Send {
    fn target(&self) -> Target;

    /// Start watching. Resolves once the initial build has run and the
    /// engine is watching; an error here means no session was established.
    async fn watch(&mut self) -> Result<(), EngineError>;
}

/// External bundling engine
#[async_trait]
pub trait BundleEngine: Send + Sync {
    /// Run one build to completion
    async fn build(&self, config: &TargetConfig) -> Result<BuildReport, EngineError>;

    /// Prepare a watch session for `config`
    async fn context(&self, config: &TargetConfig) -> Result<Box<dyn WatchContext>, EngineError>;
}
