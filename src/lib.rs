//! twinbuild library
//!
//! Builds a browser bundle and a server-rendering bundle with esbuild, once
//! or in watch mode, and carries the telemetry startup configuration shipped
//! with the browser bundle.

pub mod cli;
pub mod config;
pub mod engine;
pub mod orchestrator;
pub mod plugins;
pub mod targets;
pub mod telemetry;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use engine::{BundleEngine, EsbuildEngine};
pub use orchestrator::{ExitOutcome, Orchestrator};
pub use targets::{build_configs, BuildFlags, TargetConfig};
