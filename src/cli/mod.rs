//! Command-line interface for twinbuild
//!
//! Subcommands:
//! - `build`: Build both bundles once, or watch them with `--watch`
//! - `telemetry`: Resolve the telemetry config a page would start with

mod build;
mod telemetry;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::orchestrator::ExitOutcome;

pub use build::BuildCommand;
pub use telemetry::{ProfileKind, TelemetryCommand};

/// twinbuild - dual-target esbuild asset pipeline
#[derive(Parser, Debug)]
#[command(name = "twinbuild")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to twinbuild.toml config file
    #[arg(short, long, global = true, default_value = "twinbuild.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the client and server bundles
    Build(BuildCommand),

    /// Print the telemetry configuration for a rendered page
    Telemetry(TelemetryCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<ExitOutcome> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Telemetry(cmd) => cmd.execute().await,
        }
    }
}

/// Print the twinbuild banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "twinbuild".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
