//! Build command implementation

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::EsbuildEngine;
use crate::orchestrator::{ExitOutcome, Orchestrator};
use crate::targets::{BuildFlags, PipelineSettings};

/// Build the client and server bundles
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Keep running and rebuild on source changes
    #[arg(short, long)]
    pub watch: bool,

    /// Production build (minified, no development conditions)
    #[arg(short, long)]
    pub deploy: bool,
}

impl BuildCommand {
    pub fn flags(&self) -> BuildFlags {
        BuildFlags {
            watch: self.watch,
            deploy: self.deploy,
        }
    }

    pub async fn execute(&self, config_path: &str) -> Result<ExitOutcome> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;
        let flags = self.flags();

        eprintln!(
            "{} {} build{}...",
            "→".blue(),
            if flags.deploy { "Production" } else { "Development" },
            if flags.watch { " (watching)" } else { "" }
        );

        let engine = EsbuildEngine::from_config(&config);
        let orchestrator = Orchestrator::new(engine, PipelineSettings::from(&config));
        let outcome = orchestrator.run_until(flags, shutdown_signal()).await;

        if outcome.is_success() {
            eprintln!("\n{} Done\n", "✓".green().bold());
        } else {
            eprintln!("\n{} Build failed\n", "✗".red().bold());
        }

        Ok(outcome)
    }
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C ({}), watching until killed", e);
        std::future::pending::<()>().await;
    }
}
