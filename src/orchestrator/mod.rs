//! Build orchestration
//!
//! Drives the client and server targets through a [`BundleEngine`], either
//! once or as long-lived watch sessions, and decides which engine failures
//! are fatal.

use std::future::Future;
use std::time::Instant;

use colored::Colorize;
use tracing::{error, info};

use crate::engine::{BundleEngine, EngineError, WatchContext};
use crate::targets::{build_configs, BuildFlags, PipelineSettings, Target, TargetConfig};
use crate::utils::format_duration;

/// A target whose build or watch establishment failed
#[derive(Debug)]
pub struct TargetFailure {
    pub target: Target,
    pub error: EngineError,
}

/// Final outcome of one invocation
#[derive(Debug)]
pub enum ExitOutcome {
    Success,
    Failure(Vec<TargetFailure>),
}

impl ExitOutcome {
    fn from_failures(failures: Vec<TargetFailure>) -> Self {
        if failures.is_empty() {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failure(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure(_) => 1,
        }
    }
}

/// Runs both targets through an engine
pub struct Orchestrator<E> {
    engine: E,
    settings: PipelineSettings,
}

impl<E: BundleEngine> Orchestrator<E> {
    pub fn new(engine: E, settings: PipelineSettings) -> Self {
        Self { engine, settings }
    }

    /// Run to completion. In watch mode that is until the process is
    /// terminated.
    pub async fn run(&self, flags: BuildFlags) -> ExitOutcome {
        self.run_until(flags, std::future::pending()).await
    }

    /// Run until the work is done. In watch mode that means until `shutdown`
    /// resolves.
    pub async fn run_until<F>(&self, flags: BuildFlags, shutdown: F) -> ExitOutcome
    where
        F: Future<Output = ()>,
    {
        let (client, server) = build_configs(flags, &self.settings);

        if !flags.watch {
            return self.build_once(&[client, server]).await;
        }

        let (contexts, failures) = self.establish(&[client, server]).await;
        if !failures.is_empty() {
            return ExitOutcome::Failure(failures);
        }

        shutdown.await;
        for ctx in &contexts {
            info!("Stopping {} watch session", ctx.target());
        }
        drop(contexts);

        ExitOutcome::Success
    }

    /// Build every target in order. A failing target does not stop the
    /// following ones.
    async fn build_once(&self, configs: &[TargetConfig]) -> ExitOutcome {
        let start = Instant::now();
        let mut failures = Vec::new();

        for config in configs {
            info!("Building {} bundle", config.target);
            match self.engine.build(config).await {
                Ok(report) => {
                    eprintln!(
                        "  {} {} {} {}",
                        "✓".green(),
                        report.target.to_string().cyan(),
                        config.outdir.display().to_string().dimmed(),
                        format_duration(report.elapsed).dimmed()
                    );
                }
                Err(err) => {
                    error!("{}", err);
                    eprintln!("  {} {}", "✗".red(), config.target.to_string().red());
                    failures.push(TargetFailure {
                        target: config.target,
                        error: err,
                    });
                }
            }
        }

        info!("Finished in {}", format_duration(start.elapsed()));
        ExitOutcome::from_failures(failures)
    }

    /// Open a watch session for every target. All targets are attempted even
    /// after a failure.
    async fn establish(
        &self,
        configs: &[TargetConfig],
    ) -> (Vec<Box<dyn WatchContext>>, Vec<TargetFailure>) {
        let mut contexts = Vec::new();
        let mut failures = Vec::new();

        for config in configs {
            match self.start_watch(config).await {
                Ok(ctx) => {
                    eprintln!(
                        "  {} Watching {}",
                        "↻".yellow(),
                        config.target.to_string().cyan()
                    );
                    contexts.push(ctx);
                }
                Err(err) => {
                    error!("Could not watch {} bundle: {}", config.target, err);
                    failures.push(TargetFailure {
                        target: config.target,
                        error: err,
                    });
                }
            }
        }

        (contexts, failures)
    }

    async fn start_watch(&self, config: &TargetConfig) -> Result<Box<dyn WatchContext>, EngineError> {
        let mut ctx = self.engine.context(config).await?;
        ctx.watch().await?;
        Ok(ctx)
    }
}
