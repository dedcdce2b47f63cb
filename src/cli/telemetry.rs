//! Telemetry command implementation

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use url::Url;

use crate::orchestrator::ExitOutcome;
use crate::telemetry::{
    HtmlDocument, SdkLoading, TelemetryClient, TelemetryConfig, TelemetryInitializer,
    TelemetryProfile, DEFAULT_SDK_URL,
};

/// Deployment profile selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileKind {
    /// SDK bundled with the app, tracing and session replay
    Bundled,
    /// SDK imported from --sdk-url, tracing only
    Remote,
}

/// Print the telemetry configuration for a rendered page
#[derive(Args, Debug)]
pub struct TelemetryCommand {
    /// Rendered HTML page to read the endpoint from
    #[arg(long)]
    pub html: PathBuf,

    /// Deployment profile
    #[arg(short, long, value_enum, default_value = "bundled")]
    pub profile: ProfileKind,

    /// SDK module URL for the remote profile
    #[arg(long, default_value = DEFAULT_SDK_URL)]
    pub sdk_url: Url,
}

impl TelemetryCommand {
    pub fn profile(&self) -> TelemetryProfile {
        match self.profile {
            ProfileKind::Bundled => TelemetryProfile::bundled(),
            ProfileKind::Remote => TelemetryProfile::remote(self.sdk_url.clone()),
        }
    }

    pub async fn execute(&self) -> Result<ExitOutcome> {
        info!("Reading {}", self.html.display());
        let html = fs::read_to_string(&self.html)
            .with_context(|| format!("Failed to read page: {}", self.html.display()))?;

        let initializer = TelemetryInitializer::new(self.profile());
        let printer = JsonPrinter {
            loading: initializer.profile().loading.clone(),
        };
        initializer.initialize(&HtmlDocument::new(html), &printer);

        Ok(ExitOutcome::Success)
    }
}

/// Prints the init call as JSON instead of starting an SDK
struct JsonPrinter {
    loading: SdkLoading,
}

#[derive(Serialize)]
struct PrintedInit<'a> {
    sdk: &'a SdkLoading,
    config: &'a TelemetryConfig,
}

impl TelemetryClient for JsonPrinter {
    fn init(&self, config: &TelemetryConfig) {
        let output = PrintedInit {
            sdk: &self.loading,
            config,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to render telemetry config: {}", e),
        }
    }
}
