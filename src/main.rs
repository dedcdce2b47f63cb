//! twinbuild - dual-target esbuild asset pipeline
//!
//! Builds the browser bundle and the server-rendering bundle of a web
//! application:
//! - `twinbuild build`: one-shot development build
//! - `twinbuild build --deploy`: minified production build
//! - `twinbuild build --watch`: rebuild both bundles on every change

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use twinbuild_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("twinbuild=debug,twinbuild_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("twinbuild=info,twinbuild_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let outcome = cli.execute().await?;
    if !outcome.is_success() {
        std::process::exit(outcome.exit_code());
    }

    Ok(())
}
