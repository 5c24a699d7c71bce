//! Loadplan - resolves asset loader chains into a bundler build plan
//!
//! Reads the asset rules of a `loadplan.toml`, validates them and produces
//! the ordered rule table and output options an external bundler executes.
//!
//! # Features
//! - Glob and regex asset matchers with first-match-wins routing
//! - Explicit rule priorities with the fallback rule always last
//! - Development and production modes from a single effects table
//! - Inline-or-emit decisions for small raster images

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use loadplan_lib::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("loadplan=debug,loadplan_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("loadplan=info,loadplan_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
