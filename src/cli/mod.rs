//! Command-line interface for Loadplan
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Resolve the pipeline and write the plan
//! - `check`: Validate rule declarations
//! - `route`: Show how the plan handles each file of a directory
//! - `init`: Project scaffolding

mod build;
mod check;
mod init;
mod route;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::plan::ExecutionPlan;
use crate::resolver::{BuildMode, PipelineResolver};

pub use build::BuildCommand;
pub use check::CheckCommand;
pub use init::InitCommand;
pub use route::RouteCommand;

/// Loadplan - resolves asset loader chains into a bundler build plan
#[derive(Parser, Debug)]
#[command(name = "loadplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to loadplan.toml config file
    #[arg(short, long, global = true, default_value = "loadplan.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the pipeline and write the execution plan
    Build(BuildCommand),

    /// Validate the rule declarations without writing anything
    Check(CheckCommand),

    /// Show which rule handles each file of a directory
    Route(RouteCommand),

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Check(cmd) => cmd.execute(&self.config).await,
            Commands::Route(cmd) => cmd.execute(&self.config).await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Load the config and resolve it, printing every configuration error
pub(crate) fn resolve_plan(config_path: &str, mode: BuildMode) -> Result<(Arc<Config>, ExecutionPlan)> {
    info!("Loading configuration from {}", config_path);
    let config = Arc::new(Config::load(config_path)?);

    let resolver = PipelineResolver::new(config.clone());
    match resolver.resolve_config(mode) {
        Ok(plan) => Ok((config, plan)),
        Err(report) => {
            eprintln!(
                "{} {} problem(s) in {}\n",
                "✗".red().bold(),
                report.len(),
                config_path.cyan()
            );
            for error in report.errors() {
                eprintln!("  {} {}", "→".red(), error);
            }
            eprintln!();
            Err(report.into())
        }
    }
}

/// Print the Loadplan banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚙".cyan(),
        "Loadplan".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
