//! Build command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{debug, info};

use crate::plan::ExecutionPlan;
use crate::resolver::BuildMode;
use crate::utils::format_duration;

/// Resolve the pipeline and write the execution plan
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Build mode (development or production)
    #[arg(short, long, default_value = "production", env = "LOADPLAN_MODE")]
    pub mode: BuildMode,

    /// Write the plan to this file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        eprintln!("{} Resolving {} pipeline...", "→".blue(), self.mode.to_string().cyan());

        let (_, plan) = super::resolve_plan(config_path, self.mode)?;
        let json = plan.to_json().context("Failed to serialize plan")?;

        match &self.out {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                tokio::fs::write(path, &json)
                    .await
                    .with_context(|| format!("Failed to write plan: {}", path.display()))?;
                info!("Plan written to {}", path.display());
            }
            None => println!("{}", json),
        }

        eprintln!(
            "\n{} Resolved {} rule(s) in {}\n",
            "✓".green().bold(),
            plan.rules.len(),
            format_duration(start.elapsed())
        );

        print_summary(&plan);

        Ok(())
    }
}

/// Print each rule with its chain in application order
fn print_summary(plan: &ExecutionPlan) {
    for rule in &plan.rules {
        let chain: Vec<&str> = rule.apply_order().map(|s| s.name.as_str()).collect();
        let inline = rule
            .inline_limit
            .map(|limit| format!(" (inline < {} B)", limit))
            .unwrap_or_default();

        eprintln!(
            "  {} {} {}{}",
            format!("{:>2}.", rule.order + 1).dimmed(),
            rule.name.cyan(),
            chain.join(" → ").dimmed(),
            inline.dimmed()
        );
    }

    if let Some(dev) = &plan.output.dev_server {
        match dev.url() {
            Ok(url) => eprintln!("\n  {} Dev server at {}", "•".dimmed(), url.as_str().cyan().underline()),
            Err(e) => debug!("Dev server URL is not valid: {}", e),
        }
    }

    if plan.output.minify {
        eprintln!("\n  {} Minification {}", "•".dimmed(), "enabled".green());
    }

    eprintln!();
}
