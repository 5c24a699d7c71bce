//! Check command implementation

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::resolver::BuildMode;

/// Validate rule declarations without writing a plan
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Only check this mode (both are checked by default)
    #[arg(short, long)]
    pub mode: Option<BuildMode>,
}

impl CheckCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let modes = match self.mode {
            Some(mode) => vec![mode],
            None => vec![BuildMode::Development, BuildMode::Production],
        };

        for mode in modes {
            let (_, plan) = super::resolve_plan(config_path, mode)?;
            eprintln!(
                "{} {} plan is valid ({} rule(s))",
                "✓".green().bold(),
                mode.to_string().cyan(),
                plan.rules.len()
            );
        }

        eprintln!();
        Ok(())
    }
}
