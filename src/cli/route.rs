//! Route command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::plan::AssetDisposition;
use crate::resolver::BuildMode;
use crate::utils::{format_size, relative_path};

/// Show which rule handles each file of a directory
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// Directory to scan, relative to the project root
    #[arg(default_value = "src")]
    pub dir: PathBuf,

    /// Build mode (development or production)
    #[arg(short, long, default_value = "production")]
    pub mode: BuildMode,
}

impl RouteCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let (config, plan) = super::resolve_plan(config_path, self.mode)?;
        let scan_dir = config.root.join(&self.dir);

        let files: Vec<PathBuf> = WalkDir::new(&scan_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        debug!("Routing {} file(s) under {}", files.len(), scan_dir.display());

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("  {spinner} [{bar:30}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let mut lines = Vec::with_capacity(files.len());
        let mut unmatched = 0usize;

        for file in &files {
            let relative = relative_path(&config.root, file)
                .unwrap_or_else(|| file.display().to_string());
            progress.set_message(relative.clone());

            let content = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let rule = plan.route(std::path::Path::new(&relative));
            let disposition = plan.disposition(std::path::Path::new(&relative), &content);

            let outcome = match (rule, disposition) {
                (Some(rule), Some(disposition)) => {
                    let detail = match disposition {
                        AssetDisposition::Inline { mime, size } => {
                            format!("inline {} ({})", mime, format_size(size)).green().to_string()
                        }
                        AssetDisposition::Emit { path, .. } => format!("emit {}", path).yellow().to_string(),
                        AssetDisposition::Bundled => "bundled".dimmed().to_string(),
                    };
                    format!("{} {}", rule.name.cyan(), detail)
                }
                _ => {
                    unmatched += 1;
                    "no matching rule".red().to_string()
                }
            };

            lines.push(format!("  {} {} {}", "•".dimmed(), relative, outcome));
            progress.inc(1);
        }

        progress.finish_and_clear();

        for line in &lines {
            eprintln!("{}", line);
        }

        eprintln!(
            "\n{} Routed {} file(s), {} without a rule\n",
            "✓".green().bold(),
            files.len() - unmatched,
            unmatched
        );

        Ok(())
    }
}
