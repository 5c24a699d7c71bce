//! Configuration handling for Loadplan
//!
//! Parses and manages loadplan.toml configuration files.

mod schema;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use schema::*;

use crate::transform::TransformRegistry;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    pub project: ProjectConfig,

    /// Script entry point
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Development server settings
    #[serde(default)]
    pub dev: DevConfig,

    /// HTML page generation
    #[serde(default)]
    pub html: Option<HtmlConfig>,

    /// Browser support matrix for compatibility transforms
    #[serde(default)]
    pub targets: BTreeMap<String, String>,

    /// Transforms beyond the built-in set
    #[serde(default)]
    pub transforms: Vec<TransformDeclaration>,

    /// Asset rules
    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_entry() -> String {
    "src/index.js".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        // Set root directory to the directory containing the config file
        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self::parse(&content, root)
    }

    /// Parse configuration text rooted at `root`
    pub fn parse(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse loadplan.toml")?;
        config.root = root;

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            project: ProjectConfig {
                name: "my-app".to_string(),
                version: "0.1.0".to_string(),
            },
            entry: default_entry(),
            output: OutputConfig::default(),
            dev: DevConfig::default(),
            html: None,
            targets: BTreeMap::new(),
            transforms: Vec::new(),
            rules: Vec::new(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    ///
    /// Rule declarations are checked by the pipeline resolver, not here.
    fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            anyhow::bail!("An entry point must be specified in loadplan.toml");
        }

        let entry_path = self.entry_path();
        if !entry_path.exists() {
            warn!("Entry point does not exist yet: {}", entry_path.display());
        }

        if let Some(html) = &self.html {
            if html.template.trim().is_empty() {
                anyhow::bail!("[html] template must not be empty");
            }
        }

        Ok(())
    }

    /// Registry of built-in transforms plus those declared in `[[transforms]]`
    pub fn registry(&self) -> TransformRegistry {
        let mut registry = TransformRegistry::builtin();
        for transform in &self.transforms {
            registry.register(&transform.name, transform.kind);
        }
        registry
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Get the absolute entry point path
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry)
    }
}
