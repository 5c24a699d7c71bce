//! Configuration schema definitions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transform::TransformKind;

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Script bundle filename, relative to the output directory
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Public URL prefix for assets
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Extracted stylesheet filename
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,

    /// Subdirectory for emitted images
    #[serde(default = "default_images_dir")]
    pub images: String,

    /// Subdirectory for other emitted assets
    #[serde(default = "default_assets_dir")]
    pub assets: String,

    /// Name template for emitted assets
    #[serde(default = "default_asset_name")]
    pub asset_name: String,

    /// Inline threshold override in bytes
    #[serde(default)]
    pub inline_limit: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename: default_filename(),
            public_path: default_public_path(),
            stylesheet: default_stylesheet(),
            images: default_images_dir(),
            assets: default_assets_dir(),
            asset_name: default_asset_name(),
            inline_limit: None,
        }
    }
}

fn default_output_dir() -> String {
    "build".to_string()
}

fn default_filename() -> String {
    "js/built.js".to_string()
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_stylesheet() -> String {
    "css/built.css".to_string()
}

fn default_images_dir() -> String {
    "imgs".to_string()
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_asset_name() -> String {
    "[hash:10].[ext]".to_string()
}

fn default_true() -> bool {
    true
}

/// Development server configuration, passed through to the bundler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Port to run dev server on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Directory served as content root (defaults to the output directory)
    #[serde(default)]
    pub content_base: Option<String>,

    /// Enable gzip compression
    #[serde(default = "default_true")]
    pub compress: bool,

    /// Open browser automatically
    #[serde(default)]
    pub open: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            content_base: None,
            compress: true,
            open: false,
        }
    }
}

fn default_port() -> u16 {
    9960
}

fn default_host() -> String {
    "localhost".to_string()
}

/// HTML page generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Template the page is generated from
    pub template: String,

    /// Output filename
    #[serde(default = "default_html_filename")]
    pub filename: String,
}

fn default_html_filename() -> String {
    "index.html".to_string()
}

/// Additional transform made known to the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformDeclaration {
    pub name: String,
    pub kind: TransformKind,
}

/// A matcher as written in the config: a bare glob, or a tagged glob/regex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatcherDeclaration {
    Glob(String),
    Tagged(TaggedMatcher),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaggedMatcher {
    Glob(String),
    Regex(String),
}

impl MatcherDeclaration {
    pub fn glob(pattern: impl Into<String>) -> Self {
        MatcherDeclaration::Glob(pattern.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        MatcherDeclaration::Tagged(TaggedMatcher::Regex(pattern.into()))
    }

    /// The pattern source text
    pub fn pattern(&self) -> &str {
        match self {
            MatcherDeclaration::Glob(p)
            | MatcherDeclaration::Tagged(TaggedMatcher::Glob(p))
            | MatcherDeclaration::Tagged(TaggedMatcher::Regex(p)) => p,
        }
    }
}

/// A transform step as written in the config: a bare name or a name with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepDeclaration {
    Name(String),
    Full {
        #[serde(alias = "loader")]
        name: String,
        #[serde(default)]
        options: BTreeMap<String, Value>,
    },
}

impl StepDeclaration {
    pub fn with_options(name: impl Into<String>, options: BTreeMap<String, Value>) -> Self {
        StepDeclaration::Full {
            name: name.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StepDeclaration::Name(name) | StepDeclaration::Full { name, .. } => name,
        }
    }

    pub fn options(&self) -> BTreeMap<String, Value> {
        match self {
            StepDeclaration::Name(_) => BTreeMap::new(),
            StepDeclaration::Full { options, .. } => options.clone(),
        }
    }
}

impl From<&str> for StepDeclaration {
    fn from(name: &str) -> Self {
        StepDeclaration::Name(name.to_string())
    }
}

/// One `[[rules]]` entry: which assets it matches and the chain applied to them
///
/// Chains are written in loader order: the last step listed is applied first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDeclaration {
    /// Display name used in reports and the plan
    #[serde(default)]
    pub name: Option<String>,

    /// Matcher for the assets this rule handles
    #[serde(default)]
    pub test: Option<MatcherDeclaration>,

    /// Assets excluded from this rule
    #[serde(default)]
    pub exclude: Option<MatcherDeclaration>,

    /// Catch-all rule for everything no other rule matched
    #[serde(default)]
    pub fallback: bool,

    /// Higher priorities are routed first; ties keep declaration order
    #[serde(default)]
    pub priority: i32,

    /// Transform chain
    #[serde(rename = "use", default)]
    pub chain: Vec<StepDeclaration>,
}

impl RuleDeclaration {
    /// Rule matching a glob
    pub fn new<S: Into<StepDeclaration>>(
        test: impl Into<String>,
        chain: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: None,
            test: Some(MatcherDeclaration::glob(test)),
            exclude: None,
            fallback: false,
            priority: 0,
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    /// Catch-all rule
    pub fn fallback<S: Into<StepDeclaration>>(chain: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: None,
            test: None,
            exclude: None,
            fallback: true,
            priority: 0,
            chain: chain.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_test(mut self, test: MatcherDeclaration) -> Self {
        self.test = Some(test);
        self
    }

    pub fn with_exclude(mut self, exclude: MatcherDeclaration) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Label used in reports: the name, else the matcher, else the position
    pub fn label(&self, index: usize) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.test, self.fallback) {
            (Some(test), _) => test.pattern().to_string(),
            (None, true) => "fallback".to_string(),
            (None, false) => format!("rule #{}", index + 1),
        }
    }
}
