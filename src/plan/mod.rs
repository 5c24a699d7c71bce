//! Resolved execution plan
//!
//! The plan is what the external bundler consumes: an ordered rule table and
//! the output options. It also answers where a concrete asset would go.

mod output;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::resolver::Matcher;
use crate::transform::TransformKind;
use crate::utils::{extension_of, normalize_path, render_name};

pub use output::{AssetDirs, DevServerSpec, HtmlSpec, OutputSpec};

/// Raster image types eligible for inline embedding, with their MIME types
const RASTER_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
];

/// MIME type of a raster image extension
pub fn raster_mime(ext: &str) -> Option<&'static str> {
    RASTER_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// One step of a resolved chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformStep {
    /// Name as declared
    pub name: String,
    pub kind: TransformKind,
    pub options: BTreeMap<String, Value>,
}

/// Where and how emitted files are named
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitSpec {
    /// Name template, e.g. `[hash:10].[ext]`
    pub name: String,
    /// Subdirectory of the output directory
    pub output_path: String,
}

/// A validated rule of the plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRule {
    /// Position in the routing table; lower is tried first
    pub order: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<Matcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Matcher>,
    pub fallback: bool,
    /// Steps in loader order: the last step is applied first
    pub steps: Vec<TransformStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emit: Option<EmitSpec>,
}

impl AssetRule {
    /// Whether this rule handles the given `/`-separated path
    pub fn matches(&self, path: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|e| e.is_match(path)) {
            return false;
        }
        match &self.matcher {
            Some(matcher) => matcher.is_match(path),
            None => self.fallback,
        }
    }

    /// Steps in the order data flows through them
    pub fn apply_order(&self) -> impl Iterator<Item = &TransformStep> {
        self.steps.iter().rev()
    }
}

/// What happens to a concrete asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AssetDisposition {
    /// Embedded as a data URI
    Inline { mime: String, size: u64 },
    /// Written to `path` under the output directory
    Emit { file_name: String, path: String },
    /// Consumed by the rule's chain without a file of its own
    Bundled,
}

/// The resolved plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub rules: Vec<AssetRule>,
    pub output: OutputSpec,
}

impl ExecutionPlan {
    /// First rule matching the path
    pub fn route(&self, path: &Path) -> Option<&AssetRule> {
        let normalized = normalize_path(path);
        self.rules.iter().find(|rule| rule.matches(&normalized))
    }

    /// Decide how an asset with the given content is emitted
    pub fn disposition(&self, path: &Path, content: &[u8]) -> Option<AssetDisposition> {
        let rule = self.route(path)?;
        let size = content.len() as u64;
        let mime = extension_of(path).and_then(|ext| raster_mime(&ext));

        if let (Some(limit), Some(mime)) = (rule.inline_limit, mime) {
            if size < limit {
                return Some(AssetDisposition::Inline {
                    mime: mime.to_string(),
                    size,
                });
            }
        }

        Some(match &rule.emit {
            Some(emit) => {
                let file_name = render_name(&emit.name, path, content);
                let path = if emit.output_path.is_empty() {
                    file_name.clone()
                } else {
                    format!("{}/{}", emit.output_path.trim_end_matches('/'), file_name)
                };
                AssetDisposition::Emit { file_name, path }
            }
            None => AssetDisposition::Bundled,
        })
    }

    /// Serialize the plan for the bundler
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
