//! Transform registry
//!
//! Catalogue of the external transforms a plan may reference. The transforms
//! themselves run inside the bundler; here we only know their names and the
//! role each one plays in a chain.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Role of a transform inside a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    /// Pulls compiled CSS into a stylesheet or a `<style>` tag
    StyleSink,
    /// Resolves `@import`/`url()` and turns CSS into a module
    CssCompile,
    /// Rewrites CSS for the target browser matrix
    CssCompat,
    /// Compiles a CSS dialect (LESS, SASS) to CSS
    Preprocess,
    /// Embeds small assets as data URIs, emits the rest
    InlineAsset,
    /// Copies the asset to the output directory
    EmitFile,
    /// Processes HTML documents
    Html,
    /// Down-levels script syntax for the target browser matrix
    ScriptCompat,
    /// Source linting
    Lint,
}

impl TransformKind {
    /// Sinks consume the chain's output and must be applied last
    pub fn is_sink(self) -> bool {
        matches!(
            self,
            TransformKind::StyleSink | TransformKind::InlineAsset | TransformKind::EmitFile
        )
    }

    /// Whether the step produces output files with a name template
    pub fn emits_files(self) -> bool {
        matches!(self, TransformKind::InlineAsset | TransformKind::EmitFile)
    }
}

/// Built-in transforms: canonical name, aliases, role
const BUILTIN: &[(&str, &[&str], TransformKind)] = &[
    ("mini-css-extract", &["extractStyle", "mini-css-extract-plugin"], TransformKind::StyleSink),
    ("style-loader", &["injectStyle"], TransformKind::StyleSink),
    ("css-loader", &["compileCss"], TransformKind::CssCompile),
    ("postcss-loader", &["cssCompat"], TransformKind::CssCompat),
    ("less-loader", &["compileLess"], TransformKind::Preprocess),
    ("sass-loader", &["compileSass"], TransformKind::Preprocess),
    ("url-loader", &["inlineAsset"], TransformKind::InlineAsset),
    ("file-loader", &["emitFile"], TransformKind::EmitFile),
    ("html-loader", &["compileHtml"], TransformKind::Html),
    ("babel-loader", &["transpileJs"], TransformKind::ScriptCompat),
    ("eslint-loader", &["lintJs"], TransformKind::Lint),
];

static BUILTIN_REGISTRY: Lazy<TransformRegistry> = Lazy::new(|| {
    let mut registry = TransformRegistry {
        entries: BTreeMap::new(),
    };
    for (name, aliases, kind) in BUILTIN {
        registry.register(name, *kind);
        for alias in *aliases {
            registry.register(alias, *kind);
        }
    }
    registry
});

/// Registry of known transform names
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    entries: BTreeMap<String, TransformKind>,
}

impl TransformRegistry {
    /// Registry holding only the built-in transforms
    pub fn builtin() -> Self {
        BUILTIN_REGISTRY.clone()
    }

    /// Register an additional transform, replacing any previous role
    pub fn register(&mut self, name: &str, kind: TransformKind) {
        if self.entries.insert(name.to_string(), kind).is_some() {
            debug!("Transform '{}' re-registered as {:?}", name, kind);
        }
    }

    /// Look up the role of a transform
    pub fn kind_of(&self, name: &str) -> Option<TransformKind> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
