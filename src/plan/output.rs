//! Output options handed to the bundler alongside the rules

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

use crate::resolver::BuildMode;

/// Environment-dependent output options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    pub mode: BuildMode,

    /// Script entry point, relative to the project root
    pub entry: String,

    /// Output directory, relative to the project root
    pub dir: String,

    /// Script bundle filename pattern
    pub filename: String,

    pub public_path: String,

    /// Extracted stylesheet filename
    pub stylesheet: String,

    /// Per-asset-type output subdirectories
    pub asset_dirs: AssetDirs,

    /// Assets below this many bytes are inlined
    pub inline_limit: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<HtmlSpec>,

    pub minify: bool,
    pub verbose: bool,
    pub source_maps: bool,

    /// Environment variables defined for the build
    pub env: BTreeMap<String, String>,

    /// Present only in development builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetDirs {
    pub images: String,
    pub other: String,
}

/// Generated HTML page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlSpec {
    pub template: String,
    pub filename: String,
    pub minify: bool,
}

/// Dev-server options, passed through unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevServerSpec {
    pub host: String,
    pub port: u16,
    pub content_base: String,
    pub compress: bool,
    pub open: bool,
    pub live_reload: bool,
}

impl DevServerSpec {
    /// URL the dev server will listen on
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
    }
}
