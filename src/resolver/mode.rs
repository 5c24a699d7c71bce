//! Build modes and the flags each one switches

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build mode, selected once per invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    Production,
}

/// Flag overrides applied for a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEffects {
    pub minify: bool,
    pub verbose_output: bool,
    pub source_maps: bool,
    pub dev_server: bool,
    pub live_reload: bool,
    pub node_env: &'static str,
}

impl BuildMode {
    /// The single mode → effects table
    pub const fn effects(self) -> ModeEffects {
        match self {
            BuildMode::Development => ModeEffects {
                minify: false,
                verbose_output: true,
                source_maps: true,
                dev_server: true,
                live_reload: true,
                node_env: "development",
            },
            BuildMode::Production => ModeEffects {
                minify: true,
                verbose_output: false,
                source_maps: false,
                dev_server: false,
                live_reload: false,
                node_env: "production",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        self.effects().node_env
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!(
                "unknown build mode '{}' (expected development or production)",
                other
            )),
        }
    }
}
