//! Compiled asset matchers
//!
//! Globs are matched against the whole `/`-separated path with `*` crossing
//! directory boundaries, so `*.less` matches `src/styles/a.less`. Regexes are
//! searched anywhere in the path, like bundler `test` expressions.

use std::collections::BTreeSet;
use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{MatcherDeclaration, TaggedMatcher};

/// `*.ext`, `**/*.ext`, `*.{a,b}`
static GLOB_EXTENSIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\*/)?\*\.(?:\{([A-Za-z0-9,]+)\}|([A-Za-z0-9]+))$").unwrap()
});

/// `\.ext$`, `\.(a|b)$`, `\.(?:a|b)$`
static REGEX_EXTENSIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\\\.(?:\((?:\?:)?([A-Za-z0-9|]+)\)|([A-Za-z0-9]+))\$$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Glob,
    Regex,
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatcherKind::Glob => f.write_str("glob"),
            MatcherKind::Regex => f.write_str("regex"),
        }
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Glob(GlobMatcher),
    Regex(Regex),
}

/// A compiled glob or regex over asset paths
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: MatcherKind,
    pattern: String,
    compiled: Compiled,
}

impl Matcher {
    /// Compile a declared matcher; the error is a human-readable reason
    pub fn compile(declaration: &MatcherDeclaration) -> Result<Self, (MatcherKind, String)> {
        match declaration {
            MatcherDeclaration::Glob(pattern)
            | MatcherDeclaration::Tagged(TaggedMatcher::Glob(pattern)) => {
                let glob = GlobBuilder::new(pattern)
                    .literal_separator(false)
                    .build()
                    .map_err(|e| (MatcherKind::Glob, e.kind().to_string()))?;
                Ok(Self {
                    kind: MatcherKind::Glob,
                    pattern: pattern.clone(),
                    compiled: Compiled::Glob(glob.compile_matcher()),
                })
            }
            MatcherDeclaration::Tagged(TaggedMatcher::Regex(pattern)) => {
                let regex = Regex::new(pattern)
                    .map_err(|e| (MatcherKind::Regex, e.to_string()))?;
                Ok(Self {
                    kind: MatcherKind::Regex,
                    pattern: pattern.clone(),
                    compiled: Compiled::Regex(regex),
                })
            }
        }
    }

    pub fn kind(&self) -> MatcherKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Test a `/`-separated path
    pub fn is_match(&self, path: &str) -> bool {
        match &self.compiled {
            Compiled::Glob(glob) => glob.is_match(path),
            Compiled::Regex(regex) => regex.is_match(path),
        }
    }

    /// The literal extensions this matcher selects, when statically known.
    /// Case is kept since matching is case-sensitive.
    pub fn extensions(&self) -> Option<BTreeSet<String>> {
        let (re, separator) = match self.kind {
            MatcherKind::Glob => (&*GLOB_EXTENSIONS, ','),
            MatcherKind::Regex => (&*REGEX_EXTENSIONS, '|'),
        };
        let caps = re.captures(&self.pattern)?;
        let list = caps.get(1).or_else(|| caps.get(2))?.as_str();

        Some(
            list.split(separator)
                .filter(|ext| !ext.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Two matchers are the same when their sources agree or they select
    /// the same known extension set
    pub fn same_as(&self, other: &Matcher) -> bool {
        if self == other {
            return true;
        }
        match (self.extensions(), other.extensions()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Whether every path with extension `ext` is matched
    pub fn covers_extension(&self, ext: &str) -> bool {
        self.is_match(&format!("asset.{}", ext))
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.pattern == other.pattern
    }
}

impl Eq for Matcher {}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.pattern)
    }
}

impl Serialize for Matcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Matcher", 2)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("pattern", &self.pattern)?;
        state.end()
    }
}
