//! Configuration errors reported by the pipeline resolver

use std::fmt;

use thiserror::Error;

use super::matcher::MatcherKind;

/// Why a transform chain was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainProblem {
    #[error("the chain is empty")]
    Empty,

    #[error("sink step '{step}' must be listed first so it is applied last")]
    SinkNotLast { step: String },

    #[error("only one sink step is allowed, found '{first}' and '{second}'")]
    MultipleSinks { first: String, second: String },
}

/// A single rule declaration problem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rules '{first}' and '{second}' declare the same matcher `{matcher}`")]
    DuplicateMatcher {
        first: String,
        second: String,
        matcher: String,
    },

    #[error("fallback rule '{fallback}' is declared before rule '{rule}' and would shadow it")]
    MisorderedFallback { fallback: String, rule: String },

    #[error("rule '{rule}' has an invalid transform chain: {problem}")]
    InvalidTransformChain { rule: String, problem: ChainProblem },

    #[error("rule '{rule}' uses unknown transform '{step}'")]
    UnknownTransformStep { rule: String, step: String },

    #[error("rule '{rule}' step '{step}' has an invalid `{option}` option: {reason}")]
    InvalidStepOption {
        rule: String,
        step: String,
        option: String,
        reason: String,
    },

    #[error("rules '{first}' and '{second}' are both declared as fallback")]
    MultipleFallbacks { first: String, second: String },

    #[error("rule '{rule}' has no matcher and is not a fallback")]
    MissingMatcher { rule: String },

    #[error("fallback rule '{rule}' must not declare a matcher")]
    MatcherOnFallback { rule: String },

    #[error("rule '{rule}' has an invalid {kind} pattern `{pattern}`: {reason}")]
    InvalidPattern {
        rule: String,
        kind: MatcherKind,
        pattern: String,
        reason: String,
    },
}

/// Every problem found in one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigReport {
    errors: Vec<ConfigError>,
}

impl ConfigReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// `Ok(value)` when nothing was reported
    pub fn into_result<T>(self, value: T) -> Result<T, ConfigReport> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration error(s) in rule declarations", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigReport {}
