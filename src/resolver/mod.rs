//! Pipeline resolution
//!
//! Turns rule declarations and a build mode into a validated [`ExecutionPlan`].
//! Resolution is pure: the same declarations and mode always produce the same
//! plan, and every problem is reported at once.

mod error;
mod matcher;
mod mode;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::{Config, RuleDeclaration};
use crate::plan::{
    AssetDirs, AssetRule, DevServerSpec, EmitSpec, ExecutionPlan, HtmlSpec, OutputSpec,
    TransformStep,
};
use crate::transform::{TransformKind, TransformRegistry};

pub use error::{ChainProblem, ConfigError, ConfigReport};
pub use matcher::{Matcher, MatcherKind};
pub use mode::{BuildMode, ModeEffects};

/// Inline threshold used when neither the step nor the output sets one
pub const DEFAULT_INLINE_LIMIT: u64 = 8 * 1024;

/// A declaration whose matchers compiled, before cross-rule validation.
/// Its chain may still have been rejected; those errors are already reported.
struct Candidate {
    index: usize,
    label: String,
    priority: i32,
    matcher: Option<Matcher>,
    exclude: Option<Matcher>,
    fallback: bool,
    steps: Vec<TransformStep>,
}

/// Pipeline resolver
pub struct PipelineResolver {
    /// Project configuration
    config: Arc<Config>,

    /// Known transforms
    registry: TransformRegistry,
}

impl PipelineResolver {
    /// Create a resolver for the given configuration
    pub fn new(config: Arc<Config>) -> Self {
        let registry = config.registry();
        Self { config, registry }
    }

    /// Resolve the rules declared in the configuration
    pub fn resolve_config(&self, mode: BuildMode) -> Result<ExecutionPlan, ConfigReport> {
        self.resolve(&self.config.rules, mode)
    }

    /// Resolve rule declarations for a build mode
    pub fn resolve(
        &self,
        declarations: &[RuleDeclaration],
        mode: BuildMode,
    ) -> Result<ExecutionPlan, ConfigReport> {
        debug!("Resolving {} rule declaration(s) for {}", declarations.len(), mode);

        let mut report = ConfigReport::new();
        let mut candidates = Vec::with_capacity(declarations.len());

        for (index, declaration) in declarations.iter().enumerate() {
            if let Some(candidate) = self.check_declaration(index, declaration, &mut report) {
                candidates.push(candidate);
            }
        }

        // Cross-rule checks also see rules with broken chains
        check_fallbacks(&candidates, &mut report);
        check_duplicates(&candidates, &mut report);
        check_fallback_order(&candidates, &mut report);

        let rules = report.into_result(candidates)?;
        let effects = mode.effects();

        let mut rules = order_rules(rules);
        for rule in &mut rules {
            for step in &mut rule.steps {
                self.apply_mode(step, effects);
            }
        }

        let rules: Vec<AssetRule> = rules
            .into_iter()
            .enumerate()
            .map(|(order, candidate)| self.finish_rule(order, candidate))
            .collect();

        debug!("Resolved {} rule(s)", rules.len());

        Ok(ExecutionPlan {
            output: self.output_spec(mode),
            rules,
        })
    }

    /// Per-declaration checks: matchers, fallback shape, chain.
    ///
    /// Returns `None` only when the matcher shape is unusable for cross-rule
    /// checks.
    fn check_declaration(
        &self,
        index: usize,
        declaration: &RuleDeclaration,
        report: &mut ConfigReport,
    ) -> Option<Candidate> {
        let label = declaration.label(index);
        let mut shape_ok = true;

        let matcher = match (&declaration.test, declaration.fallback) {
            (Some(_), true) => {
                report.push(ConfigError::MatcherOnFallback { rule: label.clone() });
                shape_ok = false;
                None
            }
            (None, false) => {
                report.push(ConfigError::MissingMatcher { rule: label.clone() });
                shape_ok = false;
                None
            }
            (Some(test), false) => compile(test, &label, report, &mut shape_ok),
            (None, true) => None,
        };

        let exclude = declaration
            .exclude
            .as_ref()
            .and_then(|exclude| compile(exclude, &label, report, &mut shape_ok));

        let steps = self.check_chain(declaration, &label, report);

        shape_ok.then(|| Candidate {
            index,
            label,
            priority: declaration.priority,
            matcher,
            exclude,
            fallback: declaration.fallback,
            steps,
        })
    }

    fn check_chain(
        &self,
        declaration: &RuleDeclaration,
        label: &str,
        report: &mut ConfigReport,
    ) -> Vec<TransformStep> {
        if declaration.chain.is_empty() {
            report.push(ConfigError::InvalidTransformChain {
                rule: label.to_string(),
                problem: ChainProblem::Empty,
            });
            return Vec::new();
        }

        let mut steps = Vec::with_capacity(declaration.chain.len());
        for step in &declaration.chain {
            match self.registry.kind_of(step.name()) {
                Some(kind) => steps.push(TransformStep {
                    name: step.name().to_string(),
                    kind,
                    options: step.options(),
                }),
                None => {
                    report.push(ConfigError::UnknownTransformStep {
                        rule: label.to_string(),
                        step: step.name().to_string(),
                    });
                }
            }
        }

        // Sinks consume the chain output, so in loader order they come first
        let sinks: Vec<(usize, &TransformStep)> = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.kind.is_sink())
            .collect();
        if let [(_, first), (_, second), ..] = sinks.as_slice() {
            report.push(ConfigError::InvalidTransformChain {
                rule: label.to_string(),
                problem: ChainProblem::MultipleSinks {
                    first: first.name.clone(),
                    second: second.name.clone(),
                },
            });
        } else if let Some((position, sink)) = sinks.first() {
            if *position != 0 {
                report.push(ConfigError::InvalidTransformChain {
                    rule: label.to_string(),
                    problem: ChainProblem::SinkNotLast {
                        step: sink.name.clone(),
                    },
                });
            }
        }

        for step in steps.iter().filter(|s| s.kind == TransformKind::InlineAsset) {
            if let Some(Err(reason)) = step.options.get("limit").map(inline_limit_option) {
                report.push(ConfigError::InvalidStepOption {
                    rule: label.to_string(),
                    step: step.name.clone(),
                    option: "limit".to_string(),
                    reason,
                });
            }
        }

        steps
    }

    /// Mode-dependent step options
    fn apply_mode(&self, step: &mut TransformStep, effects: ModeEffects) {
        if step.kind == TransformKind::Html {
            let minify = if effects.minify {
                json!({ "collapse_whitespace": true, "remove_comments": true })
            } else {
                Value::Bool(false)
            };
            step.options.insert("minify".to_string(), minify);
        }

        if !effects.verbose_output {
            if let Some(verbose) = step.options.get_mut("verbose") {
                *verbose = Value::Bool(false);
            }
        }

        let targets = &self.config.targets;
        if targets.is_empty() {
            return;
        }
        match step.kind {
            TransformKind::ScriptCompat if !step.options.contains_key("targets") => {
                step.options.insert("targets".to_string(), json!(targets));
            }
            TransformKind::CssCompat if !step.options.contains_key("browsers") => {
                let browsers: Vec<String> = targets
                    .iter()
                    .map(|(browser, version)| format!("{} >= {}", browser, version))
                    .collect();
                step.options.insert("browsers".to_string(), json!(browsers));
            }
            _ => {}
        }
    }

    fn finish_rule(&self, order: usize, candidate: Candidate) -> AssetRule {
        let output = &self.config.output;

        let inline_limit = candidate
            .steps
            .iter()
            .find(|s| s.kind == TransformKind::InlineAsset)
            .and_then(|step| match step.options.get("limit") {
                Some(limit) => inline_limit_option(limit).ok().flatten(),
                None => Some(output.inline_limit.unwrap_or(DEFAULT_INLINE_LIMIT)),
            });

        let emit = candidate
            .steps
            .iter()
            .find(|s| s.kind.emits_files())
            .map(|step| {
                let default_path = if step.kind == TransformKind::InlineAsset {
                    &output.images
                } else {
                    &output.assets
                };
                EmitSpec {
                    name: string_option(step, &["name"])
                        .unwrap_or_else(|| output.asset_name.clone()),
                    output_path: string_option(step, &["output_path", "outputPath"])
                        .unwrap_or_else(|| default_path.clone()),
                }
            });

        AssetRule {
            order,
            name: candidate.label,
            matcher: candidate.matcher,
            exclude: candidate.exclude,
            fallback: candidate.fallback,
            steps: candidate.steps,
            inline_limit,
            emit,
        }
    }

    fn output_spec(&self, mode: BuildMode) -> OutputSpec {
        let config = &self.config;
        let effects = mode.effects();

        let dev_server = effects.dev_server.then(|| DevServerSpec {
            host: config.dev.host.clone(),
            port: config.dev.port,
            content_base: config
                .dev
                .content_base
                .clone()
                .unwrap_or_else(|| config.output.dir.clone()),
            compress: config.dev.compress,
            open: config.dev.open,
            live_reload: effects.live_reload,
        });

        let html = config.html.as_ref().map(|html| HtmlSpec {
            template: html.template.clone(),
            filename: html.filename.clone(),
            minify: effects.minify,
        });

        let mut env = BTreeMap::new();
        env.insert("NODE_ENV".to_string(), effects.node_env.to_string());

        OutputSpec {
            mode,
            entry: config.entry.clone(),
            dir: config.output.dir.clone(),
            filename: config.output.filename.clone(),
            public_path: config.output.public_path.clone(),
            stylesheet: config.output.stylesheet.clone(),
            asset_dirs: AssetDirs {
                images: config.output.images.clone(),
                other: config.output.assets.clone(),
            },
            inline_limit: config.output.inline_limit.unwrap_or(DEFAULT_INLINE_LIMIT),
            html,
            minify: effects.minify,
            verbose: effects.verbose_output,
            source_maps: effects.source_maps,
            env,
            dev_server,
        }
    }
}

fn compile(
    declaration: &crate::config::MatcherDeclaration,
    label: &str,
    report: &mut ConfigReport,
    shape_ok: &mut bool,
) -> Option<Matcher> {
    match Matcher::compile(declaration) {
        Ok(matcher) => Some(matcher),
        Err((kind, reason)) => {
            report.push(ConfigError::InvalidPattern {
                rule: label.to_string(),
                kind,
                pattern: declaration.pattern().to_string(),
                reason,
            });
            *shape_ok = false;
            None
        }
    }
}

/// `limit` of an inline step: a byte count, `true` to always inline or
/// `false` to never inline
fn inline_limit_option(value: &Value) -> Result<Option<u64>, String> {
    match value {
        Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some(u64::MAX)),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("expected a non-negative byte count, found {}", n)),
        other => Err(format!("expected a byte count or boolean, found {}", other)),
    }
}

fn string_option(step: &TransformStep, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| step.options.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn check_fallbacks(candidates: &[Candidate], report: &mut ConfigReport) {
    let mut fallbacks = candidates.iter().filter(|c| c.fallback);
    if let Some(first) = fallbacks.next() {
        for other in fallbacks {
            report.push(ConfigError::MultipleFallbacks {
                first: first.label.clone(),
                second: other.label.clone(),
            });
        }
    }
}

fn check_duplicates(candidates: &[Candidate], report: &mut ConfigReport) {
    for (i, a) in candidates.iter().enumerate() {
        let Some(ma) = &a.matcher else { continue };
        for b in &candidates[i + 1..] {
            let Some(mb) = &b.matcher else { continue };
            if ma.same_as(mb) {
                report.push(ConfigError::DuplicateMatcher {
                    first: a.label.clone(),
                    second: b.label.clone(),
                    matcher: mb.pattern().to_string(),
                });
            }
        }
    }
}

/// A fallback may only precede rules whose assets it excludes
fn check_fallback_order(candidates: &[Candidate], report: &mut ConfigReport) {
    let Some(position) = candidates.iter().position(|c| c.fallback) else {
        return;
    };
    let fallback = &candidates[position];

    for later in &candidates[position + 1..] {
        let Some(matcher) = &later.matcher else { continue };
        let shadowed = match (&fallback.exclude, matcher.extensions()) {
            (Some(exclude), Some(extensions)) => {
                extensions.iter().any(|ext| !exclude.covers_extension(ext))
            }
            _ => true,
        };
        if shadowed {
            report.push(ConfigError::MisorderedFallback {
                fallback: fallback.label.clone(),
                rule: later.label.clone(),
            });
        }
    }
}

/// Higher priority first, declaration order on ties, fallback last
fn order_rules(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let (mut rules, fallback): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|c| !c.fallback);
    rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.index.cmp(&b.index)));
    rules.extend(fallback);
    rules
}

#[cfg(test)]
mod tests;
