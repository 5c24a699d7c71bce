use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::config::{Config, HtmlConfig, MatcherDeclaration, StepDeclaration};
use crate::plan::AssetDisposition;

fn resolver() -> PipelineResolver {
    PipelineResolver::new(Arc::new(Config::default_config()))
}

fn resolver_with(edit: impl FnOnce(&mut Config)) -> PipelineResolver {
    let mut config = Config::default_config();
    edit(&mut config);
    PipelineResolver::new(Arc::new(config))
}

fn step(name: &str, options: serde_json::Value) -> StepDeclaration {
    let options: BTreeMap<String, serde_json::Value> =
        serde_json::from_value(options).unwrap();
    StepDeclaration::with_options(name, options)
}

fn classic_rules() -> Vec<RuleDeclaration> {
    vec![
        RuleDeclaration::new("*.less", ["extractStyle", "compileCss", "compileLess"]).named("less"),
        RuleDeclaration::new("*.css", ["extractStyle", "compileCss"]).named("css"),
        RuleDeclaration::fallback(["emitFile"]).named("fallback"),
    ]
}

fn image_rules() -> Vec<RuleDeclaration> {
    vec![
        RuleDeclaration::new("*.{jpg,png,gif}", [step(
            "url-loader",
            json!({ "limit": 8192, "name": "[hash:10].[ext]", "output_path": "imgs" }),
        )])
        .named("images"),
        RuleDeclaration::fallback(["file-loader"])
            .named("other")
            .with_exclude(MatcherDeclaration::regex(r"\.(jpg|png|gif)$")),
    ]
}

fn errors_of(result: Result<ExecutionPlan, ConfigReport>) -> Vec<ConfigError> {
    result.unwrap_err().errors().to_vec()
}

fn names(plan: &ExecutionPlan) -> Vec<&str> {
    plan.rules.iter().map(|r| r.name.as_str()).collect()
}

#[test]
fn test_end_to_end_development() {
    let plan = resolver()
        .resolve(&classic_rules(), BuildMode::Development)
        .unwrap();

    assert_eq!(names(&plan), vec!["less", "css", "fallback"]);

    let less: Vec<&str> = plan.rules[0].steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(less, vec!["extractStyle", "compileCss", "compileLess"]);
    let css: Vec<&str> = plan.rules[1].steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(css, vec!["extractStyle", "compileCss"]);

    assert!(plan.rules[2].fallback);
    let dev = plan.output.dev_server.as_ref().unwrap();
    assert_eq!(dev.port, 9960);
    assert!(dev.live_reload);
    assert!(!plan.output.minify);
}

#[test]
fn test_rules_follow_declaration_order_without_fallback() {
    let declarations = vec![
        RuleDeclaration::new("*.js", ["babel-loader"]),
        RuleDeclaration::new("*.html", ["html-loader"]),
        RuleDeclaration::new("*.css", ["style-loader", "css-loader"]),
    ];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    assert_eq!(names(&plan), vec!["*.js", "*.html", "*.css"]);
    let orders: Vec<usize> = plan.rules.iter().map(|r| r.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn test_fallback_moved_last_when_it_excludes_later_rules() {
    let declarations = vec![
        RuleDeclaration::fallback(["file-loader"])
            .named("other")
            .with_exclude(MatcherDeclaration::regex(r"\.(css|less)$")),
        RuleDeclaration::new("*.less", ["mini-css-extract", "css-loader", "less-loader"]).named("less"),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
    ];
    let plan = resolver().resolve(&declarations, BuildMode::Development).unwrap();

    assert_eq!(names(&plan), vec!["less", "css", "other"]);
}

#[test]
fn test_fallback_before_overlapping_rule_is_misordered() {
    let declarations = vec![
        RuleDeclaration::fallback(["file-loader"])
            .named("other")
            .with_exclude(MatcherDeclaration::regex(r"\.(css)$")),
        RuleDeclaration::new("*.less", ["mini-css-extract", "css-loader", "less-loader"]).named("less"),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Development));
    assert_eq!(
        errors,
        vec![ConfigError::MisorderedFallback {
            fallback: "other".into(),
            rule: "less".into(),
        }]
    );
}

#[test]
fn test_fallback_without_exclude_shadows_everything_after_it() {
    let declarations = vec![
        RuleDeclaration::fallback(["file-loader"]),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert!(matches!(errors.as_slice(), [ConfigError::MisorderedFallback { .. }]));
}

#[test]
fn test_resolve_is_idempotent() {
    let resolver = resolver();
    let mut declarations = image_rules();
    declarations.truncate(1);
    declarations.extend(classic_rules());

    for mode in [BuildMode::Development, BuildMode::Production] {
        let first = resolver.resolve(&declarations, mode).unwrap();
        let second = resolver.resolve(&declarations, mode).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }
}

#[test]
fn test_duplicate_matchers_rejected() {
    let declarations = vec![
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("a"),
        RuleDeclaration::new("*.css", ["style-loader", "css-loader"]).named("b"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(
        errors,
        vec![ConfigError::DuplicateMatcher {
            first: "a".into(),
            second: "b".into(),
            matcher: "*.css".into(),
        }]
    );
}

#[test]
fn test_equivalent_glob_and_regex_are_duplicates() {
    let declarations = vec![
        RuleDeclaration::new("*.{png,jpg}", ["url-loader"]).named("glob"),
        RuleDeclaration::new("unused", ["file-loader"])
            .named("regex")
            .with_test(MatcherDeclaration::regex(r"\.(jpg|png)$")),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert!(matches!(errors.as_slice(), [ConfigError::DuplicateMatcher { .. }]));
}

#[test]
fn test_small_images_inline_large_images_emit() {
    let plan = resolver()
        .resolve(&image_rules(), BuildMode::Production)
        .unwrap();
    assert_eq!(plan.rules[0].inline_limit, Some(8192));

    let small = vec![7u8; 4096];
    assert_eq!(
        plan.disposition(Path::new("src/imgs/icon.png"), &small),
        Some(AssetDisposition::Inline {
            mime: "image/png".into(),
            size: 4096,
        })
    );

    let large = vec![9u8; 10240];
    match plan.disposition(Path::new("src/imgs/photo.jpg"), &large) {
        Some(AssetDisposition::Emit { file_name, path }) => {
            let (hash, ext) = file_name.split_once('.').unwrap();
            assert_eq!(hash.len(), 10);
            assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(ext, "jpg");
            assert_eq!(path, format!("imgs/{}", file_name));
        }
        other => panic!("expected emission, got {:?}", other),
    }
}

#[test]
fn test_threshold_boundary_emits() {
    let plan = resolver()
        .resolve(&image_rules(), BuildMode::Production)
        .unwrap();

    let exact = vec![0u8; 8192];
    assert!(matches!(
        plan.disposition(Path::new("a.gif"), &exact),
        Some(AssetDisposition::Emit { .. })
    ));
}

#[test]
fn test_inline_limit_falls_back_to_output_override_then_default() {
    let declarations = vec![RuleDeclaration::new("*.png", ["url-loader"])];

    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();
    assert_eq!(plan.rules[0].inline_limit, Some(DEFAULT_INLINE_LIMIT));
    assert_eq!(plan.output.inline_limit, DEFAULT_INLINE_LIMIT);

    let plan = resolver_with(|c| c.output.inline_limit = Some(2048))
        .resolve(&declarations, BuildMode::Production)
        .unwrap();
    assert_eq!(plan.rules[0].inline_limit, Some(2048));
    assert_eq!(plan.rules[0].emit.as_ref().unwrap().output_path, "imgs");
    assert_eq!(plan.rules[0].emit.as_ref().unwrap().name, "[hash:10].[ext]");
}

#[test]
fn test_production_output() {
    let resolver = resolver_with(|c| {
        c.html = Some(HtmlConfig {
            template: "src/index.html".into(),
            filename: "index.html".into(),
        })
    });
    let plan = resolver.resolve(&classic_rules(), BuildMode::Production).unwrap();

    assert!(plan.output.minify);
    assert!(!plan.output.verbose);
    assert!(plan.output.dev_server.is_none());
    assert!(plan.output.html.as_ref().unwrap().minify);
    assert_eq!(plan.output.env["NODE_ENV"], "production");
}

#[test]
fn test_development_output() {
    let resolver = resolver_with(|c| {
        c.dev.port = 4000;
        c.dev.open = true;
    });
    let plan = resolver.resolve(&classic_rules(), BuildMode::Development).unwrap();

    assert!(!plan.output.minify);
    assert!(plan.output.source_maps);
    assert_eq!(plan.output.env["NODE_ENV"], "development");

    let dev = plan.output.dev_server.unwrap();
    assert_eq!(dev.port, 4000);
    assert!(dev.open);
    assert!(dev.compress);
    assert_eq!(dev.content_base, "build");
}

#[test]
fn test_html_steps_follow_mode() {
    let declarations = vec![RuleDeclaration::new(
        "*.html",
        [step("html-loader", json!({ "verbose": true }))],
    )];

    let prod = resolver().resolve(&declarations, BuildMode::Production).unwrap();
    let options = &prod.rules[0].steps[0].options;
    assert_eq!(
        options["minify"],
        json!({ "collapse_whitespace": true, "remove_comments": true })
    );
    assert_eq!(options["verbose"], json!(false));

    let dev = resolver().resolve(&declarations, BuildMode::Development).unwrap();
    let options = &dev.rules[0].steps[0].options;
    assert_eq!(options["minify"], json!(false));
    assert_eq!(options["verbose"], json!(true));
}

#[test]
fn test_compat_targets_injected_unless_declared() {
    let resolver = resolver_with(|c| {
        c.targets.insert("chrome".into(), "60".into());
        c.targets.insert("ie".into(), "9".into());
    });
    let declarations = vec![
        RuleDeclaration::new("*.js", ["babel-loader"]),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader", "postcss-loader"]),
        RuleDeclaration::new("*.mjs", [step("babel-loader", json!({ "targets": "defaults" }))]),
    ];
    let plan = resolver.resolve(&declarations, BuildMode::Production).unwrap();

    assert_eq!(
        plan.rules[0].steps[0].options["targets"],
        json!({ "chrome": "60", "ie": "9" })
    );
    assert_eq!(
        plan.rules[1].steps[2].options["browsers"],
        json!(["chrome >= 60", "ie >= 9"])
    );
    assert_eq!(plan.rules[2].steps[0].options["targets"], json!("defaults"));
}

#[test]
fn test_priority_reorders_stably() {
    let declarations = vec![
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
        RuleDeclaration::fallback(["file-loader"]).named("other").with_priority(100),
        RuleDeclaration::new("*.js", ["babel-loader"]).named("js"),
        RuleDeclaration::new("vendor/**", ["file-loader"]).named("vendor").with_priority(10),
        RuleDeclaration::new("*.html", ["html-loader"]).named("html"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(errors.len(), 3);

    let declarations = vec![
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
        RuleDeclaration::new("*.js", ["babel-loader"]).named("js"),
        RuleDeclaration::new("vendor/**", ["file-loader"]).named("vendor").with_priority(10),
        RuleDeclaration::new("*.html", ["html-loader"]).named("html"),
        RuleDeclaration::fallback(["file-loader"]).named("other").with_priority(100),
    ];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    assert_eq!(names(&plan), vec!["vendor", "css", "js", "html", "other"]);
    assert_eq!(
        plan.route(Path::new("vendor/lib.js")).map(|r| r.name.as_str()),
        Some("vendor")
    );
}

#[test]
fn test_apply_order_is_reverse_of_declaration() {
    let plan = resolver()
        .resolve(&classic_rules(), BuildMode::Development)
        .unwrap();

    let applied: Vec<&str> = plan.rules[0].apply_order().map(|s| s.name.as_str()).collect();
    assert_eq!(applied, vec!["compileLess", "compileCss", "extractStyle"]);
}

#[test]
fn test_chain_problems() {
    let declarations = vec![
        RuleDeclaration::new("*.css", Vec::<&str>::new()).named("empty"),
        RuleDeclaration::new("*.less", ["css-loader", "mini-css-extract"]).named("sink-late"),
        RuleDeclaration::new("*.sass", ["style-loader", "mini-css-extract", "sass-loader"])
            .named("two-sinks"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(
        errors,
        vec![
            ConfigError::InvalidTransformChain {
                rule: "empty".into(),
                problem: ChainProblem::Empty,
            },
            ConfigError::InvalidTransformChain {
                rule: "sink-late".into(),
                problem: ChainProblem::SinkNotLast {
                    step: "mini-css-extract".into(),
                },
            },
            ConfigError::InvalidTransformChain {
                rule: "two-sinks".into(),
                problem: ChainProblem::MultipleSinks {
                    first: "style-loader".into(),
                    second: "mini-css-extract".into(),
                },
            },
        ]
    );
}

#[test]
fn test_unknown_step_and_custom_registration() {
    let declarations = vec![RuleDeclaration::new("*.vue", ["vue-loader"]).named("vue")];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(
        errors,
        vec![ConfigError::UnknownTransformStep {
            rule: "vue".into(),
            step: "vue-loader".into(),
        }]
    );

    let resolver = resolver_with(|c| {
        c.transforms.push(crate::config::TransformDeclaration {
            name: "vue-loader".into(),
            kind: TransformKind::Preprocess,
        })
    });
    assert!(resolver.resolve(&declarations, BuildMode::Production).is_ok());
}

#[test]
fn test_errors_are_collected_not_fail_fast() {
    let declarations = vec![
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("a"),
        RuleDeclaration::new("*.css", ["nope-loader"]).named("b"),
        RuleDeclaration::new("[", ["file-loader"]).named("broken"),
        RuleDeclaration::fallback(["file-loader"]).named("f1"),
        RuleDeclaration::fallback(["file-loader"]).named("f2"),
        RuleDeclaration {
            test: None,
            ..RuleDeclaration::new("x", ["file-loader"])
        },
        RuleDeclaration::fallback(["file-loader"])
            .named("f3")
            .with_test(MatcherDeclaration::glob("*.txt")),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Development));

    assert!(errors.contains(&ConfigError::UnknownTransformStep {
        rule: "b".into(),
        step: "nope-loader".into(),
    }));
    assert!(errors.contains(&ConfigError::DuplicateMatcher {
        first: "a".into(),
        second: "b".into(),
        matcher: "*.css".into(),
    }));
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidPattern { rule, kind: MatcherKind::Glob, .. } if rule == "broken")));
    assert!(errors.contains(&ConfigError::MultipleFallbacks {
        first: "f1".into(),
        second: "f2".into(),
    }));
    assert!(errors.contains(&ConfigError::MissingMatcher {
        rule: "rule #6".into(),
    }));
    assert!(errors.contains(&ConfigError::MatcherOnFallback { rule: "f3".into() }));
}

#[test]
fn test_routing_first_match_with_exclude() {
    let declarations = vec![
        RuleDeclaration::new("*.js", ["babel-loader"])
            .named("scripts")
            .with_exclude(MatcherDeclaration::regex("node_modules")),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
        RuleDeclaration::fallback(["file-loader"])
            .named("other")
            .with_exclude(MatcherDeclaration::regex(r"\.(css|js|html)$")),
    ];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    let route = |p: &str| plan.route(Path::new(p)).map(|r| r.name.clone());
    assert_eq!(route("src/index.js").as_deref(), Some("scripts"));
    assert_eq!(route("node_modules/lib/index.js"), None);
    assert_eq!(route("src/app.css").as_deref(), Some("css"));
    assert_eq!(route("src/font.woff2").as_deref(), Some("other"));
    assert_eq!(route("src/index.html"), None);
}

#[test]
fn test_fallback_assets_emit_under_assets_dir() {
    let plan = resolver()
        .resolve(&image_rules(), BuildMode::Production)
        .unwrap();

    match plan.disposition(Path::new("src/font.woff"), b"font-bytes") {
        Some(AssetDisposition::Emit { path, .. }) => assert!(path.starts_with("assets/")),
        other => panic!("expected emission, got {:?}", other),
    }

    let styles = vec![RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"])];
    let plan = resolver().resolve(&styles, BuildMode::Production).unwrap();
    assert_eq!(
        plan.disposition(Path::new("a.css"), b"body{}"),
        Some(AssetDisposition::Bundled)
    );
    assert_eq!(plan.disposition(Path::new("a.txt"), b""), None);
}

#[test]
fn test_broken_chain_still_takes_part_in_duplicate_check() {
    let declarations = vec![
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("a"),
        RuleDeclaration::new("*.css", ["nope-loader"]).named("b"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(
        errors,
        vec![
            ConfigError::UnknownTransformStep {
                rule: "b".into(),
                step: "nope-loader".into(),
            },
            ConfigError::DuplicateMatcher {
                first: "a".into(),
                second: "b".into(),
                matcher: "*.css".into(),
            },
        ]
    );
}

#[test]
fn test_broken_fallback_chain_still_reports_misordering() {
    let declarations = vec![
        RuleDeclaration::fallback(["nope-loader"]).named("other"),
        RuleDeclaration::new("*.css", ["mini-css-extract", "css-loader"]).named("css"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Development));
    assert_eq!(
        errors,
        vec![
            ConfigError::UnknownTransformStep {
                rule: "other".into(),
                step: "nope-loader".into(),
            },
            ConfigError::MisorderedFallback {
                fallback: "other".into(),
                rule: "css".into(),
            },
        ]
    );
}

#[test]
fn test_extension_case_distinguishes_rules() {
    let declarations = vec![
        RuleDeclaration::new("*.png", ["url-loader"]).named("lower"),
        RuleDeclaration::new("*.PNG", ["file-loader"]).named("upper"),
    ];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    let route = |p: &str| plan.route(Path::new(p)).map(|r| r.name.clone());
    assert_eq!(route("src/icon.png").as_deref(), Some("lower"));
    assert_eq!(route("src/Icon.PNG").as_deref(), Some("upper"));
}

#[test]
fn test_inline_limit_false_never_inlines() {
    let declarations = vec![RuleDeclaration::new("*.png", [step(
        "url-loader",
        json!({ "limit": false }),
    )])];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    assert_eq!(plan.rules[0].inline_limit, None);
    assert!(matches!(
        plan.disposition(Path::new("tiny.png"), &[0u8; 16]),
        Some(AssetDisposition::Emit { ref path, .. }) if path.starts_with("imgs/")
    ));
}

#[test]
fn test_inline_limit_true_always_inlines() {
    let declarations = vec![RuleDeclaration::new("*.png", [step(
        "url-loader",
        json!({ "limit": true }),
    )])];
    let plan = resolver().resolve(&declarations, BuildMode::Production).unwrap();

    assert!(matches!(
        plan.disposition(Path::new("big.png"), &vec![0u8; 64 * 1024]),
        Some(AssetDisposition::Inline { .. })
    ));
}

#[test]
fn test_malformed_inline_limit_is_reported() {
    let declarations = vec![
        RuleDeclaration::new("*.png", [step("url-loader", json!({ "limit": "8kb" }))])
            .named("png"),
        RuleDeclaration::new("*.gif", [step("url-loader", json!({ "limit": -1 }))])
            .named("gif"),
    ];

    let errors = errors_of(resolver().resolve(&declarations, BuildMode::Production));
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(
        e,
        ConfigError::InvalidStepOption { step, option, .. }
            if step == "url-loader" && option == "limit"
    )));
}
