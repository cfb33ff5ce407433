use codecontext::matcher::{clean_path, match_glob, PathMatcher, DEFAULT_EXCLUDES};

#[test]
fn test_normalize_idempotent() {
    let matcher = PathMatcher::new();
    for path in [
        "src/./app/../lib/util.ts",
        "a//b///c",
        "./relative/path.go",
        "/abs/path/file.rs",
    ] {
        let once = matcher.normalize(path);
        let twice = matcher.normalize(&once);
        assert_eq!(once, twice, "normalize not idempotent for {path}");

        let once = matcher.normalize_for_pattern(path);
        let twice = matcher.normalize_for_pattern(&once);
        assert_eq!(once, twice, "normalize_for_pattern not idempotent for {path}");
    }
}

#[test]
fn test_separator_neutrality() {
    let matcher = PathMatcher::new();
    assert_eq!(
        matcher.normalize_for_pattern("src\\app\\main.ts"),
        matcher.normalize_for_pattern("src/app/main.ts")
    );
    assert_eq!(
        matcher.normalize_for_pattern("a\\b/c\\d.go"),
        matcher.normalize_for_pattern("a/b/c/d.go")
    );
}

#[test]
fn test_default_excludes_apply() {
    let matcher = PathMatcher::new();
    assert!(matcher.should_skip("node_modules/react/index.js"));
    assert!(matcher.should_skip("dist/app.js"));
    assert!(matcher.should_skip("target/debug/build.rs"));
    assert!(!matcher.should_skip("src/index.ts"));
}

#[test]
fn test_default_excludes_can_be_disabled() {
    let matcher = PathMatcher::new();
    matcher.set_use_default_excludes(false);
    assert!(!matcher.should_skip("node_modules/react/index.js"));
}

#[test]
fn test_negation_precedence() {
    let matcher = PathMatcher::new();
    matcher.set_exclude_patterns(vec![
        "vendor/**".to_string(),
        "!vendor/our-company/**".to_string(),
    ]);
    assert!(matcher.should_skip("vendor/third/x.go"));
    // Include patterns win regardless of exclude matches.
    assert!(!matcher.should_skip("vendor/our-company/y.go"));
    assert!(!matcher.should_skip("src/main.go"));
}

#[test]
fn test_double_star_matches_nested() {
    let matcher = PathMatcher::new();
    matcher.set_use_default_excludes(false);
    matcher.set_exclude_patterns(vec!["**/*.test.*".to_string()]);
    assert!(matcher.should_skip("src/a.test.ts"));
    assert!(matcher.should_skip("deep/nested/b.test.js"));
    assert!(!matcher.should_skip("src/a.ts"));
}

#[test]
fn test_merged_cache_cold_and_warm_agree() {
    let matcher = PathMatcher::new();
    matcher.set_exclude_patterns(vec!["build/**".to_string()]);
    let paths = ["build/out.js", "src/ok.ts", "build/deep/x.ts"];
    let cold: Vec<bool> = paths.iter().map(|p| matcher.should_skip(p)).collect();
    let warm: Vec<bool> = paths.iter().map(|p| matcher.should_skip(p)).collect();
    assert_eq!(cold, warm);
}

#[test]
fn test_pattern_invalidation_on_update() {
    let matcher = PathMatcher::new();
    matcher.set_use_default_excludes(false);
    matcher.set_exclude_patterns(vec!["docs/**".to_string()]);
    assert!(matcher.should_skip("docs/guide.md"));

    matcher.set_exclude_patterns(vec!["media/**".to_string()]);
    assert!(!matcher.should_skip("docs/guide.md"));
    assert!(matcher.should_skip("media/logo.png"));
}

#[test]
fn test_traversal_defense_sensitive_paths() {
    let matcher = PathMatcher::new();
    assert!(matcher.validate_import("../../etc/passwd", "/project/src").is_err());
    assert!(matcher.validate_import("../../bin/sh", "/project/src").is_err());
    assert!(matcher.validate_import("../../sbin/init", "/project/src").is_err());
}

#[test]
fn test_traversal_defense_upward_limit() {
    let matcher = PathMatcher::new();
    // Up to two upward segments are fine.
    assert!(matcher.validate_import("../../shared/util", "/project/a/b").is_ok());
    assert!(matcher
        .validate_import("../../../outside/util", "/project/a/b")
        .is_err());
}

#[test]
fn test_relative_sibling_import_ok() {
    let matcher = PathMatcher::new();
    assert!(matcher.validate_import("./b", "/project/src").is_ok());
    assert!(matcher.validate_import("../lib/helper", "/project/src").is_ok());
}

#[test]
fn test_clean_path_edges() {
    assert_eq!(clean_path(""), ".");
    assert_eq!(clean_path("."), ".");
    assert_eq!(clean_path("a/b/../c"), "a/c");
    assert_eq!(clean_path("/a/./b"), "/a/b");
}

#[test]
fn test_match_glob_basics() {
    assert!(match_glob("*.ts", "main.ts").unwrap());
    assert!(match_glob("src/**/*.ts", "src/deep/nested/mod.ts").unwrap());
    assert!(!match_glob("src/**/*.ts", "lib/mod.ts").unwrap());
    assert!(match_glob("**/node_modules/**", "a/node_modules/b/c.js").unwrap());
}

#[test]
fn test_malformed_pattern_is_error() {
    assert!(match_glob("[unclosed", "anything").is_err());
}

#[test]
fn test_default_exclude_list_has_common_entries() {
    assert!(DEFAULT_EXCLUDES.iter().any(|p| p.contains("node_modules")));
    assert!(DEFAULT_EXCLUDES.iter().any(|p| p.contains(".git")));
}
