//! Glob matching primitives used by the `PathMatcher`.
//!
//! Patterns without `**` are delegated to [`glob::Pattern`] directly.
//! Patterns containing `**` are split into path segments and matched by a
//! recursive two-index walk where `**` consumes zero or more segments.

use glob::{MatchOptions, Pattern};

use crate::errors::{AnalyzerError, Result};

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    }
}

/// Matches a single glob pattern against a forward-slash path.
///
/// Returns an error for malformed patterns (unbalanced brackets, trailing
/// escape); callers treat those as non-matching and report them once.
pub fn match_glob(pattern: &str, path: &str) -> Result<bool> {
    if pattern.contains("**") {
        let pat_segs: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let path_segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&pat_segs, &path_segs)
    } else {
        let compiled = compile(pattern)?;
        Ok(compiled.matches_with(path, match_options()))
    }
}

/// Compiles a pattern, mapping glob's error into the analyzer error type.
fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| AnalyzerError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Recursive segment matcher: `**` matches zero or more path segments,
/// other segments are matched by a single-segment glob (`*`, `?`, `[…]`).
///
/// Recursion depth is bounded by the number of path segments.
fn match_segments(pat: &[&str], path: &[&str]) -> Result<bool> {
    match pat.first() {
        None => Ok(path.is_empty()),
        Some(&"**") => {
            // Try zero, then one, then more skipped segments.
            for skip in 0..=path.len() {
                if match_segments(&pat[1..], &path[skip..])? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some(seg) => {
            let Some(first) = path.first() else {
                return Ok(false);
            };
            let compiled = compile(seg)?;
            if compiled.matches_with(first, match_options()) {
                match_segments(&pat[1..], &path[1..])
            } else {
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_glob() {
        assert!(match_glob("*.rs", "main.rs").unwrap());
        assert!(!match_glob("*.rs", "main.go").unwrap());
    }

    #[test]
    fn test_double_star_zero_segments() {
        assert!(match_glob("src/**/a.ts", "src/a.ts").unwrap());
    }

    #[test]
    fn test_double_star_many_segments() {
        assert!(match_glob("**/*.test.*", "deep/nested/b.test.js").unwrap());
        assert!(match_glob("**/*.test.*", "src/a.test.ts").unwrap());
        assert!(!match_glob("**/*.test.*", "src/a.ts").unwrap());
    }

    #[test]
    fn test_double_star_prefix() {
        assert!(match_glob("vendor/**", "vendor/third/x.go").unwrap());
        assert!(!match_glob("vendor/**", "src/main.go").unwrap());
    }

    #[test]
    fn test_question_and_class() {
        assert!(match_glob("a?.rs", "ab.rs").unwrap());
        assert!(match_glob("[abc].rs", "b.rs").unwrap());
        assert!(!match_glob("[abc].rs", "d.rs").unwrap());
    }

    #[test]
    fn test_malformed_pattern_is_error() {
        assert!(match_glob("[unclosed", "anything").is_err());
        assert!(match_glob("src/**/[bad", "src/x/bad").is_err());
    }
}
