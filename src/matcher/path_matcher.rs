//! Layered include/exclude path matching with cross-platform normalization.
//!
//! The matcher decides, for each candidate path, whether analysis should
//! skip it. Exclude patterns may be negated with a leading `!`, which
//! re-includes paths a prior exclude would have removed. Normalization
//! results are memoized in bounded caches that are invalidated whenever
//! the pattern set changes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::errors::{AnalyzerError, Result};

use super::glob::match_glob;

/// Maximum number of entries held in each normalization cache.
const NORMALIZE_CACHE_CAP: usize = 1_000;

/// Above this many total patterns the merged-pattern cache disables itself
/// and the merge is recomputed per call.
const MERGED_CACHE_THRESHOLD: usize = 1_000;

/// Maximum number of leading `..` segments an import may climb.
const MAX_UPWARD_SEGMENTS: usize = 2;

/// Built-in deny list applied when `use_default_excludes` is on.
///
/// The list intentionally carries duplicate entries (`target/**`,
/// `vendor/**`) inherited from earlier releases; the merge step dedupes
/// them while preserving first-occurrence order.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules/**",
    ".git/**",
    ".codecontext/**",
    "dist/**",
    "build/**",
    "out/**",
    "target/**",
    "vendor/**",
    ".next/**",
    ".nuxt/**",
    "coverage/**",
    "__pycache__/**",
    ".venv/**",
    "venv/**",
    ".tox/**",
    ".idea/**",
    ".vscode/**",
    ".gradle/**",
    "bin/**",
    "obj/**",
    "target/**",
    "vendor/**",
    "tmp/**",
    ".cache/**",
    "logs/**",
    "*.log",
    "*.min.*",
    ".env",
    ".env.*",
    "*.pem",
    "*.key",
    ".DS_Store",
];

/// Sensitive filesystem prefixes an import must never resolve into.
const SENSITIVE_PREFIXES: &[&str] = &["/etc/", "/bin/", "/sbin/"];

/// Sink for malformed-pattern reports. Receives the pattern and the
/// underlying error message.
pub type PatternErrorSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Effective pattern lists after merging defaults with user patterns.
#[derive(Debug, Clone, Default)]
struct MergedPatterns {
    excludes: Vec<String>,
    includes: Vec<String>,
}

/// Decides whether candidate paths should be skipped during analysis.
pub struct PathMatcher {
    use_default_excludes: RwLock<bool>,
    exclude_patterns: RwLock<Vec<String>>,
    merged: RwLock<Option<Arc<MergedPatterns>>>,
    normalize_cache: RwLock<HashMap<String, String>>,
    pattern_cache: RwLock<HashMap<String, String>>,
    error_sink: RwLock<Option<PatternErrorSink>>,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMatcher {
    /// Creates a matcher with default excludes enabled and no user patterns.
    pub fn new() -> Self {
        Self {
            use_default_excludes: RwLock::new(true),
            exclude_patterns: RwLock::new(Vec::new()),
            merged: RwLock::new(None),
            normalize_cache: RwLock::new(HashMap::new()),
            pattern_cache: RwLock::new(HashMap::new()),
            error_sink: RwLock::new(None),
        }
    }

    /// Replaces the user-supplied exclude pattern list.
    ///
    /// `!`-prefixed entries act as include (negation) patterns. Invalidates
    /// the merged-pattern cache and both normalization caches.
    pub fn set_exclude_patterns(&self, patterns: Vec<String>) {
        *self.exclude_patterns.write().expect("pattern lock poisoned") = patterns;
        self.invalidate();
    }

    /// Enables or disables the built-in default exclude list.
    pub fn set_use_default_excludes(&self, enabled: bool) {
        *self
            .use_default_excludes
            .write()
            .expect("pattern lock poisoned") = enabled;
        self.invalidate();
    }

    /// Sets the sink that receives malformed-pattern reports.
    pub fn set_pattern_error_sink(&self, sink: PatternErrorSink) {
        *self.error_sink.write().expect("sink lock poisoned") = Some(sink);
    }

    fn invalidate(&self) {
        *self.merged.write().expect("merged lock poisoned") = None;
        self.normalize_cache
            .write()
            .expect("cache lock poisoned")
            .clear();
        self.pattern_cache
            .write()
            .expect("cache lock poisoned")
            .clear();
    }

    // ------------------------------------------------------------------
    // Normalization
    // ------------------------------------------------------------------

    /// Collapses redundant components, yielding an OS-independent cleaned
    /// form. Empty input yields `"."`. Results are memoized.
    pub fn normalize(&self, path: &str) -> String {
        if let Some(hit) = self
            .normalize_cache
            .read()
            .expect("cache lock poisoned")
            .get(path)
        {
            return hit.clone();
        }
        let cleaned = clean_path(path);
        self.memoize(&self.normalize_cache, path, &cleaned);
        cleaned
    }

    /// Converts all backslashes to forward slashes, then cleans the path.
    /// A UNC `//server/share` prefix is preserved verbatim. Results are
    /// memoized.
    pub fn normalize_for_pattern(&self, path: &str) -> String {
        if let Some(hit) = self
            .pattern_cache
            .read()
            .expect("cache lock poisoned")
            .get(path)
        {
            return hit.clone();
        }
        let forward = path.replace('\\', "/");
        let cleaned = clean_path(&forward);
        self.memoize(&self.pattern_cache, path, &cleaned);
        cleaned
    }

    fn memoize(&self, cache: &RwLock<HashMap<String, String>>, key: &str, value: &str) {
        let mut guard = cache.write().expect("cache lock poisoned");
        if guard.len() < NORMALIZE_CACHE_CAP {
            guard.insert(key.to_string(), value.to_string());
        }
    }

    // ------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------

    /// Returns `true` iff the path matches some exclude pattern and does
    /// not match any include (negation) pattern.
    ///
    /// Each pattern is attempted against, in order: the full forward-slash
    /// path, the basename, and each individual path component.
    pub fn should_skip(&self, path: &str) -> bool {
        let merged = self.merged_patterns();
        let normalized = self.normalize_for_pattern(path);

        let basename = normalized.rsplit('/').next().unwrap_or(&normalized);
        let components: Vec<&str> = normalized.split('/').filter(|c| !c.is_empty()).collect();

        // Negation patterns win regardless of exclude matches.
        for pattern in &merged.includes {
            if self.matches_candidates(pattern, &normalized, basename, &components) {
                return false;
            }
        }

        for pattern in &merged.excludes {
            if self.matches_candidates(pattern, &normalized, basename, &components) {
                return true;
            }
        }

        false
    }

    fn matches_candidates(
        &self,
        pattern: &str,
        full: &str,
        basename: &str,
        components: &[&str],
    ) -> bool {
        match match_glob(pattern, full) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => {
                self.report_pattern_error(pattern, &e);
                return false;
            }
        }
        if let Ok(true) = match_glob(pattern, basename) {
            return true;
        }
        for component in components {
            if let Ok(true) = match_glob(pattern, component) {
                return true;
            }
        }
        false
    }

    fn report_pattern_error(&self, pattern: &str, err: &AnalyzerError) {
        warn!(pattern, error = %err, "ignoring malformed exclude pattern");
        if let Some(sink) = self
            .error_sink
            .read()
            .expect("sink lock poisoned")
            .as_ref()
        {
            sink(pattern, &err.to_string());
        }
    }

    /// Returns the effective merged pattern lists, computing and caching
    /// them on first use. Above `MERGED_CACHE_THRESHOLD` total patterns the
    /// cache is bypassed and the merge recomputed per call.
    fn merged_patterns(&self) -> Arc<MergedPatterns> {
        let user = self.exclude_patterns.read().expect("pattern lock poisoned");
        let defaults_on = *self
            .use_default_excludes
            .read()
            .expect("pattern lock poisoned");

        let total = user.len() + if defaults_on { DEFAULT_EXCLUDES.len() } else { 0 };
        if total > MERGED_CACHE_THRESHOLD {
            return Arc::new(merge_patterns(defaults_on, &user));
        }

        if let Some(cached) = self.merged.read().expect("merged lock poisoned").as_ref() {
            return Arc::clone(cached);
        }

        let merged = Arc::new(merge_patterns(defaults_on, &user));
        *self.merged.write().expect("merged lock poisoned") = Some(Arc::clone(&merged));
        merged
    }

    // ------------------------------------------------------------------
    // Traversal validation
    // ------------------------------------------------------------------

    /// Validates that an import path stays within the project.
    ///
    /// Rejects imports whose original form climbs more than two `..`
    /// levels, or which resolve (against `base_dir`) into a sensitive
    /// system location. Mixed separators are normalized before inspection.
    pub fn validate_import(&self, import_path: &str, base_dir: &str) -> Result<()> {
        let forward = import_path.replace('\\', "/");

        let upward = forward.split('/').filter(|seg| *seg == "..").count();
        if upward > MAX_UPWARD_SEGMENTS {
            return Err(AnalyzerError::ImportEscapesProject {
                import: import_path.to_string(),
                reason: format!("{} upward segments (max {})", upward, MAX_UPWARD_SEGMENTS),
            });
        }

        let cleaned = clean_path(&forward);
        let resolved = if cleaned.starts_with('/') || is_drive_absolute(&cleaned) {
            cleaned
        } else {
            let base = self.normalize_for_pattern(base_dir);
            clean_path(&format!("{}/{}", base, cleaned))
        };

        if is_sensitive_path(&resolved) {
            return Err(AnalyzerError::ImportEscapesProject {
                import: import_path.to_string(),
                reason: format!("resolves to sensitive path '{}'", resolved),
            });
        }

        Ok(())
    }
}

/// Returns `true` for Windows drive-absolute forms such as `C:/`.
fn is_drive_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

fn is_sensitive_path(resolved: &str) -> bool {
    if SENSITIVE_PREFIXES.iter().any(|p| resolved.starts_with(p)) {
        return true;
    }
    // Windows system directory, with or without a drive prefix.
    resolved.contains("/Windows/System32")
}

/// Cleans a forward-slash path: drops `.` and empty segments, collapses
/// `..` where possible, keeps leading upward segments, and preserves a
/// UNC `//server/share` prefix verbatim. Empty input yields `"."`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let is_unc = path.starts_with("//") && !path[2..].starts_with('/');
    let is_absolute = !is_unc && path.starts_with('/');

    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(out.last(), Some(last) if *last != "..") {
                    out.pop();
                } else if !is_absolute && !is_unc {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }

    let joined = out.join("/");
    if is_unc {
        format!("//{}", joined)
    } else if is_absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

fn merge_patterns(defaults_on: bool, user: &[String]) -> MergedPatterns {
    let mut merged = MergedPatterns::default();
    let mut seen_excludes: HashSet<String> = HashSet::new();
    let mut seen_includes: HashSet<String> = HashSet::new();

    let defaults = if defaults_on {
        DEFAULT_EXCLUDES
    } else {
        &[] as &[&str]
    };

    for pattern in defaults.iter().copied().chain(user.iter().map(|s| s.as_str())) {
        if let Some(stripped) = pattern.strip_prefix('!') {
            if seen_includes.insert(stripped.to_string()) {
                merged.includes.push(stripped.to_string());
            }
        } else if seen_excludes.insert(pattern.to_string()) {
            merged.excludes.push(pattern.to_string());
        }
    }

    merged
}
