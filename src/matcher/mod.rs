//! Cross-platform path matching: normalization, glob patterns with
//! negation, and directory-traversal validation.

mod glob;
mod path_matcher;

pub use glob::match_glob;
pub use path_matcher::{clean_path, PathMatcher, PatternErrorSink, DEFAULT_EXCLUDES};
