//! Tree-sitter based parser facade.
//!
//! Fronts the per-language grammars behind a single registry: classify a
//! file by extension, parse it, and extract symbols and import records.
//! Parsers report a quality level; partial parses still yield whatever
//! was recoverable and never fail the overall build.

mod basic;
mod go;
mod java;
mod python;
mod rust_lang;
mod typescript;

pub use basic::BasicParser;
pub use go::GoParser;
pub use java::JavaParser;
pub use python::PythonParser;
pub use rust_lang::RustParser;
pub use typescript::TypeScriptParser;

use crate::errors::{AnalyzerError, Result};
use crate::types::{ImportRecord, ParseQuality, Symbol};

/// Result of parsing one file.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportRecord>,
    /// Recoverable error messages; the file stays in the graph.
    pub errors: Vec<String>,
    pub quality: ParseQuality,
}

/// Classification of a file prior to parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub language: String,
    pub is_test: bool,
    pub is_generated: bool,
}

/// Trait for language-specific parsers.
///
/// Each implementation handles one language family, parsing source with
/// tree-sitter (or line-level scanning for data formats) and emitting
/// symbols and import records.
pub trait LanguageParser: Send + Sync {
    /// File extensions this parser handles (without leading dot).
    fn extensions(&self) -> &[&'static str];

    /// Language name recorded on files and symbols for a given extension.
    fn language_for_extension(&self, ext: &str) -> &'static str;

    /// Parses source and extracts symbols and imports.
    ///
    /// `file_path` is the normalized relative path used for symbol ids.
    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome>;
}

/// Registry of all available language parsers, dispatching by extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl ParserRegistry {
    /// Creates a registry with all built-in language parsers.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(TypeScriptParser),
                Box::new(GoParser),
                Box::new(PythonParser),
                Box::new(JavaParser),
                Box::new(RustParser),
                Box::new(BasicParser),
            ],
        }
    }

    /// Classifies a file by extension into a language plus test/generated
    /// flags. Fails with `UnsupportedLanguage` for unknown extensions;
    /// callers skip such files.
    pub fn classify(&self, path: &str) -> Result<Classification> {
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|base| base.rsplit_once('.'))
            .map(|(_, e)| e)
            .unwrap_or("");

        let parser = self
            .parser_for_extension(ext)
            .ok_or_else(|| AnalyzerError::UnsupportedLanguage {
                path: path.to_string(),
            })?;

        Ok(Classification {
            language: parser.language_for_extension(ext).to_string(),
            is_test: is_test_path(path),
            is_generated: is_generated_path(path),
        })
    }

    /// Returns the parser responsible for the given extension.
    pub fn parser_for_extension(&self, ext: &str) -> Option<&dyn LanguageParser> {
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext))
            .map(|p| p.as_ref())
    }

    /// Returns the parser responsible for a language name.
    pub fn parser_for_language(&self, language: &str) -> Option<&dyn LanguageParser> {
        self.parsers
            .iter()
            .find(|p| {
                p.extensions()
                    .iter()
                    .any(|ext| p.language_for_extension(ext) == language)
            })
            .map(|p| p.as_ref())
    }

    /// All supported file extensions across all parsers.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions().iter().copied())
            .collect()
    }

    /// All language names across all parsers, deduplicated.
    pub fn supported_languages(&self) -> Vec<&'static str> {
        let mut langs: Vec<&'static str> = Vec::new();
        for parser in &self.parsers {
            for ext in parser.extensions() {
                let lang = parser.language_for_extension(ext);
                if !langs.contains(&lang) {
                    langs.push(lang);
                }
            }
        }
        langs
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Heuristic test-file detection shared by all languages.
fn is_test_path(path: &str) -> bool {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.contains(".test.")
        || base.contains(".spec.")
        || base.ends_with("_test.go")
        || base.ends_with("_test.py")
        || base.starts_with("test_")
        || base.ends_with("Test.java")
        || path.split('/').any(|c| c == "tests" || c == "__tests__")
}

/// Heuristic generated-file detection shared by all languages.
fn is_generated_path(path: &str) -> bool {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.contains(".min.")
        || base.contains(".generated.")
        || base.ends_with("_pb2.py")
        || base.ends_with(".pb.go")
        || base.ends_with(".g.dart")
        || path.split('/').any(|c| c == "generated")
}

// ---------------------------------------------------------------------------
// Shared tree-sitter helpers
// ---------------------------------------------------------------------------

use crate::types::Location;

/// Converts a tree-sitter node range into a symbol location.
pub(crate) fn location_of(node: &tree_sitter::Node<'_>) -> Location {
    Location {
        start_line: node.start_position().row as u32,
        end_line: node.end_position().row as u32,
        start_col: node.start_position().column as u32,
        end_col: node.end_position().column as u32,
    }
}

/// Gets the text of a tree-sitter node from the source.
pub(crate) fn node_text(node: tree_sitter::Node<'_>, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or("<invalid utf8>")
        .to_string()
}

/// First line of a node's text, used as the symbol signature.
pub(crate) fn signature_of(node: tree_sitter::Node<'_>, source: &str) -> Option<String> {
    let text = node_text(node, source);
    text.lines().next().map(|l| l.trim_end().to_string())
}

/// Extracts a documentation comment from the siblings immediately
/// preceding the node, if present.
pub(crate) fn doc_comment(node: tree_sitter::Node<'_>, source: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = node.prev_named_sibling();
    while let Some(sib) = current {
        let kind = sib.kind();
        if !kind.contains("comment") {
            break;
        }
        lines.push(clean_comment(&node_text(sib, source)));
        current = sib.prev_named_sibling();
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

fn clean_comment(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches("///")
                .trim_start_matches("//")
                .trim_start_matches("/**")
                .trim_start_matches("/*")
                .trim_start_matches('#')
                .trim_start_matches('*')
                .trim_end_matches("*/")
                .trim()
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips surrounding quotes from a string-literal node's text.
pub(crate) fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_extensions() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.classify("src/a.ts").unwrap().language, "typescript");
        assert_eq!(registry.classify("src/a.tsx").unwrap().language, "typescript");
        assert_eq!(registry.classify("src/a.js").unwrap().language, "javascript");
        assert_eq!(registry.classify("pkg/x.go").unwrap().language, "go");
        assert_eq!(registry.classify("m.py").unwrap().language, "python");
        assert_eq!(registry.classify("A.java").unwrap().language, "java");
        assert_eq!(registry.classify("lib.rs").unwrap().language, "rust");
        assert_eq!(registry.classify("cfg.yaml").unwrap().language, "yaml");
        assert_eq!(registry.classify("README.md").unwrap().language, "markdown");
    }

    #[test]
    fn test_classify_unknown_extension_fails() {
        let registry = ParserRegistry::new();
        assert!(matches!(
            registry.classify("binary.exe"),
            Err(AnalyzerError::UnsupportedLanguage { .. })
        ));
        assert!(registry.classify("Makefile").is_err());
    }

    #[test]
    fn test_classify_flags() {
        let registry = ParserRegistry::new();
        assert!(registry.classify("src/a.test.ts").unwrap().is_test);
        assert!(registry.classify("pkg/x_test.go").unwrap().is_test);
        assert!(!registry.classify("src/a.ts").unwrap().is_test);
        assert!(registry.classify("dist/app.min.js").unwrap().is_generated);
        assert!(registry.classify("api.pb.go").unwrap().is_generated);
    }

    #[test]
    fn test_supported_languages_unique() {
        let registry = ParserRegistry::new();
        let langs = registry.supported_languages();
        let mut deduped = langs.clone();
        deduped.dedup();
        assert_eq!(langs.len(), deduped.len());
        assert!(langs.contains(&"typescript"));
        assert!(langs.contains(&"rust"));
        assert!(langs.contains(&"markdown"));
    }
}
