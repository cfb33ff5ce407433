//! Line-level extractors for data and documentation formats.
//!
//! JSON, YAML, and Markdown need no grammar: top-level keys and headings
//! are extracted by scanning lines, and the outcome is always reported at
//! `basic` quality.

use crate::errors::Result;
use crate::types::{generate_symbol_id, Location, ParseQuality, Symbol, SymbolKind};

use super::{LanguageParser, ParseOutcome};

pub struct BasicParser;

impl LanguageParser for BasicParser {
    fn extensions(&self) -> &[&'static str] {
        &["json", "yaml", "yml", "md", "markdown"]
    }

    fn language_for_extension(&self, ext: &str) -> &'static str {
        match ext {
            "json" => "json",
            "yaml" | "yml" => "yaml",
            _ => "markdown",
        }
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let ext = file_path.rsplit('.').next().unwrap_or("");
        let symbols = match self.language_for_extension(ext) {
            "json" => extract_json_keys(file_path, source),
            "yaml" => extract_yaml_keys(file_path, source),
            _ => extract_markdown_headings(file_path, source),
        };

        Ok(ParseOutcome {
            symbols,
            imports: Vec::new(),
            errors: Vec::new(),
            quality: ParseQuality::Basic,
        })
    }
}

/// Top-level `"key":` entries of a JSON object.
fn extract_json_keys(file_path: &str, source: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        // Only nesting depth one: two-space or tab indented keys directly
        // under the root object.
        let indent = line.len() - trimmed.len();
        if indent > 4 || !trimmed.starts_with('"') {
            continue;
        }
        if let Some(end) = trimmed[1..].find('"') {
            let key = &trimmed[1..=end];
            let rest = &trimmed[end + 2..];
            if rest.trim_start().starts_with(':') {
                symbols.push(property(file_path, key, line_no as u32));
            }
        }
    }
    symbols
}

/// Top-level `key:` entries of a YAML document.
fn extract_yaml_keys(file_path: &str, source: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        if line.starts_with([' ', '\t', '#', '-']) || line.trim().is_empty() {
            continue;
        }
        if let Some((key, _)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                symbols.push(property(file_path, key, line_no as u32));
            }
        }
    }
    symbols
}

/// Markdown headings of any level.
fn extract_markdown_headings(file_path: &str, source: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with('#') {
            continue;
        }
        let heading = trimmed.trim_start_matches('#').trim();
        if !heading.is_empty() {
            let location = Location {
                start_line: line_no as u32,
                end_line: line_no as u32,
                ..Default::default()
            };
            symbols.push(Symbol {
                id: generate_symbol_id(file_path, SymbolKind::Module, heading, &location),
                name: heading.to_string(),
                kind: SymbolKind::Module,
                framework_kind: None,
                fully_qualified_name: format!("{}::{}", file_path, heading),
                signature: Some(trimmed.to_string()),
                documentation: None,
                language: "markdown".to_string(),
                location,
            });
        }
    }
    symbols
}

fn property(file_path: &str, key: &str, line: u32) -> Symbol {
    let location = Location {
        start_line: line,
        end_line: line,
        ..Default::default()
    };
    Symbol {
        id: generate_symbol_id(file_path, SymbolKind::Property, key, &location),
        name: key.to_string(),
        kind: SymbolKind::Property,
        framework_kind: None,
        fully_qualified_name: format!("{}::{}", file_path, key),
        signature: None,
        documentation: None,
        language: if file_path.ends_with(".json") {
            "json".to_string()
        } else {
            "yaml".to_string()
        },
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_headings() {
        let out = BasicParser
            .parse("README.md", "# Title\n\nbody\n\n## Usage\n")
            .unwrap();
        assert_eq!(out.quality, ParseQuality::Basic);
        let names: Vec<&str> = out.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Title", "Usage"]);
    }

    #[test]
    fn test_yaml_top_level_keys() {
        let out = BasicParser
            .parse("config.yaml", "version: 1\nexcludes:\n  - dist\nname: demo\n")
            .unwrap();
        let names: Vec<&str> = out.symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["version", "excludes", "name"]);
    }

    #[test]
    fn test_json_no_imports() {
        let out = BasicParser
            .parse("package.json", "{\n  \"name\": \"demo\",\n  \"version\": \"1.0.0\"\n}\n")
            .unwrap();
        assert!(out.imports.is_empty());
        assert!(out.symbols.iter().any(|s| s.name == "name"));
    }
}
