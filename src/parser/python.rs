//! Tree-sitter based extractor for Python source files.

use tree_sitter::{Node as TsNode, Parser};

use crate::errors::{AnalyzerError, Result};
use crate::types::{generate_symbol_id, ImportRecord, ParseQuality, Symbol, SymbolKind};

use super::{location_of, node_text, signature_of, LanguageParser, ParseOutcome};

pub struct PythonParser;

impl LanguageParser for PythonParser {
    fn extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn language_for_extension(&self, _ext: &str) -> &'static str {
        "python"
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| AnalyzerError::ParseFailed {
                message: format!("failed to load Python grammar: {e}"),
                path: file_path.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalyzerError::ParseFailed {
                message: "tree-sitter parse returned None".to_string(),
                path: file_path.to_string(),
            })?;

        let mut symbols = Vec::new();
        let mut imports = Vec::new();
        let mut errors = Vec::new();

        let root = tree.root_node();
        visit_block(root, source, file_path, None, &mut symbols, &mut imports);

        let quality = if root.has_error() {
            errors.push("syntax errors in source".to_string());
            ParseQuality::Partial
        } else {
            ParseQuality::Complete
        };

        Ok(ParseOutcome {
            symbols,
            imports,
            errors,
            quality,
        })
    }
}

fn visit_block(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    class_name: Option<&str>,
    symbols: &mut Vec<Symbol>,
    imports: &mut Vec<ImportRecord>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                for name in named_descendants(child, "dotted_name", source) {
                    imports.push(ImportRecord {
                        path: name,
                        specifiers: Vec::new(),
                        is_default: false,
                    });
                }
            }
            "import_from_statement" => {
                if let Some(module) = child.child_by_field_name("module_name") {
                    let path = node_text(module, source);
                    let mut specifiers = Vec::new();
                    let mut spec_cursor = child.walk();
                    for part in child.named_children(&mut spec_cursor) {
                        if part.id() != module.id() && part.kind() == "dotted_name" {
                            specifiers.push(node_text(part, source));
                        }
                    }
                    imports.push(ImportRecord {
                        path,
                        specifiers,
                        is_default: false,
                    });
                }
            }
            "function_definition" => {
                let kind = if class_name.is_some() {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                push_def(child, source, file_path, class_name, kind, symbols);
            }
            "class_definition" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let name = node_text(name_node, source);
                    push_def(child, source, file_path, None, SymbolKind::Class, symbols);
                    if let Some(body) = child.child_by_field_name("body") {
                        visit_block(body, source, file_path, Some(&name), symbols, imports);
                    }
                }
            }
            "decorated_definition" => {
                if let Some(inner) = child.child_by_field_name("definition") {
                    let mut wrapper = Vec::new();
                    let kind = match inner.kind() {
                        "class_definition" => SymbolKind::Class,
                        _ if class_name.is_some() => SymbolKind::Method,
                        _ => SymbolKind::Function,
                    };
                    push_def(inner, source, file_path, class_name, kind, &mut wrapper);
                    symbols.extend(wrapper);
                }
            }
            "expression_statement" => {
                // Module-level assignments become variables.
                if class_name.is_none() {
                    if let Some(assign) = child.named_child(0).filter(|n| n.kind() == "assignment")
                    {
                        if let Some(left) = assign.child_by_field_name("left") {
                            if left.kind() == "identifier" {
                                let name = node_text(left, source);
                                let kind = if name.chars().all(|c| !c.is_ascii_lowercase()) {
                                    SymbolKind::Constant
                                } else {
                                    SymbolKind::Variable
                                };
                                let location = location_of(&child);
                                symbols.push(Symbol {
                                    id: generate_symbol_id(file_path, kind, &name, &location),
                                    name: name.clone(),
                                    kind,
                                    framework_kind: None,
                                    fully_qualified_name: format!("{}::{}", file_path, name),
                                    signature: signature_of(child, source),
                                    documentation: None,
                                    language: "python".to_string(),
                                    location,
                                });
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_def(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    class_name: Option<&str>,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    let location = location_of(&node);
    let qualified = match class_name {
        Some(class) => format!("{}::{}::{}", file_path, class, name),
        None => format!("{}::{}", file_path, name),
    };
    symbols.push(Symbol {
        id: generate_symbol_id(file_path, kind, &name, &location),
        name,
        kind,
        framework_kind: None,
        fully_qualified_name: qualified,
        signature: signature_of(node, source),
        documentation: docstring(node, source),
        language: "python".to_string(),
        location,
    });
}

/// Python docstring: the first statement of the body when it is a string.
fn docstring(node: TsNode<'_>, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let raw = node_text(expr, source);
    Some(raw.trim_matches(|c| c == '"' || c == '\'').trim().to_string())
}

fn named_descendants(node: TsNode<'_>, kind: &str, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kind {
            out.push(node_text(child, source));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_python_symbols() {
        let source = "import os\nfrom pathlib import Path\n\nLIMIT = 5\n\nclass Runner:\n    \"\"\"Runs things.\"\"\"\n\n    def run(self):\n        pass\n\ndef main():\n    pass\n";
        let out = PythonParser.parse("app/main.py", source).unwrap();
        assert_eq!(out.quality, ParseQuality::Complete);

        let names: Vec<&str> = out.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Runner"));
        assert!(names.contains(&"run"));
        assert!(names.contains(&"main"));
        assert!(names.contains(&"LIMIT"));

        let run = out.symbols.iter().find(|s| s.name == "run").unwrap();
        assert_eq!(run.kind, SymbolKind::Method);
        assert_eq!(run.fully_qualified_name, "app/main.py::Runner::run");

        let limit = out.symbols.iter().find(|s| s.name == "LIMIT").unwrap();
        assert_eq!(limit.kind, SymbolKind::Constant);

        let runner = out.symbols.iter().find(|s| s.name == "Runner").unwrap();
        assert_eq!(runner.documentation.as_deref(), Some("Runs things."));

        let paths: Vec<&str> = out.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["os", "pathlib"]);
    }

    #[test]
    fn test_from_import_specifiers() {
        let out = PythonParser
            .parse("m.py", "from collections import OrderedDict\n")
            .unwrap();
        assert_eq!(out.imports.len(), 1);
        assert_eq!(out.imports[0].specifiers, vec!["OrderedDict"]);
    }
}
