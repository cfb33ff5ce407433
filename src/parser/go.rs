//! Tree-sitter based extractor for Go source files.

use tree_sitter::{Node as TsNode, Parser};

use crate::errors::{AnalyzerError, Result};
use crate::types::{generate_symbol_id, ImportRecord, ParseQuality, Symbol, SymbolKind};

use super::{doc_comment, location_of, node_text, signature_of, unquote, LanguageParser, ParseOutcome};

pub struct GoParser;

impl LanguageParser for GoParser {
    fn extensions(&self) -> &[&'static str] {
        &["go"]
    }

    fn language_for_extension(&self, _ext: &str) -> &'static str {
        "go"
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| AnalyzerError::ParseFailed {
                message: format!("failed to load Go grammar: {e}"),
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
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "import_declaration" => collect_imports(child, source, &mut imports),
                "function_declaration" => {
                    push_named(child, source, file_path, SymbolKind::Function, &mut symbols);
                }
                "method_declaration" => {
                    push_named(child, source, file_path, SymbolKind::Method, &mut symbols);
                }
                "type_declaration" => collect_types(child, source, file_path, &mut symbols),
                "const_declaration" => {
                    collect_values(child, source, file_path, SymbolKind::Constant, &mut symbols);
                }
                "var_declaration" => {
                    collect_values(child, source, file_path, SymbolKind::Variable, &mut symbols);
                }
                _ => {}
            }
        }

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

fn collect_imports(node: TsNode<'_>, source: &str, imports: &mut Vec<ImportRecord>) {
    let mut cursor = node.walk();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        for child in current.named_children(&mut cursor) {
            if child.kind() == "import_spec" {
                if let Some(path) = child.child_by_field_name("path") {
                    imports.push(ImportRecord {
                        path: unquote(&node_text(path, source)),
                        specifiers: Vec::new(),
                        is_default: false,
                    });
                }
            } else if child.kind() == "import_spec_list" {
                stack.push(child);
            }
        }
    }
}

fn collect_types(node: TsNode<'_>, source: &str, file_path: &str, symbols: &mut Vec<Symbol>) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if spec.kind() != "type_spec" {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type") => SymbolKind::Struct,
            Some("interface_type") => SymbolKind::Interface,
            _ => SymbolKind::TypeAlias,
        };
        let name = node_text(name_node, source);
        symbols.push(make_symbol(node, source, file_path, &name, kind));
    }
}

fn collect_values(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if !spec.kind().ends_with("_spec") {
            continue;
        }
        let mut spec_cursor = spec.walk();
        for name_node in spec.named_children(&mut spec_cursor) {
            if name_node.kind() == "identifier" {
                let name = node_text(name_node, source);
                symbols.push(make_symbol(node, source, file_path, &name, kind));
            }
        }
    }
}

fn push_named(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    symbols.push(make_symbol(node, source, file_path, &name, kind));
}

fn make_symbol(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    name: &str,
    kind: SymbolKind,
) -> Symbol {
    let location = location_of(&node);
    Symbol {
        id: generate_symbol_id(file_path, kind, name, &location),
        name: name.to_string(),
        kind,
        framework_kind: None,
        fully_qualified_name: format!("{}::{}", file_path, name),
        signature: signature_of(node, source),
        documentation: doc_comment(node, source),
        language: "go".to_string(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_go_symbols() {
        let source = "package main\n\nimport \"fmt\"\n\ntype Server struct{}\n\nfunc (s *Server) Run() {}\n\nfunc main() {\n\tfmt.Println(\"hi\")\n}\n";
        let out = GoParser.parse("cmd/main.go", source).unwrap();
        assert_eq!(out.quality, ParseQuality::Complete);

        let names: Vec<&str> = out.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Server"));
        assert!(names.contains(&"Run"));
        assert!(names.contains(&"main"));

        let server = out.symbols.iter().find(|s| s.name == "Server").unwrap();
        assert_eq!(server.kind, SymbolKind::Struct);
        assert_eq!(out.imports.len(), 1);
        assert_eq!(out.imports[0].path, "fmt");
    }

    #[test]
    fn test_grouped_imports() {
        let source = "package main\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n";
        let out = GoParser.parse("main.go", source).unwrap();
        let paths: Vec<&str> = out.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["fmt", "os"]);
    }

    #[test]
    fn test_const_and_var() {
        let source = "package main\n\nconst Limit = 10\n\nvar counter int\n";
        let out = GoParser.parse("main.go", source).unwrap();
        let limit = out.symbols.iter().find(|s| s.name == "Limit").unwrap();
        assert_eq!(limit.kind, SymbolKind::Constant);
        let counter = out.symbols.iter().find(|s| s.name == "counter").unwrap();
        assert_eq!(counter.kind, SymbolKind::Variable);
    }
}
