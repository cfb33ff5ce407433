//! Tree-sitter based extractor for Rust source files.

use tree_sitter::{Node as TsNode, Parser};

use crate::errors::{AnalyzerError, Result};
use crate::types::{generate_symbol_id, ImportRecord, ParseQuality, Symbol, SymbolKind};

use super::{doc_comment, location_of, node_text, signature_of, LanguageParser, ParseOutcome};

pub struct RustParser;

impl LanguageParser for RustParser {
    fn extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn language_for_extension(&self, _ext: &str) -> &'static str {
        "rust"
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| AnalyzerError::ParseFailed {
                message: format!("failed to load Rust grammar: {e}"),
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
        visit_items(root, source, file_path, None, &mut symbols, &mut imports);

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

fn visit_items(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    parent: Option<&str>,
    symbols: &mut Vec<Symbol>,
    imports: &mut Vec<ImportRecord>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "use_declaration" => {
                let text = node_text(child, source);
                let path = text
                    .trim_start_matches("pub")
                    .trim()
                    .trim_start_matches("use")
                    .trim()
                    .trim_end_matches(';')
                    .to_string();
                imports.push(ImportRecord {
                    path,
                    specifiers: Vec::new(),
                    is_default: false,
                });
            }
            "function_item" => {
                let kind = if parent.is_some() {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                push_named(child, source, file_path, parent, kind, symbols);
            }
            "struct_item" => push_named(child, source, file_path, parent, SymbolKind::Struct, symbols),
            "enum_item" => push_named(child, source, file_path, parent, SymbolKind::Enum, symbols),
            "trait_item" => push_named(child, source, file_path, parent, SymbolKind::Trait, symbols),
            "const_item" => {
                push_named(child, source, file_path, parent, SymbolKind::Constant, symbols)
            }
            "static_item" => {
                push_named(child, source, file_path, parent, SymbolKind::Variable, symbols)
            }
            "type_item" => {
                push_named(child, source, file_path, parent, SymbolKind::TypeAlias, symbols)
            }
            "mod_item" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let name = node_text(name_node, source);
                    push_named(child, source, file_path, parent, SymbolKind::Module, symbols);
                    if let Some(body) = child.child_by_field_name("body") {
                        visit_items(body, source, file_path, Some(&name), symbols, imports);
                    }
                }
            }
            "impl_item" => {
                let impl_type = child
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source));
                if let Some(body) = child.child_by_field_name("body") {
                    visit_items(
                        body,
                        source,
                        file_path,
                        impl_type.as_deref(),
                        symbols,
                        imports,
                    );
                }
            }
            _ => {}
        }
    }
}

fn push_named(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    parent: Option<&str>,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    let location = location_of(&node);
    let qualified = match parent {
        Some(p) => format!("{}::{}::{}", file_path, p, name),
        None => format!("{}::{}", file_path, name),
    };
    symbols.push(Symbol {
        id: generate_symbol_id(file_path, kind, &name, &location),
        name,
        kind,
        framework_kind: None,
        fully_qualified_name: qualified,
        signature: signature_of(node, source),
        documentation: doc_comment(node, source),
        language: "rust".to_string(),
        location,
    });
}
