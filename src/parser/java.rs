//! Tree-sitter based extractor for Java source files.

use tree_sitter::{Node as TsNode, Parser};

use crate::errors::{AnalyzerError, Result};
use crate::types::{generate_symbol_id, ImportRecord, ParseQuality, Symbol, SymbolKind};

use super::{doc_comment, location_of, node_text, signature_of, LanguageParser, ParseOutcome};

pub struct JavaParser;

impl LanguageParser for JavaParser {
    fn extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn language_for_extension(&self, _ext: &str) -> &'static str {
        "java"
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| AnalyzerError::ParseFailed {
                message: format!("failed to load Java grammar: {e}"),
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
                "import_declaration" => {
                    let text = node_text(child, source);
                    let path = text
                        .trim_start_matches("import")
                        .trim_start_matches(" static")
                        .trim()
                        .trim_end_matches(';')
                        .trim()
                        .to_string();
                    imports.push(ImportRecord {
                        path,
                        specifiers: Vec::new(),
                        is_default: false,
                    });
                }
                "class_declaration" => visit_type(child, source, file_path, SymbolKind::Class, &mut symbols),
                "interface_declaration" => {
                    visit_type(child, source, file_path, SymbolKind::Interface, &mut symbols)
                }
                "enum_declaration" => {
                    visit_type(child, source, file_path, SymbolKind::Enum, &mut symbols)
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

fn visit_type(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = node_text(name_node, source);
    symbols.push(make_symbol(node, source, file_path, None, &type_name, kind));

    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_declaration" | "constructor_declaration" => {
                if let Some(m_name) = member.child_by_field_name("name") {
                    let name = node_text(m_name, source);
                    symbols.push(make_symbol(
                        member,
                        source,
                        file_path,
                        Some(&type_name),
                        &name,
                        SymbolKind::Method,
                    ));
                }
            }
            "field_declaration" => {
                let mut field_cursor = member.walk();
                for declarator in member.named_children(&mut field_cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    if let Some(f_name) = declarator.child_by_field_name("name") {
                        let name = node_text(f_name, source);
                        symbols.push(make_symbol(
                            member,
                            source,
                            file_path,
                            Some(&type_name),
                            &name,
                            SymbolKind::Property,
                        ));
                    }
                }
            }
            // Nested types are extracted flat.
            "class_declaration" => {
                visit_type(member, source, file_path, SymbolKind::Class, symbols)
            }
            _ => {}
        }
    }
}

fn make_symbol(
    node: TsNode<'_>,
    source: &str,
    file_path: &str,
    parent: Option<&str>,
    name: &str,
    kind: SymbolKind,
) -> Symbol {
    let location = location_of(&node);
    let qualified = match parent {
        Some(p) => format!("{}::{}::{}", file_path, p, name),
        None => format!("{}::{}", file_path, name),
    };
    Symbol {
        id: generate_symbol_id(file_path, kind, name, &location),
        name: name.to_string(),
        kind,
        framework_kind: None,
        fully_qualified_name: qualified,
        signature: signature_of(node, source),
        documentation: doc_comment(node, source),
        language: "java".to_string(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_java_symbols() {
        let source = "import java.util.List;\n\npublic class Account {\n    private long balance;\n\n    public void deposit(long amount) {}\n}\n";
        let out = JavaParser.parse("src/Account.java", source).unwrap();
        assert_eq!(out.quality, ParseQuality::Complete);

        let account = out.symbols.iter().find(|s| s.name == "Account").unwrap();
        assert_eq!(account.kind, SymbolKind::Class);

        let deposit = out.symbols.iter().find(|s| s.name == "deposit").unwrap();
        assert_eq!(deposit.kind, SymbolKind::Method);
        assert_eq!(
            deposit.fully_qualified_name,
            "src/Account.java::Account::deposit"
        );

        let balance = out.symbols.iter().find(|s| s.name == "balance").unwrap();
        assert_eq!(balance.kind, SymbolKind::Property);

        assert_eq!(out.imports.len(), 1);
        assert_eq!(out.imports[0].path, "java.util.List");
    }

    #[test]
    fn test_interface_and_enum() {
        let source = "public interface Repo {}\nenum Color { RED, GREEN }\n";
        let out = JavaParser.parse("src/Repo.java", source).unwrap();
        let repo = out.symbols.iter().find(|s| s.name == "Repo").unwrap();
        assert_eq!(repo.kind, SymbolKind::Interface);
        let color = out.symbols.iter().find(|s| s.name == "Color").unwrap();
        assert_eq!(color.kind, SymbolKind::Enum);
    }
}
