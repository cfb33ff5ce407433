//! Tree-sitter based extractor for the TypeScript/JavaScript family.
//!
//! One parser handles `.ts`, `.tsx`, `.js`, and `.jsx`, choosing the
//! grammar from the extension. Framework sub-types (components, hooks,
//! services, stores) are inferred from naming conventions and file
//! location.

use tree_sitter::{Node as TsNode, Parser};

use crate::errors::{AnalyzerError, Result};
use crate::types::{
    generate_symbol_id, FrameworkKind, ImportRecord, ParseQuality, Symbol, SymbolKind,
};

use super::{
    doc_comment, location_of, node_text, signature_of, unquote, LanguageParser, ParseOutcome,
};

pub struct TypeScriptParser;

struct ExtractionState {
    symbols: Vec<Symbol>,
    imports: Vec<ImportRecord>,
    errors: Vec<String>,
    file_path: String,
    language: String,
    /// Class-name stack for qualified names and method detection.
    scope: Vec<String>,
}

impl LanguageParser for TypeScriptParser {
    fn extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "js", "jsx", "mjs", "cjs"]
    }

    fn language_for_extension(&self, ext: &str) -> &'static str {
        match ext {
            "ts" | "tsx" => "typescript",
            _ => "javascript",
        }
    }

    fn parse(&self, file_path: &str, source: &str) -> Result<ParseOutcome> {
        let ext = file_path.rsplit('.').next().unwrap_or("");
        let language: tree_sitter::Language = match ext {
            "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            "ts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            _ => tree_sitter_javascript::LANGUAGE.into(),
        };

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| AnalyzerError::ParseFailed {
                message: format!("failed to load grammar: {e}"),
                path: file_path.to_string(),
            })?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| AnalyzerError::ParseFailed {
                message: "tree-sitter parse returned None".to_string(),
                path: file_path.to_string(),
            })?;

        let mut state = ExtractionState {
            symbols: Vec::new(),
            imports: Vec::new(),
            errors: Vec::new(),
            file_path: file_path.to_string(),
            language: self.language_for_extension(ext).to_string(),
            scope: Vec::new(),
        };

        let root = tree.root_node();
        visit_children(&mut state, root, source);

        let quality = if root.has_error() {
            state.errors.push("syntax errors in source".to_string());
            ParseQuality::Partial
        } else {
            ParseQuality::Complete
        };

        Ok(ParseOutcome {
            symbols: state.symbols,
            imports: state.imports,
            errors: state.errors,
            quality,
        })
    }
}

fn visit_children(state: &mut ExtractionState, node: TsNode<'_>, source: &str) {
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            visit_node(state, cursor.node(), source);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn visit_node(state: &mut ExtractionState, node: TsNode<'_>, source: &str) {
    match node.kind() {
        "import_statement" => visit_import(state, node, source),
        "function_declaration" | "generator_function_declaration" => {
            visit_named(state, node, source, SymbolKind::Function);
        }
        "class_declaration" => visit_class(state, node, source),
        "interface_declaration" => visit_named(state, node, source, SymbolKind::Interface),
        "type_alias_declaration" => visit_named(state, node, source, SymbolKind::TypeAlias),
        "enum_declaration" => visit_named(state, node, source, SymbolKind::Enum),
        "lexical_declaration" | "variable_declaration" => visit_variables(state, node, source),
        "method_definition" => visit_named(state, node, source, SymbolKind::Method),
        "export_statement" => {
            // Unwrap and extract the exported declaration itself.
            visit_children(state, node, source);
        }
        _ => visit_children(state, node, source),
    }
}

fn visit_import(state: &mut ExtractionState, node: TsNode<'_>, source: &str) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let path = unquote(&node_text(source_node, source));

    let mut specifiers = Vec::new();
    let mut is_default = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for part in child.children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => {
                    is_default = true;
                    specifiers.push(node_text(part, source));
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.named_children(&mut spec_cursor) {
                        if spec.kind() == "import_specifier" {
                            if let Some(name) = spec.child_by_field_name("name") {
                                specifiers.push(node_text(name, source));
                            }
                        }
                    }
                }
                "namespace_import" => {
                    if let Some(name) = part.named_child(0) {
                        specifiers.push(node_text(name, source));
                    }
                }
                _ => {}
            }
        }
    }

    state.imports.push(ImportRecord {
        path,
        specifiers,
        is_default,
    });
}

fn visit_class(state: &mut ExtractionState, node: TsNode<'_>, source: &str) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    push_symbol(state, node, source, &name, SymbolKind::Class);

    state.scope.push(name);
    if let Some(body) = node.child_by_field_name("body") {
        visit_children(state, body, source);
    }
    state.scope.pop();
}

fn visit_variables(state: &mut ExtractionState, node: TsNode<'_>, source: &str) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = child.child_by_field_name("name") else {
            continue;
        };
        let name = node_text(name_node, source);
        let value_kind = child.child_by_field_name("value").map(|v| v.kind());
        let kind = match value_kind {
            Some("arrow_function") | Some("function_expression") | Some("function") => {
                SymbolKind::Function
            }
            _ if node_text(node, source).starts_with("const") => SymbolKind::Constant,
            _ => SymbolKind::Variable,
        };
        push_symbol(state, node, source, &name, kind);
    }
}

fn visit_named(state: &mut ExtractionState, node: TsNode<'_>, source: &str, kind: SymbolKind) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    push_symbol(state, node, source, &name, kind);
}

fn push_symbol(
    state: &mut ExtractionState,
    node: TsNode<'_>,
    source: &str,
    name: &str,
    kind: SymbolKind,
) {
    let location = location_of(&node);
    let id = generate_symbol_id(&state.file_path, kind, name, &location);
    let mut qualified = vec![state.file_path.clone()];
    qualified.extend(state.scope.iter().cloned());
    qualified.push(name.to_string());

    state.symbols.push(Symbol {
        id,
        name: name.to_string(),
        kind,
        framework_kind: detect_framework(&state.file_path, name, kind),
        fully_qualified_name: qualified.join("::"),
        signature: signature_of(node, source),
        documentation: doc_comment(node, source),
        language: state.language.clone(),
        location,
    });
}

/// Infers a framework sub-type from naming conventions and file location.
fn detect_framework(file_path: &str, name: &str, kind: SymbolKind) -> Option<FrameworkKind> {
    let jsx = file_path.ends_with(".tsx") || file_path.ends_with(".jsx");

    if kind == SymbolKind::Function && is_hook_name(name) {
        return Some(FrameworkKind::Hook);
    }
    if jsx
        && matches!(kind, SymbolKind::Function | SymbolKind::Class)
        && starts_uppercase(name)
    {
        return Some(FrameworkKind::Component);
    }
    if name.ends_with("Service") {
        return Some(FrameworkKind::Service);
    }
    if name.ends_with("Store") || name.ends_with("Slice") {
        return Some(FrameworkKind::Store);
    }
    if name.ends_with("Middleware") {
        return Some(FrameworkKind::Middleware);
    }
    if file_path.contains("/routes/") || file_path.contains("/pages/") {
        return Some(FrameworkKind::Route);
    }
    None
}

fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false)
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, source: &str) -> ParseOutcome {
        TypeScriptParser.parse(path, source).expect("parse failed")
    }

    #[test]
    fn test_extract_function_and_class() {
        let out = parse(
            "src/app.ts",
            "export function render(): void {}\nclass Engine {\n  start() {}\n}\n",
        );
        let names: Vec<&str> = out.symbols.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"render"));
        assert!(names.contains(&"Engine"));
        assert!(names.contains(&"start"));
        let start = out.symbols.iter().find(|s| s.name == "start").unwrap();
        assert_eq!(start.kind, SymbolKind::Method);
        assert_eq!(start.fully_qualified_name, "src/app.ts::Engine::start");
    }

    #[test]
    fn test_extract_named_import() {
        let out = parse("src/a.ts", "import { X, Y } from './b';\n");
        assert_eq!(out.imports.len(), 1);
        let import = &out.imports[0];
        assert_eq!(import.path, "./b");
        assert_eq!(import.specifiers, vec!["X", "Y"]);
        assert!(!import.is_default);
    }

    #[test]
    fn test_extract_default_import() {
        let out = parse("src/a.ts", "import React from 'react';\n");
        assert_eq!(out.imports.len(), 1);
        assert!(out.imports[0].is_default);
        assert_eq!(out.imports[0].specifiers, vec!["React"]);
    }

    #[test]
    fn test_hook_and_component_detection() {
        let out = parse(
            "src/Widget.tsx",
            "export function useCounter() {}\nexport function Widget() { return null; }\n",
        );
        let hook = out.symbols.iter().find(|s| s.name == "useCounter").unwrap();
        assert_eq!(hook.framework_kind, Some(FrameworkKind::Hook));
        let comp = out.symbols.iter().find(|s| s.name == "Widget").unwrap();
        assert_eq!(comp.framework_kind, Some(FrameworkKind::Component));
    }

    #[test]
    fn test_const_arrow_function() {
        let out = parse("src/a.ts", "const handler = () => {};\nconst LIMIT = 10;\n");
        let handler = out.symbols.iter().find(|s| s.name == "handler").unwrap();
        assert_eq!(handler.kind, SymbolKind::Function);
        let limit = out.symbols.iter().find(|s| s.name == "LIMIT").unwrap();
        assert_eq!(limit.kind, SymbolKind::Constant);
    }

    #[test]
    fn test_partial_parse_still_yields_symbols() {
        let out = parse("src/a.ts", "function ok() {}\nfunction broken( {\n");
        assert_eq!(out.quality, ParseQuality::Partial);
        assert!(out.symbols.iter().any(|s| s.name == "ok"));
        assert!(!out.errors.is_empty());
    }

    #[test]
    fn test_symbol_ids_stable() {
        let src = "export function render(): void {}\n";
        let a = parse("src/app.ts", src);
        let b = parse("src/app.ts", src);
        assert_eq!(a.symbols[0].id, b.symbols[0].id);
    }
}
