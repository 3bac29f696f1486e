/// Tree-sitter based TypeScript/TSX parser.
///
/// Lowers tree-sitter's concrete syntax tree into `SyntaxNode`s: named nodes
/// become typed nodes, comments and punctuation are dropped (comments stay in
/// the text gaps between nodes), and list-like containers become spanless
/// groups.
use tree_sitter::{Node as TsNode, Parser, Tree};

use crate::config::{ParseOptions, SourceSyntax};
use crate::errors::{CodeflowError, Result};
use crate::extraction::SourceParser;
use crate::syntax::{Field, NodeKind, Span, Syntax, SyntaxNode};

/// Parses TypeScript (or TSX) source with tree-sitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptParser;

impl TypeScriptParser {
    /// Parse source code into a tree-sitter AST.
    fn parse_source(source: &str, options: &ParseOptions) -> Result<Tree> {
        let mut parser = Parser::new();
        let language = match (options.syntax, options.tsx) {
            (SourceSyntax::Typescript, false) => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
            _ => tree_sitter_typescript::LANGUAGE_TSX,
        };
        parser
            .set_language(&language.into())
            .map_err(|e| CodeflowError::Parse {
                message: format!("failed to load TypeScript grammar: {e}"),
                line: None,
            })?;
        parser.parse(source, None).ok_or_else(|| CodeflowError::Parse {
            message: "tree-sitter parse returned None".to_string(),
            line: None,
        })
    }
}

impl SourceParser for TypeScriptParser {
    fn parse(&self, source: &str, options: &ParseOptions) -> Result<SyntaxNode> {
        let tree = Self::parse_source(source, options)?;
        let lowering = Lowering {
            source: source.as_bytes(),
        };
        match lowering.lower(tree.root_node()) {
            Some(Syntax::Node(root)) => Ok(root),
            _ => Err(CodeflowError::Parse {
                message: "source did not produce a program node".to_string(),
                line: Some(0),
            }),
        }
    }
}

/// Kinds whose children belong to the enclosing node.
const WRAPPER_KINDS: &[&str] = &["switch_body", "formal_parameters", "arguments"];

struct Lowering<'s> {
    source: &'s [u8],
}

impl Lowering<'_> {
    /// Gets the text of a tree-sitter node from the source.
    fn node_text(&self, node: TsNode<'_>) -> &str {
        node.utf8_text(self.source).unwrap_or_default()
    }

    /// 1-based span of a node.
    fn span(node: TsNode<'_>) -> Span {
        Span::new(node.start_byte() + 1, node.end_byte() + 1)
    }

    fn lower(&self, node: TsNode<'_>) -> Option<Syntax> {
        if node.is_error() || node.is_missing() {
            return Some(SyntaxNode::leaf(NodeKind::Invalid, Self::span(node)).into());
        }
        if !node.is_named() || node.kind() == "comment" {
            return None;
        }

        let kind = node.kind();
        if kind == "class_body" {
            return Some(Syntax::Group(self.class_members(node)));
        }
        if WRAPPER_KINDS.contains(&kind) {
            return Some(Syntax::Group(self.children(node)));
        }
        if kind == "variable_declarator" {
            return Some(self.lower_declarator(node).into());
        }

        Some(
            SyntaxNode {
                kind: self.kind_of(node),
                span: Self::span(node),
                fields: self.children(node),
            }
            .into(),
        )
    }

    /// Lowers all children of a node, grouped by field.
    fn children(&self, node: TsNode<'_>) -> Vec<(Field, Syntax)> {
        let mut entries = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let field = field_for(node.kind(), cursor.field_name());
                if let Some(child) = self.lower(cursor.node()) {
                    push_field(&mut entries, field, child);
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        entries
    }

    /// Class members own the decorators written before them: the member's
    /// span starts at its first decorator, so a leading comment sits in the
    /// member's gap.
    fn class_members(&self, node: TsNode<'_>) -> Vec<(Field, Syntax)> {
        let mut entries = Vec::new();
        let mut decorators: Vec<SyntaxNode> = Vec::new();
        let mut cursor = node.walk();
        if cursor.goto_first_child() {
            loop {
                let child = cursor.node();
                match self.lower(child) {
                    Some(Syntax::Node(decorator)) if child.kind() == "decorator" => {
                        decorators.push(decorator);
                    }
                    Some(Syntax::Node(mut member)) => {
                        if let Some(first) = decorators.first() {
                            member.span.start = member.span.start.min(first.span.start);
                        }
                        for decorator in decorators.drain(..) {
                            member.fields.push((Field::Children, decorator.into()));
                        }
                        push_field(&mut entries, Field::Children, member.into());
                    }
                    Some(other) => push_field(&mut entries, Field::Children, other),
                    None => {}
                }
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
        }
        for decorator in decorators {
            push_field(&mut entries, Field::Children, decorator.into());
        }
        entries
    }

    /// Declarators hold their type annotation on the bound identifier, whose
    /// span is widened to cover it.
    fn lower_declarator(&self, node: TsNode<'_>) -> SyntaxNode {
        let mut declarator = SyntaxNode::leaf(NodeKind::VariableDeclarator, Self::span(node));
        let annotation = node
            .child_by_field_name("type")
            .and_then(|ty| self.lower(ty));

        match node.child_by_field_name("name").and_then(|name| self.lower(name)) {
            Some(Syntax::Node(mut id)) if matches!(id.kind, NodeKind::Identifier(_)) => {
                if let Some(annotation) = annotation {
                    if let Syntax::Node(inner) = &annotation {
                        id.span.end = id.span.end.max(inner.span.end);
                    }
                    id.fields.push((Field::TypeAnnotation, annotation));
                }
                declarator.fields.push((Field::Id, id.into()));
            }
            Some(pattern) => {
                declarator.fields.push((Field::Id, pattern));
                if let Some(annotation) = annotation {
                    declarator.fields.push((Field::Children, annotation));
                }
            }
            None => {}
        }

        if let Some(init) = node
            .child_by_field_name("value")
            .and_then(|value| self.lower(value))
        {
            declarator.fields.push((Field::Init, init));
        }
        declarator
    }

    fn kind_of(&self, node: TsNode<'_>) -> NodeKind {
        match node.kind() {
            "program" => NodeKind::Module,
            "class_declaration" | "abstract_class_declaration" => NodeKind::ClassDeclaration,
            "method_definition" => self.method_kind(node),
            "function_declaration" | "generator_function_declaration" => {
                NodeKind::FunctionDeclaration
            }
            "statement_block" => NodeKind::BlockStatement,
            "switch_statement" => NodeKind::SwitchStatement,
            "switch_case" | "switch_default" => NodeKind::SwitchCase,
            "break_statement" => NodeKind::BreakStatement,
            "expression_statement" => NodeKind::ExpressionStatement,
            "lexical_declaration" | "variable_declaration" => NodeKind::VariableDeclaration,
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "private_property_identifier"
            | "undefined" => NodeKind::Identifier(self.node_text(node).to_string()),
            "number" if self.node_text(node).ends_with('n') => {
                NodeKind::Other("BigIntLiteral".to_string())
            }
            "number" => NodeKind::NumericLiteral(parse_number(self.node_text(node))),
            "string" => NodeKind::StringLiteral(string_value(self.node_text(node))),
            "true" => NodeKind::BooleanLiteral(true),
            "false" => NodeKind::BooleanLiteral(false),
            "binary_expression" => NodeKind::BinaryExpression(self.operator(node)),
            "assignment_expression" => NodeKind::AssignmentExpression("=".to_string()),
            "augmented_assignment_expression" => {
                NodeKind::AssignmentExpression(self.operator(node))
            }
            "parenthesized_expression" => NodeKind::ParenthesisExpression,
            "type_annotation" => NodeKind::TsTypeAnnotation,
            other => NodeKind::Other(tag_for(other)),
        }
    }

    /// Class members are `ClassMethod`s; object literal, private and
    /// constructor methods are not.
    fn method_kind(&self, node: TsNode<'_>) -> NodeKind {
        let in_class = node.parent().is_some_and(|p| p.kind() == "class_body");
        if !in_class {
            return NodeKind::Other("MethodProperty".to_string());
        }
        match node.child_by_field_name("name") {
            Some(name) if name.kind() == "private_property_identifier" => {
                NodeKind::Other("PrivateMethod".to_string())
            }
            Some(name) if self.node_text(name) == "constructor" => {
                NodeKind::Other("Constructor".to_string())
            }
            _ => NodeKind::ClassMethod,
        }
    }

    fn operator(&self, node: TsNode<'_>) -> String {
        node.child_by_field_name("operator")
            .map(|op| self.node_text(op).to_string())
            .unwrap_or_default()
    }
}

/// Maps a tree-sitter field of a parent kind onto the extractor's fields.
fn field_for(parent: &str, field: Option<&str>) -> Field {
    match (parent, field) {
        ("switch_case" | "switch_default", Some("value")) => Field::Test,
        ("switch_case" | "switch_default", _) => Field::Consequent,
        (_, Some("left")) => Field::Left,
        (_, Some("right")) => Field::Right,
        (_, Some("body")) => Field::Body,
        _ => Field::Children,
    }
}

/// Adds a child under `field`, turning repeated fields into lists.
fn push_field(entries: &mut Vec<(Field, Syntax)>, field: Field, child: Syntax) {
    match entries.iter_mut().find(|(f, _)| *f == field) {
        Some((_, Syntax::List(items))) => items.push(child),
        Some((_, existing)) => {
            let first = std::mem::replace(existing, Syntax::List(Vec::new()));
            *existing = Syntax::List(vec![first, child]);
        }
        None if field == Field::Consequent => entries.push((field, Syntax::List(vec![child]))),
        None => entries.push((field, child)),
    }
}

/// Type tag for kinds without a dedicated `NodeKind`.
fn tag_for(kind: &str) -> String {
    let renamed = match kind {
        "predefined_type" => "TsKeywordType",
        "union_type" => "TsUnionType",
        "type_identifier" => "TsTypeReference",
        "template_string" => "TemplateLiteral",
        "arrow_function" => "ArrowFunctionExpression",
        "object" => "ObjectExpression",
        "array" => "ArrayExpression",
        "pair" => "KeyValueProperty",
        "export_statement" => "ExportDeclaration",
        "import_statement" => "ImportDeclaration",
        "this" => "ThisExpression",
        "null" => "NullLiteral",
        "regex" => "RegExpLiteral",
        _ => "",
    };
    if !renamed.is_empty() {
        return renamed.to_string();
    }
    kind.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Numeric value of a JavaScript number literal (`NaN` if unreadable).
fn parse_number(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (radix, digits) = match cleaned.get(..2) {
        Some("0x" | "0X") => (16, &cleaned[2..]),
        Some("0o" | "0O") => (8, &cleaned[2..]),
        Some("0b" | "0B") => (2, &cleaned[2..]),
        _ => return cleaned.parse().unwrap_or(f64::NAN),
    };
    u64::from_str_radix(digits, radix)
        .map(|value| value as f64)
        .unwrap_or(f64::NAN)
}

/// Value of a quoted string literal with escapes resolved.
fn string_value(text: &str) -> String {
    let inner = text
        .get(1..text.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('\r') => {
                chars.next_if_eq(&'\n');
            }
            Some('\n') => {}
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut out, &hex);
            }
            Some('u') => {
                let hex: String = if chars.next_if_eq(&'{').is_some() {
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut out, &hex);
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn push_code_point(out: &mut String, hex: &str) {
    let decoded = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
}
