//! Parser-facing syntax tree.
//!
//! A `SourceParser` produces a tree of `SyntaxNode`s. Nodes carry a type tag
//! (`NodeKind`, with the scalar payload the extractor needs), a span, and their
//! children grouped under a closed set of `Field` names. Children may be
//! nested inside spanless wrapper groups or lists; the normalizer flattens
//! those away.

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` byte range.
///
/// Spans produced by a parser are 1-based (position 0 is never a real
/// offset); the normalizer shifts them to 0-based buffer offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Type tag of a syntax node, carrying the type-specific scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    ClassDeclaration,
    ClassMethod,
    FunctionDeclaration,
    BlockStatement,
    SwitchStatement,
    SwitchCase,
    BreakStatement,
    ExpressionStatement,
    VariableDeclaration,
    VariableDeclarator,
    Identifier(String),
    NumericLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    /// Binary expression with its operator.
    BinaryExpression(String),
    /// Assignment expression with its operator (`=`, `+=`, ...).
    AssignmentExpression(String),
    ParenthesisExpression,
    TsTypeAnnotation,
    /// A syntax error or a token the parser had to invent.
    Invalid,
    /// Any other construct, tagged by name.
    Other(String),
}

impl NodeKind {
    /// Returns the type tag of this node kind.
    pub fn tag(&self) -> &str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::ClassDeclaration => "ClassDeclaration",
            NodeKind::ClassMethod => "ClassMethod",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::BlockStatement => "BlockStatement",
            NodeKind::SwitchStatement => "SwitchStatement",
            NodeKind::SwitchCase => "SwitchCase",
            NodeKind::BreakStatement => "BreakStatement",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::VariableDeclaration => "VariableDeclaration",
            NodeKind::VariableDeclarator => "VariableDeclarator",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::NumericLiteral(_) => "NumericLiteral",
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::BooleanLiteral(_) => "BooleanLiteral",
            NodeKind::BinaryExpression(_) => "BinaryExpression",
            NodeKind::AssignmentExpression(_) => "AssignmentExpression",
            NodeKind::ParenthesisExpression => "ParenthesisExpression",
            NodeKind::TsTypeAnnotation => "TsTypeAnnotation",
            NodeKind::Invalid => "Invalid",
            NodeKind::Other(tag) => tag,
        }
    }
}

/// Names under which a node holds its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// `SwitchCase` test value.
    Test,
    /// `SwitchCase` statements.
    Consequent,
    /// `VariableDeclarator` binding.
    Id,
    /// `VariableDeclarator` initializer.
    Init,
    /// Type annotation of a binding identifier.
    TypeAnnotation,
    Left,
    Right,
    Body,
    /// Anything without a more specific name.
    Children,
}

/// A child value: a spanned node, a spanless wrapper, or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Syntax {
    Node(SyntaxNode),
    Group(Vec<(Field, Syntax)>),
    List(Vec<Syntax>),
}

/// A spanned, typed syntax node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub span: Span,
    pub fields: Vec<(Field, Syntax)>,
}

impl SyntaxNode {
    /// Creates a node without children.
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        Self {
            kind,
            span,
            fields: Vec::new(),
        }
    }

    /// Adds a child under `field`, builder style.
    pub fn with(mut self, field: Field, child: impl Into<Syntax>) -> Self {
        self.fields.push((field, child.into()));
        self
    }
}

impl From<SyntaxNode> for Syntax {
    fn from(node: SyntaxNode) -> Self {
        Syntax::Node(node)
    }
}
