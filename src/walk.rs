//! Type-dispatched depth-first traversal over a normalized `Tree`.

use crate::normalize::{NodeId, Tree};
use crate::syntax::NodeKind;

/// Per-type handlers for `walk`.
///
/// Each handler returns `None` when the visitor has no handler for that type,
/// `Some(true)` to descend into the node, and `Some(false)` to prune it. A
/// node without a handler goes to `fallback`; without that either, the walk
/// descends.
pub trait Visitor {
    fn class_method(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn function_declaration(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn switch_case(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn variable_declarator(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn identifier(&mut self, _tree: &Tree, _id: NodeId, _name: &str) -> Option<bool> {
        None
    }

    fn binary_expression(&mut self, _tree: &Tree, _id: NodeId, _operator: &str) -> Option<bool> {
        None
    }

    fn assignment_expression(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn parenthesis_expression(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }

    fn numeric_literal(&mut self, _tree: &Tree, _id: NodeId, _value: f64) -> Option<bool> {
        None
    }

    fn fallback(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        None
    }
}

fn dispatch<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) -> bool {
    let handled = match &tree.node(id).kind {
        NodeKind::ClassMethod => visitor.class_method(tree, id),
        NodeKind::FunctionDeclaration => visitor.function_declaration(tree, id),
        NodeKind::SwitchCase => visitor.switch_case(tree, id),
        NodeKind::VariableDeclarator => visitor.variable_declarator(tree, id),
        NodeKind::Identifier(name) => visitor.identifier(tree, id, name),
        NodeKind::BinaryExpression(operator) => visitor.binary_expression(tree, id, operator),
        NodeKind::AssignmentExpression(_) => visitor.assignment_expression(tree, id),
        NodeKind::ParenthesisExpression => visitor.parenthesis_expression(tree, id),
        NodeKind::NumericLiteral(value) => visitor.numeric_literal(tree, id, *value),
        _ => None,
    };
    handled
        .or_else(|| visitor.fallback(tree, id))
        .unwrap_or(true)
}

/// Walks `root` and its descendants in pre-order.
pub fn walk<V: Visitor + ?Sized>(tree: &Tree, root: NodeId, visitor: &mut V) {
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if dispatch(visitor, tree, id) {
            stack.extend(tree.node(id).nodes.iter().rev().copied());
        }
    }
}
