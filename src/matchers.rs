//! Positional matchers for the two statement shapes a step can take.
//!
//! Both matchers are small state machines driven by `walk`: every node they
//! accept must arrive at one fixed ordinal of the pre-order visit.

use crate::normalize::{NodeId, Tree};
use crate::types::{Edge, EdgeKind, Mode, Step};
use crate::walk::{walk, Visitor};

/// Control variable holding the branch condition.
pub const TEST_VAR: &str = "$test";

/// Ordinal state shared by both matchers.
#[derive(Debug, Default)]
struct Position {
    next: usize,
    failed: bool,
}

impl Position {
    /// Accepts the current visit if it is expected at `ordinal`. A miss fails
    /// the match for good.
    fn advance(&mut self, ordinal: Option<usize>) -> bool {
        let current = self.next;
        self.next += 1;
        if self.failed || ordinal != Some(current) {
            self.failed = true;
            return false;
        }
        true
    }
}

/// Matches `$test && ($next = N)` and its `||` / `$fail` / `$last` variants.
#[derive(Debug, Default)]
pub struct DecisionMatcher {
    position: Position,
    mode: Option<Mode>,
    kind: Option<EdgeKind>,
    target: f64,
}

impl DecisionMatcher {
    const COMPLETE: usize = 6;

    /// The decision step, if every position matched.
    pub fn finish(self) -> Option<Step> {
        if self.position.failed || self.position.next < Self::COMPLETE {
            return None;
        }
        let edge = Edge::new(self.target, self.mode?);
        Some(Step::decision(self.kind?, edge))
    }
}

impl Visitor for DecisionMatcher {
    fn binary_expression(&mut self, _tree: &Tree, _id: NodeId, operator: &str) -> Option<bool> {
        match Mode::from_operator(operator) {
            Some(mode) => {
                self.mode = Some(mode);
                Some(self.position.advance(Some(0)))
            }
            None => Some(self.position.advance(None)),
        }
    }

    fn identifier(&mut self, _tree: &Tree, _id: NodeId, name: &str) -> Option<bool> {
        if name == TEST_VAR {
            return Some(self.position.advance(Some(1)));
        }
        match EdgeKind::from_variable(name) {
            Some(kind) => {
                self.kind = Some(kind);
                Some(self.position.advance(Some(4)))
            }
            None => Some(self.position.advance(None)),
        }
    }

    fn parenthesis_expression(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        Some(self.position.advance(Some(2)))
    }

    fn assignment_expression(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        Some(self.position.advance(Some(3)))
    }

    fn numeric_literal(&mut self, _tree: &Tree, _id: NodeId, value: f64) -> Option<bool> {
        self.target = value;
        Some(self.position.advance(Some(5)))
    }

    fn fallback(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        Some(self.position.advance(None))
    }
}

/// Runs the decision matcher over an expression.
pub fn match_decision(tree: &Tree, expr: NodeId) -> Option<Step> {
    let mut matcher = DecisionMatcher::default();
    walk(tree, expr, &mut matcher);
    matcher.finish()
}

/// Matches `name = <expr>`, remembering the last unrecognized node as the
/// assigned expression.
#[derive(Debug)]
pub struct AssignmentMatcher {
    position: Position,
    name: String,
    inner: NodeId,
}

impl AssignmentMatcher {
    pub fn new(expr: NodeId) -> Self {
        Self {
            position: Position::default(),
            name: String::new(),
            inner: expr,
        }
    }

    /// `(name, inner)` on success, `("", expr)` otherwise.
    pub fn finish(self, expr: NodeId) -> (String, NodeId) {
        if self.position.failed {
            (String::new(), expr)
        } else {
            (self.name, self.inner)
        }
    }
}

impl Visitor for AssignmentMatcher {
    fn assignment_expression(&mut self, _tree: &Tree, _id: NodeId) -> Option<bool> {
        Some(self.position.advance(Some(0)))
    }

    fn identifier(&mut self, _tree: &Tree, _id: NodeId, name: &str) -> Option<bool> {
        self.name = name.to_string();
        Some(self.position.advance(Some(1)))
    }

    fn fallback(&mut self, _tree: &Tree, id: NodeId) -> Option<bool> {
        self.inner = id;
        Some(false)
    }
}

/// Runs the assignment matcher over an expression.
pub fn match_assignment(tree: &Tree, expr: NodeId) -> (String, NodeId) {
    let mut matcher = AssignmentMatcher::new(expr);
    walk(tree, expr, &mut matcher);
    matcher.finish(expr)
}
