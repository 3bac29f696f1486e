//! Builds the flowchart model of one annotated function or method.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::annotations::{extract_annotations, extract_headers};
use crate::matchers::{match_assignment, match_decision};
use crate::normalize::{NodeId, Tree};
use crate::syntax::{Field, NodeKind};
use crate::types::{InitValue, Method, Sequence, Step, VarSpec};
use crate::walk::{walk, Visitor};

/// Prefix of the step machine's control variables.
pub const CONTROL_SIGIL: char = '$';

static BODY_INDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n( +)\S").expect("valid indent regex"));

/// Extracts a `Method` from a `ClassMethod` or `FunctionDeclaration` node.
///
/// Returns `None` when the node's comment does not carry both an `id` and a
/// `name` header tag.
pub fn extract_method(tree: &Tree, id: NodeId, text: &str) -> Option<Method> {
    let node = tree.node(id);
    let headers = extract_headers(node.comment.as_deref().unwrap_or(""));
    let Some((method_id, name)) = headers.identity() else {
        debug!(
            kind = node.kind.tag(),
            start = node.span.start,
            "skipping construct without codeflow id and name"
        );
        return None;
    };

    let header_indent = node.prefix.as_deref().map_or(0, |p| p.chars().count());
    let mut builder = MethodBuilder {
        text,
        vars: Vec::new(),
        body: Vec::new(),
    };
    walk(tree, id, &mut builder);

    debug!(
        id = method_id,
        sequences = builder.body.len(),
        vars = builder.vars.len(),
        "extracted codeflow method"
    );

    Some(Method {
        id: method_id.to_string(),
        name: name.to_string(),
        info: headers.get("info").map(str::to_string),
        px: headers.get("px").map(str::to_string),
        indent: [body_indent(tree.text(id, text)), header_indent],
        span: [node.span.start, node.span.end],
        vars: builder.vars,
        body: builder.body,
    })
}

/// Width of the first space-indented line of `code`.
fn body_indent(code: &str) -> usize {
    BODY_INDENT_RE
        .captures(code)
        .map_or(0, |caps| caps[1].len())
}

/// Trims a statement's source and removes its indentation from every line.
fn reindent(code: &str, prefix: &str) -> String {
    code.trim()
        .split('\n')
        .map(|line| line.strip_prefix(prefix).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Case values are step ids and must be integral.
fn step_id(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

fn literal_value(kind: &NodeKind) -> Option<InitValue> {
    match kind {
        NodeKind::BooleanLiteral(value) => Some(InitValue::Bool(*value)),
        NodeKind::StringLiteral(value) => Some(InitValue::String(value.clone())),
        NodeKind::NumericLiteral(value) => match step_id(*value) {
            Some(int) => Some(InitValue::Number(int.into())),
            None => serde_json::Number::from_f64(*value).map(InitValue::Number),
        },
        _ => None,
    }
}

struct MethodBuilder<'t> {
    text: &'t str,
    vars: Vec<VarSpec>,
    body: Vec<Sequence>,
}

impl MethodBuilder<'_> {
    fn sequence(&self, tree: &Tree, id: NodeId) -> Option<Sequence> {
        let node = tree.node(id);
        let test = node.field(Field::Test)?;
        let NodeKind::NumericLiteral(value) = tree.node(test).kind else {
            return None;
        };
        let case_id = step_id(value)?;

        let mut steps = Vec::new();
        for statement in node.fields_of(Field::Consequent) {
            if tree.node(statement).kind == NodeKind::BreakStatement {
                break;
            }
            steps.push(self.step(tree, statement));
        }

        if steps.is_empty() {
            None
        } else {
            Some(Sequence { id: case_id, steps })
        }
    }

    fn step(&self, tree: &Tree, statement: NodeId) -> Step {
        let node = tree.node(statement);
        let mut inner = statement;
        if node.kind == NodeKind::ExpressionStatement {
            if let Some(first) = node.nodes.first() {
                inner = *first;
            }
        }

        let mut step = match match_decision(tree, inner) {
            Some(step) => step,
            None => {
                let (assign, expr) = match_assignment(tree, inner);
                let code = reindent(
                    tree.text(expr, self.text),
                    node.prefix.as_deref().unwrap_or(""),
                );
                Step::code(code, Some(assign).filter(|name| !name.is_empty()))
            }
        };
        step.annotate(extract_annotations(node.comment.as_deref().unwrap_or("")));
        step
    }

    fn var_spec(&self, tree: &Tree, id: NodeId) -> Option<VarSpec> {
        let node = tree.node(id);
        let binding = tree.node(node.field(Field::Id)?);
        let NodeKind::Identifier(name) = &binding.kind else {
            return None;
        };
        if name.starts_with(CONTROL_SIGIL) {
            return None;
        }

        let ty = binding
            .field(Field::TypeAnnotation)
            .and_then(|annotation| self.type_text(tree, annotation));
        let init = node
            .field(Field::Init)
            .and_then(|init| literal_value(&tree.node(init).kind));

        Some(VarSpec {
            name: name.clone(),
            ty,
            init,
        })
    }

    /// Source of a type annotation without its leading `:`.
    fn type_text(&self, tree: &Tree, annotation: NodeId) -> Option<String> {
        let nodes = &tree.node(annotation).nodes;
        let start = tree.node(*nodes.first()?).span.start;
        let end = tree.node(*nodes.last()?).span.end;
        self.text.get(start..end).map(str::to_string)
    }
}

impl Visitor for MethodBuilder<'_> {
    fn switch_case(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        if let Some(sequence) = self.sequence(tree, id) {
            self.body.push(sequence);
        }
        Some(false)
    }

    fn variable_declarator(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        if let Some(spec) = self.var_spec(tree, id) {
            self.vars.push(spec);
        }
        Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindent_strips_statement_prefix() {
        let code = "call({\n        a: 1,\n    })";
        assert_eq!(reindent(code, "    "), "call({\n    a: 1,\n})");
    }

    #[test]
    fn test_body_indent_reads_first_indented_line() {
        assert_eq!(body_indent("function f() {\n\n   x();\n  y();\n}"), 3);
        assert_eq!(body_indent("function f() {}"), 0);
    }

    #[test]
    fn test_step_id_requires_integral_value() {
        assert_eq!(step_id(3.0), Some(3));
        assert_eq!(step_id(2.5), None);
        assert_eq!(step_id(f64::NAN), None);
    }
}
