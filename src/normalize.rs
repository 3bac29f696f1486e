//! Re-linearizes a parsed syntax tree into one globally ordered node arena.
//!
//! Every spanned node gets its own descendant list (the nearest spanned nodes
//! below it, wrappers and lists flattened away), all lists are ordered by
//! span, and each node is annotated with the comment and indentation found in
//! the source gap that precedes it.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::trace;

use crate::syntax::{Field, NodeKind, Span, Syntax, SyntaxNode};

/// Position of a node in the global order of a `Tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// A normalized node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    /// 0-based `[start, end)` offsets into the normalized source text.
    pub span: Span,
    /// Nearest spanned descendants, in source order.
    pub nodes: Vec<NodeId>,
    /// Descendants reached through each named field, in source order.
    pub fields: Vec<(Field, NodeId)>,
    /// Raw comment text found before the node, starting at the first marker.
    pub comment: Option<String>,
    /// Whitespace between the last line break before the node and the node.
    pub prefix: Option<String>,
}

impl Node {
    /// First descendant reached through `field`.
    pub fn field(&self, field: Field) -> Option<NodeId> {
        self.fields_of(field).next()
    }

    /// All descendants reached through `field`.
    pub fn fields_of(&self, field: Field) -> impl Iterator<Item = NodeId> + '_ {
        self.fields
            .iter()
            .filter(move |(f, _)| *f == field)
            .map(|(_, id)| *id)
    }
}

/// All nodes of a parsed source, in global order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// The outermost node, if the tree is not empty.
    pub fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(NodeId(0))
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in global order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Source text covered by a node, or `""` if the span does not fit `text`.
    pub fn text<'t>(&self, id: NodeId, text: &'t str) -> &'t str {
        let span = self.node(id).span;
        text.get(span.start..span.end).unwrap_or("")
    }
}

/// A node collected during traversal, before global ordering.
struct Staged {
    kind: NodeKind,
    span: Span,
    list: usize,
    fields: Vec<(Field, usize)>,
}

enum Item<'a> {
    Node(&'a SyntaxNode),
    Group(&'a [(Field, Syntax)]),
    List(&'a [Syntax]),
}

impl<'a> From<&'a Syntax> for Item<'a> {
    fn from(value: &'a Syntax) -> Self {
        match value {
            Syntax::Node(node) => Item::Node(node),
            Syntax::Group(fields) => Item::Group(fields),
            Syntax::List(items) => Item::List(items),
        }
    }
}

struct Pending<'a> {
    list: usize,
    owner: Option<(usize, Field)>,
    item: Item<'a>,
}

/// Returns true when `x` must come before `y`: it starts earlier, or starts at
/// the same offset and ends later (an enclosing node precedes what it holds).
///
/// Spans that start together and end together are never reordered.
fn precedes(x: &Span, y: &Span) -> bool {
    if x.start < y.start {
        return true;
    }
    if x.start > y.start {
        return false;
    }
    x.end > y.end
}

fn span_order(x: &Span, y: &Span) -> Ordering {
    if precedes(x, y) {
        Ordering::Less
    } else if precedes(y, x) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Normalizes a parsed tree against the text it was parsed from.
pub fn normalize(root: &SyntaxNode, text: &str) -> Tree {
    let mut staged: Vec<Staged> = Vec::new();
    let mut lists: Vec<Vec<usize>> = vec![Vec::new()];
    let mut stack = vec![Pending {
        list: 0,
        owner: None,
        item: Item::Node(root),
    }];

    while let Some(Pending { list, owner, item }) = stack.pop() {
        match item {
            Item::Node(node) => {
                let id = staged.len();
                let own = lists.len();
                lists.push(Vec::new());
                lists[list].push(id);
                if let Some((parent, field)) = owner {
                    staged[parent].fields.push((field, id));
                }
                staged.push(Staged {
                    kind: node.kind.clone(),
                    span: node.span,
                    list: own,
                    fields: Vec::new(),
                });
                for (field, child) in &node.fields {
                    stack.push(Pending {
                        list: own,
                        owner: Some((id, *field)),
                        item: child.into(),
                    });
                }
            }
            Item::Group(fields) => {
                for (_, child) in fields {
                    stack.push(Pending {
                        list,
                        owner,
                        item: child.into(),
                    });
                }
            }
            Item::List(items) => {
                for child in items {
                    stack.push(Pending {
                        list,
                        owner,
                        item: child.into(),
                    });
                }
            }
        }
    }

    let order = |a: &usize, b: &usize| span_order(&staged[*a].span, &staged[*b].span);
    for list in &mut lists {
        list.sort_by(order);
    }
    let mut global: Vec<usize> = lists.iter().flatten().copied().collect();
    global.sort_by(order);

    let mut position = vec![0; staged.len()];
    for (index, &id) in global.iter().enumerate() {
        position[id] = index;
    }

    let mut nodes: Vec<Node> = global
        .iter()
        .map(|&id| {
            let entry = &staged[id];
            let mut fields: Vec<(Field, NodeId)> = entry
                .fields
                .iter()
                .map(|(field, child)| (*field, NodeId(position[*child])))
                .collect();
            fields.sort_by_key(|(_, child)| *child);
            Node {
                kind: entry.kind.clone(),
                span: Span::new(
                    entry.span.start.saturating_sub(1),
                    entry.span.end.saturating_sub(1),
                ),
                nodes: lists[entry.list]
                    .iter()
                    .map(|child| NodeId(position[*child]))
                    .collect(),
                fields,
                comment: None,
                prefix: None,
            }
        })
        .collect();

    attribute_gaps(&mut nodes, text);
    trace!(nodes = nodes.len(), lists = lists.len(), "normalized syntax tree");

    Tree { nodes }
}

/// Attaches the comment and indentation of the text gap before each node.
fn attribute_gaps(nodes: &mut [Node], text: &str) {
    let mut last = Span::default();
    for node in nodes.iter_mut() {
        let next = node.span;
        // An overlapping predecessor is an ancestor: only claim text from its
        // start so the gap does not reach back into a sibling.
        let from = if last.end > next.start {
            last.start
        } else {
            last.end
        };
        let gap = text.get(from..next.start).unwrap_or("");
        node.comment = leading_comment(gap);
        node.prefix = indent_prefix(gap);
        last = next;
    }
}

/// The gap from its first `//` or `/*` marker onwards.
fn leading_comment(gap: &str) -> Option<String> {
    let marker = [gap.find("//"), gap.find("/*")]
        .into_iter()
        .flatten()
        .min()?;
    Some(gap[marker..].to_string())
}

/// Whitespace of the gap's last line.
fn indent_prefix(gap: &str) -> Option<String> {
    let tail = match gap.rfind('\n') {
        Some(newline) => &gap[newline + 1..],
        None => gap,
    };
    let prefix: String = tail.chars().filter(|c| c.is_whitespace()).collect();
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}
