//! The document tree: scalars, insertion-ordered mappings, and sequences.

use crate::scalar::Scalar;
use indexmap::IndexMap;

/// Source position of a node, 1-based. JSON-loaded documents carry the
/// default mark since serde_json does not expose per-value positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub line: usize,
    pub column: usize,
}

impl Default for Mark {
    fn default() -> Self {
        Mark { line: 1, column: 1 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Mapping(IndexMap<String, Node>),
    Sequence(Vec<Node>),
}

/// One node of a loaded document. Owns its children exclusively and is
/// immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub mark: Mark,
    pub kind: NodeKind,
}

impl Node {
    pub fn scalar(scalar: Scalar, mark: Mark) -> Self {
        Node {
            mark,
            kind: NodeKind::Scalar(scalar),
        }
    }

    pub fn mapping(map: IndexMap<String, Node>, mark: Mark) -> Self {
        Node {
            mark,
            kind: NodeKind::Mapping(map),
        }
    }

    pub fn sequence(items: Vec<Node>, mark: Mark) -> Self {
        Node {
            mark,
            kind: NodeKind::Sequence(items),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Node>> {
        match &self.kind {
            NodeKind::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Child lookup by mapping key. Returns `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// True for empty strings, empty mappings, and empty sequences.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            NodeKind::Scalar(Scalar::String(s)) => s.is_empty(),
            NodeKind::Scalar(Scalar::Null) => true,
            NodeKind::Scalar(_) => false,
            NodeKind::Mapping(m) => m.is_empty(),
            NodeKind::Sequence(s) => s.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar(s) => s.type_name(),
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
        }
    }

    /// JSON rendering of the subtree, used when embedding values in reports.
    pub fn to_json(&self) -> serde_json::Value {
        match &self.kind {
            NodeKind::Scalar(s) => s.to_json(),
            NodeKind::Mapping(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            NodeKind::Sequence(s) => {
                serde_json::Value::Array(s.iter().map(Node::to_json).collect())
            }
        }
    }
}
