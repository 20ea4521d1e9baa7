//! Resolves a parsed [`Path`] against a document tree.
//!
//! Resolution walks the tree one segment at a time, fanning the candidate
//! set out at wildcards and recursive descent. It borrows nodes from the
//! document and never copies them; an empty result set is a normal
//! outcome, not an error.

use crate::ast::{Path, Segment};
use crate::error::PathError;
use verdict_model::{Node, NodeKind};

/// Bound on descent depth; trips on degenerate or adversarial nesting
/// instead of overflowing the stack.
pub const MAX_DEPTH: usize = 1000;

/// A node located by path resolution, with the concrete document path
/// (wildcards expanded to the keys and indices actually taken).
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub path: String,
    pub node: &'a Node,
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn join_index(prefix: &str, index: usize) -> String {
    format!("{}[{}]", prefix, index)
}

/// Resolves `path` against `root`, returning every matching node in
/// document order.
pub fn resolve<'a>(path: &Path, root: &'a Node) -> Result<Vec<Resolved<'a>>, PathError> {
    let mut current = vec![Resolved {
        path: String::new(),
        node: root,
    }];

    for segment in &path.segments {
        let mut next = Vec::new();
        for candidate in &current {
            apply_segment(segment, candidate, &mut next)?;
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }
    Ok(current)
}

fn apply_segment<'a>(
    segment: &Segment,
    candidate: &Resolved<'a>,
    out: &mut Vec<Resolved<'a>>,
) -> Result<(), PathError> {
    match segment {
        Segment::Key(key) => {
            if let Some(child) = candidate.node.get(key) {
                out.push(Resolved {
                    path: join_key(&candidate.path, key),
                    node: child,
                });
            }
        }
        Segment::Index(raw) => {
            if let Some(items) = candidate.node.as_sequence() {
                let index = normalize_index(*raw, items.len());
                if let Some(index) = index {
                    out.push(Resolved {
                        path: join_index(&candidate.path, index),
                        node: &items[index],
                    });
                }
            }
        }
        Segment::AnyIndex => {
            if let Some(items) = candidate.node.as_sequence() {
                for (i, item) in items.iter().enumerate() {
                    out.push(Resolved {
                        path: join_index(&candidate.path, i),
                        node: item,
                    });
                }
            }
        }
        Segment::AnyValue => match &candidate.node.kind {
            NodeKind::Mapping(map) => {
                for (key, child) in map {
                    out.push(Resolved {
                        path: join_key(&candidate.path, key),
                        node: child,
                    });
                }
            }
            NodeKind::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    out.push(Resolved {
                        path: join_index(&candidate.path, i),
                        node: item,
                    });
                }
            }
            NodeKind::Scalar(_) => {}
        },
        Segment::Descendant => {
            descend(candidate, 0, out)?;
        }
    }
    Ok(())
}

fn normalize_index(raw: i64, len: usize) -> Option<usize> {
    let index = if raw < 0 { raw + len as i64 } else { raw };
    usize::try_from(index).ok().filter(|i| *i < len)
}

/// Collects the node and all its descendants, depth-first in document
/// order. The node itself is included so `a..b` also matches `a.b`.
fn descend<'a>(
    candidate: &Resolved<'a>,
    depth: usize,
    out: &mut Vec<Resolved<'a>>,
) -> Result<(), PathError> {
    if depth > MAX_DEPTH {
        return Err(PathError::RecursionLimit(MAX_DEPTH));
    }
    out.push(candidate.clone());
    match &candidate.node.kind {
        NodeKind::Mapping(map) => {
            for (key, child) in map {
                descend(
                    &Resolved {
                        path: join_key(&candidate.path, key),
                        node: child,
                    },
                    depth + 1,
                    out,
                )?;
            }
        }
        NodeKind::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                descend(
                    &Resolved {
                        path: join_index(&candidate.path, i),
                        node: item,
                    },
                    depth + 1,
                    out,
                )?;
            }
        }
        NodeKind::Scalar(_) => {}
    }
    Ok(())
}
