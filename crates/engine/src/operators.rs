//! Applies comparison predicates to resolved document nodes.
//!
//! Binary predicates return `Err` with a human-readable reason when the
//! operand types make the comparison meaningless; the evaluator turns
//! that into a clause failure rather than aborting the run.

use regex::Regex;
use std::cmp::Ordering;
use verdict_model::{Node, NodeKind, Scalar};
use verdict_rules::{CmpOp, Literal, UnaryOp};

/// Whether a unary check holds for a node. `exists` is trivially true
/// here: emptiness of the candidate set is decided before this point.
pub fn unary_holds(op: UnaryOp, node: &Node) -> bool {
    match op {
        UnaryOp::Exists => true,
        UnaryOp::Empty => node.is_empty(),
        UnaryOp::IsString => matches!(&node.kind, NodeKind::Scalar(Scalar::String(_))),
        UnaryOp::IsList => node.as_sequence().is_some(),
        UnaryOp::IsMap => node.as_mapping().is_some(),
        UnaryOp::IsNumber => node.as_scalar().is_some_and(Scalar::is_number),
        UnaryOp::IsBool => matches!(&node.kind, NodeKind::Scalar(Scalar::Bool(_))),
    }
}

/// Whether `actual <op> expected` holds.
pub fn binary_holds(op: CmpOp, actual: &Node, expected: &Literal) -> Result<bool, String> {
    match op {
        CmpOp::Eq => equals(actual, expected),
        CmpOp::Ne => equals(actual, expected).map(|b| !b),
        CmpOp::Gt | CmpOp::Ge | CmpOp::Lt | CmpOp::Le => {
            let left = scalar_of(actual)?;
            let right = expected_scalar(expected)?;
            let ord = left.ordering(right).map_err(|e| e.to_string())?;
            Ok(matches!(
                (op, ord),
                (CmpOp::Gt, Ordering::Greater)
                    | (CmpOp::Ge, Ordering::Greater | Ordering::Equal)
                    | (CmpOp::Lt, Ordering::Less)
                    | (CmpOp::Le, Ordering::Less | Ordering::Equal)
            ))
        }
        CmpOp::In => {
            let candidates = match expected {
                Literal::List(items) => items.as_slice(),
                single => std::slice::from_ref(single),
            };
            for candidate in candidates {
                if equals(actual, candidate)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        CmpOp::Matches => {
            let text = scalar_of(actual)?
                .as_str()
                .ok_or_else(|| format!("matches requires a string, found {}", actual.type_name()))?;
            let pattern = match expected {
                Literal::Regex(p) => p,
                Literal::Scalar(Scalar::String(p)) => p,
                other => return Err(format!("matches requires a pattern, found {}", other)),
            };
            let re = Regex::new(pattern)
                .map_err(|e| format!("invalid pattern /{}/: {}", pattern, e))?;
            Ok(re.is_match(text))
        }
    }
}

/// Structural equality between a document node and a literal. Sequences
/// compare element-wise against list literals; a container against a
/// scalar is simply unequal rather than an error, since `==`/`!=` are
/// routinely used to probe values of unknown shape.
fn equals(actual: &Node, expected: &Literal) -> Result<bool, String> {
    match expected {
        Literal::Scalar(s) => Ok(actual.as_scalar().is_some_and(|a| a.equals(s))),
        Literal::List(items) => match actual.as_sequence() {
            Some(seq) if seq.len() == items.len() => {
                for (node, literal) in seq.iter().zip(items) {
                    if !equals(node, literal)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        },
        Literal::Regex(_) => Err("a regex literal requires the matches operator".to_string()),
    }
}

fn scalar_of(node: &Node) -> Result<&Scalar, String> {
    node.as_scalar()
        .ok_or_else(|| format!("expected a scalar value, found {}", node.type_name()))
}

fn expected_scalar(expected: &Literal) -> Result<&Scalar, String> {
    match expected {
        Literal::Scalar(s) => Ok(s),
        other => Err(format!("ordering requires a scalar value, found {}", other)),
    }
}

/// Renders the actual value for diagnostics; containers render as their
/// type to keep messages bounded.
pub fn render_actual(node: &Node) -> String {
    match node.as_scalar() {
        Some(s) => s.to_string(),
        None => format!("a {}", node.type_name()),
    }
}
