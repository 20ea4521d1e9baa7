//! Scalar values and the typed comparison rules between them.
//!
//! Comparisons are tagged, not duck-typed: ordering a string against a
//! number is a [`CompareError`], never an implicit coercion. Equality is
//! total (mismatched types are simply unequal), since rules routinely
//! probe values whose type they cannot know up front.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("cannot order {left} against {right}")]
    Incompatible {
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot order {0} values")]
    Unordered(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// Total equality. Ints and floats compare numerically; any other
    /// cross-type comparison is unequal.
    pub fn equals(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Int(l), Scalar::Float(r)) => (*l as f64) == *r,
            (Scalar::Float(l), Scalar::Int(r)) => *l == (*r as f64),
            (l, r) => l == r,
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`. Numbers order numerically,
    /// strings lexicographically; everything else is incompatible.
    pub fn ordering(&self, other: &Scalar) -> Result<Ordering, CompareError> {
        match (self, other) {
            (Scalar::Int(l), Scalar::Int(r)) => Ok(l.cmp(r)),
            (Scalar::String(l), Scalar::String(r)) => Ok(l.cmp(r)),
            (l, r) if l.is_number() && r.is_number() => l
                .as_f64()
                .partial_cmp(&r.as_f64())
                .ok_or(CompareError::Unordered("float")),
            (l, r) => Err(CompareError::Incompatible {
                left: l.type_name(),
                right: r.type_name(),
            }),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Scalar::Int(i) => *i as f64,
            Scalar::Float(f) => *f,
            _ => f64::NAN,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Value::from(*f),
            Scalar::String(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::String(s) => write!(f, "\"{}\"", s),
        }
    }
}
