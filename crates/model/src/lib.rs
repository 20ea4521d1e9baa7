//! The normalized document tree that rules are evaluated against.
//!
//! A document (YAML or JSON) is loaded into a [`Node`] tree of scalars,
//! insertion-ordered mappings, and sequences. Every node remembers where it
//! came from in the source text so that diagnostics can point at real
//! lines and columns.

pub mod error;
pub mod node;
pub mod parse;
pub mod scalar;

pub use error::ParseError;
pub use node::{Mark, Node, NodeKind};
pub use parse::{Format, parse};
pub use scalar::{CompareError, Scalar};
