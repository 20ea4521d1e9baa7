//! A path expression language over document trees.
//!
//! Paths locate zero or more nodes inside a [`verdict_model::Node`] tree
//! using dotted keys, bracketed indices, wildcards (`*`, `[*]`), and
//! recursive descent (`..`). The rule language embeds this parser for the
//! left-hand side of every comparison clause.

pub mod ast;
pub mod error;
mod parser;
pub mod resolve;

// --- Public API ---
pub use ast::{Path, Segment};
pub use error::PathError;
pub use parser::{parse_path, path};
pub use resolve::{MAX_DEPTH, Resolved, resolve};
