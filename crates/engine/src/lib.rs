//! Rule evaluation over document trees.
//!
//! Consumes a [`verdict_rules::RuleSet`] and a [`verdict_model::Node`] and
//! produces a [`verdict_report::ValidationReport`]. Evaluation holds no
//! state between calls; concurrent runs over separate inputs need no
//! synchronization.

pub mod error;
pub mod eval;
pub mod operators;

pub use error::EvalError;
pub use eval::{EvalOptions, RULE_CHAIN_LIMIT, evaluate};
