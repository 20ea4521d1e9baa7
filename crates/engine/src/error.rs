use thiserror::Error;
use verdict_path::PathError;
use verdict_rules::ReferenceError;

/// A structural failure that aborts the whole run. Per-clause problems
/// (type mismatches, bad patterns) degrade that clause to Fail instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("recursion limit of {0} exceeded while following rule references")]
    RecursionLimit(usize),
}
