use thiserror::Error;

/// Rule source text could not be parsed. Positions are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line} column {column}")]
pub struct RuleParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A named-rule reference problem. Circular references are structural and
/// abort a run; undefined references degrade the referring clause to Fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceError {
    #[error("rule '{0}' is not defined")]
    Undefined(String),

    #[error("circular rule reference: {}", chain.join(" -> "))]
    Circular { chain: Vec<String> },
}
