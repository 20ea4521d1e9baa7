use thiserror::Error;

/// A document could not be loaded. Positions are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} at line {line} column {column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}
