use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("path parse error in '{0}': {1}")]
    PathParse(String, String),

    #[error("recursion limit of {0} exceeded while resolving path")]
    RecursionLimit(usize),
}
