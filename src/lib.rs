//! verdict: a policy rule engine for structured documents.
//!
//! The engine parses a rule language (named rule blocks of path
//! comparisons combined with `and` / `or` / `not`), loads a YAML or JSON
//! document, and evaluates the rules against it, producing a JSON report
//! of pass/fail/skip outcomes with diagnostics.
//!
//! This crate is the integration layer: [`run_checks`] is the single
//! entry point an embedding glue layer (FFI, CLI, service) calls. The
//! pieces compose through the workspace crates and can be used directly
//! for finer control:
//!
//! ```
//! use verdict::{ValidateInput, run_checks};
//!
//! let report = run_checks(
//!     ValidateInput { content: "foo:\n  bar: true\n", name: "data.yaml" },
//!     ValidateInput { content: "rule check_foo { foo.bar == true }", name: "checks" },
//!     false,
//! ).unwrap();
//! assert!(report.contains("\"status\": \"PASS\""));
//! ```

use log::debug;
use thiserror::Error;

pub use verdict_engine::{EvalError, EvalOptions, evaluate};
pub use verdict_model::{Format, Node, ParseError, Scalar, parse};
pub use verdict_path::{Path, parse_path, resolve};
pub use verdict_report::{Status, ValidationReport};
pub use verdict_rules::{ReferenceError, RuleParseError, RuleSet, parse_rules};

/// Everything that can go wrong in a validation run. Parse failures name
/// the offending input; evaluation failures are structural (cycles,
/// recursion limits) since per-clause problems degrade to Fail outcomes
/// inside the report instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to parse document '{name}': {source}")]
    Document { name: String, source: ParseError },

    #[error("failed to parse rules '{name}': {source}")]
    Rules {
        name: String,
        source: RuleParseError,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One input to a validation run: its text and a display name. The name
/// feeds error messages and format detection (`.json` parses as JSON,
/// everything else as YAML).
#[derive(Debug, Clone, Copy)]
pub struct ValidateInput<'a> {
    pub content: &'a str,
    pub name: &'a str,
}

/// Validates a document against rule text and returns the serialized
/// JSON [`ValidationReport`]. Pure: no global state, no I/O; concurrent
/// calls need no synchronization.
pub fn run_checks(
    data: ValidateInput<'_>,
    rules: ValidateInput<'_>,
    verbose: bool,
) -> Result<String, Error> {
    debug!("validating '{}' against rules '{}'", data.name, rules.name);

    let document = parse(data.content, Format::from_name(data.name)).map_err(|source| {
        Error::Document {
            name: data.name.to_string(),
            source,
        }
    })?;
    let rule_set = parse_rules(rules.content).map_err(|source| Error::Rules {
        name: rules.name.to_string(),
        source,
    })?;

    let options = EvalOptions {
        strict: false,
        verbose,
    };
    let report = evaluate(&rule_set, &document, &options)?;
    Ok(report.to_json()?)
}

/// The engine's semantic version. Pure, no side effects.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_the_package_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_document_parse_failure_names_the_input() {
        let err = run_checks(
            ValidateInput {
                content: "foo: [1,\n",
                name: "broken.yaml",
            },
            ValidateInput {
                content: "rule r { a exists }",
                name: "checks",
            },
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_rules_parse_failure_names_the_input() {
        let err = run_checks(
            ValidateInput {
                content: "a: 1\n",
                name: "data",
            },
            ValidateInput {
                content: "rule r { == }",
                name: "checks.rules",
            },
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("checks.rules"));
    }
}


