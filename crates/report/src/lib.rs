//! Validation report types and the status algebra used to aggregate them.
//!
//! A report is built once per validation run and is immutable after it is
//! returned. Outcomes keep the order their clauses were declared in the
//! rule source, and the whole report round-trips through JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a clause, rule, or whole run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("PASS"),
            Status::Fail => f.write_str("FAIL"),
            Status::Skip => f.write_str("SKIP"),
        }
    }
}

impl Status {
    /// Conjunction: Fail dominates, Skip is the identity.
    pub fn and(self, other: Status) -> Status {
        match (self, other) {
            (Status::Fail, _) | (_, Status::Fail) => Status::Fail,
            (Status::Pass, _) | (_, Status::Pass) => Status::Pass,
            _ => Status::Skip,
        }
    }

    /// Disjunction: Pass dominates, Skip is the identity.
    pub fn or(self, other: Status) -> Status {
        match (self, other) {
            (Status::Pass, _) | (_, Status::Pass) => Status::Pass,
            (Status::Fail, _) | (_, Status::Fail) => Status::Fail,
            _ => Status::Skip,
        }
    }

    /// Negation: Skip propagates unchanged.
    pub fn invert(self) -> Status {
        match self {
            Status::Pass => Status::Fail,
            Status::Fail => Status::Pass,
            Status::Skip => Status::Skip,
        }
    }
}

/// One matched document location inside a clause; emitted in verbose runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CandidateOutcome {
    pub path: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a single clause instantiation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClauseOutcome {
    /// The clause as written (path, operator, expected value).
    pub clause: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<CandidateOutcome>,
}

/// Outcome of one named rule, with its clauses in declaration order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub name: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clauses: Vec<ClauseOutcome>,
}

/// The aggregated result of one validation run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub status: Status,
    pub rules: Vec<RuleOutcome>,
}

impl ValidationReport {
    /// Aggregates per-rule outcomes. Overall status is Fail when any rule
    /// Fails; Skips only count against it in strict mode.
    pub fn from_rules(rules: Vec<RuleOutcome>, strict: bool) -> ValidationReport {
        let mut status = Status::Pass;
        for rule in &rules {
            let effective = match rule.status {
                Status::Skip if strict => Status::Fail,
                other => other,
            };
            if effective == Status::Fail {
                status = Status::Fail;
            }
        }
        ValidationReport { status, rules }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<ValidationReport, serde_json::Error> {
        serde_json::from_str(text)
    }
}
