//! The evaluation engine: walks a parsed rule set against a document.
//!
//! Each call is a pure function of (rules, document, options). Rule
//! statuses are memoized per run so a rule referenced by several others
//! is only evaluated once; the visited-set resolution pass has already
//! ruled out reference cycles before evaluation starts.

use crate::error::EvalError;
use crate::operators::{binary_holds, render_actual, unary_holds};
use log::{debug, trace};
use std::collections::HashMap;
use verdict_model::Node;
use verdict_path::resolve;
use verdict_report::{CandidateOutcome, ClauseOutcome, RuleOutcome, Status, ValidationReport};
use verdict_rules::{Comparison, Expr, Predicate, ReferenceError, Rule, RuleSet, UnaryOp};

/// Bound on rule-reference chain length. Cycles are caught beforehand;
/// this is the backstop against pathological but acyclic chains.
pub const RULE_CHAIN_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Default)]
pub struct EvalOptions {
    /// Count Skip as Fail in the overall status.
    pub strict: bool,
    /// Include per-candidate detail in clause outcomes.
    pub verbose: bool,
}

/// Evaluates every rule in declaration order and aggregates the report.
pub fn evaluate(
    rules: &RuleSet,
    document: &Node,
    options: &EvalOptions,
) -> Result<ValidationReport, EvalError> {
    rules.resolve()?;

    let mut ctx = EvalContext {
        rules,
        document,
        options: *options,
        memo: HashMap::new(),
        depth: 0,
    };

    let mut outcomes = Vec::with_capacity(rules.rules.len());
    for rule in &rules.rules {
        let outcome = ctx.eval_rule(rule)?;
        debug!("rule {} -> {}", outcome.name, outcome.status);
        ctx.memo.insert(rule.name.as_str(), outcome.status);
        outcomes.push(outcome);
    }
    Ok(ValidationReport::from_rules(outcomes, options.strict))
}

/// All state for one evaluation run.
struct EvalContext<'a> {
    rules: &'a RuleSet,
    document: &'a Node,
    options: EvalOptions,
    memo: HashMap<&'a str, Status>,
    depth: usize,
}

impl<'a> EvalContext<'a> {
    fn eval_rule(&mut self, rule: &'a Rule) -> Result<RuleOutcome, EvalError> {
        if let Some(when) = &rule.when {
            // Guard clauses decide applicability; they are not reported.
            let mut scratch = Vec::new();
            let guard = self.eval_expr(when, &mut scratch)?;
            if guard != Status::Pass {
                return Ok(RuleOutcome {
                    name: rule.name.clone(),
                    status: Status::Skip,
                    message: Some("when condition did not hold".to_string()),
                    clauses: Vec::new(),
                });
            }
        }

        let mut clauses = Vec::new();
        let status = self.eval_expr(&rule.body, &mut clauses)?;
        Ok(RuleOutcome {
            name: rule.name.clone(),
            status,
            message: None,
            clauses,
        })
    }

    /// Evaluates a clause tree, appending one outcome per clause. All
    /// children are evaluated (no short-circuit) so the report covers
    /// every clause even when the combinator's result is already known.
    fn eval_expr(
        &mut self,
        expr: &'a Expr,
        out: &mut Vec<ClauseOutcome>,
    ) -> Result<Status, EvalError> {
        match expr {
            Expr::Comparison(clause) => self.eval_comparison(clause, false, out),
            Expr::Not(inner) => match &**inner {
                // Negation is applied per candidate so diagnostics cite
                // the value that unexpectedly matched.
                Expr::Comparison(clause) => self.eval_comparison(clause, true, out),
                other => Ok(self.eval_expr(other, out)?.invert()),
            },
            Expr::RuleRef { name, location } => {
                let (status, message) = match self.rule_status(name)? {
                    Some(status) => (status, None),
                    None => (
                        Status::Fail,
                        Some(ReferenceError::Undefined(name.clone()).to_string()),
                    ),
                };
                out.push(ClauseOutcome {
                    clause: name.clone(),
                    status,
                    message,
                    line: location.line,
                    column: location.column,
                    candidates: Vec::new(),
                });
                Ok(status)
            }
            Expr::And(children) => {
                let mut status = Status::Skip;
                for child in children {
                    status = status.and(self.eval_expr(child, out)?);
                }
                Ok(status)
            }
            Expr::Or(children) => {
                let mut status = Status::Skip;
                for child in children {
                    status = status.or(self.eval_expr(child, out)?);
                }
                Ok(status)
            }
        }
    }

    /// Status of a referenced rule, evaluated on demand and memoized.
    /// `None` means the name is not defined.
    fn rule_status(&mut self, name: &str) -> Result<Option<Status>, EvalError> {
        if let Some(status) = self.memo.get(name) {
            return Ok(Some(*status));
        }
        let Some(rule) = self.rules.rule(name) else {
            return Ok(None);
        };
        if self.depth >= RULE_CHAIN_LIMIT {
            return Err(EvalError::RecursionLimit(RULE_CHAIN_LIMIT));
        }
        self.depth += 1;
        let outcome = self.eval_rule(rule)?;
        self.depth -= 1;
        self.memo.insert(&rule.name, outcome.status);
        Ok(Some(outcome.status))
    }

    fn eval_comparison(
        &mut self,
        clause: &Comparison,
        negated: bool,
        out: &mut Vec<ClauseOutcome>,
    ) -> Result<Status, EvalError> {
        let resolved = resolve(&clause.path, self.document)?;
        let title = if negated {
            format!("not {}", clause)
        } else {
            clause.to_string()
        };

        if resolved.is_empty() {
            let (status, reason) = self.empty_outcome(clause, negated);
            trace!("clause {} -> {} (unresolved)", title, status);
            out.push(ClauseOutcome {
                clause: title,
                status,
                message: Some(self.compose_message(clause, reason)),
                line: clause.location.line,
                column: clause.location.column,
                candidates: Vec::new(),
            });
            return Ok(status);
        }

        let mut candidates = Vec::with_capacity(resolved.len());
        for found in &resolved {
            let held = match &clause.predicate {
                Predicate::Unary(op) => Ok(unary_holds(*op, found.node)),
                Predicate::Binary { op, value } => binary_holds(*op, found.node, value),
            };
            let (status, message) = match held {
                Ok(held) => {
                    let held = if negated { !held } else { held };
                    if held {
                        (Status::Pass, None)
                    } else {
                        (Status::Fail, Some(self.describe_failure(clause, negated, found)))
                    }
                }
                // A comparison the types cannot support degrades this
                // candidate to Fail; the run continues.
                Err(reason) => (
                    Status::Fail,
                    Some(format!("{} at {}", reason, found.path)),
                ),
            };
            candidates.push(CandidateOutcome {
                path: found.path.clone(),
                status,
                message,
            });
        }

        let mut status = Status::Skip;
        for candidate in &candidates {
            status = if clause.any {
                status.or(candidate.status)
            } else {
                status.and(candidate.status)
            };
        }
        let message = match status {
            Status::Fail => candidates
                .iter()
                .find(|c| c.status == Status::Fail)
                .and_then(|c| c.message.clone())
                .map(|reason| self.compose_message(clause, reason)),
            _ => None,
        };
        trace!("clause {} -> {}", title, status);

        out.push(ClauseOutcome {
            clause: title,
            status,
            message,
            line: clause.location.line,
            column: clause.location.column,
            candidates: if self.options.verbose {
                candidates
            } else {
                Vec::new()
            },
        });
        Ok(status)
    }

    /// Outcome of a clause whose path matched nothing. Only existence
    /// checks turn emptiness into a hard result; everything else skips.
    fn empty_outcome(&self, clause: &Comparison, negated: bool) -> (Status, String) {
        match &clause.predicate {
            Predicate::Unary(UnaryOp::Exists) => {
                if negated {
                    (
                        Status::Pass,
                        format!("path {} did not resolve", clause.path),
                    )
                } else {
                    (
                        Status::Fail,
                        format!("expected {} to exist, but the path did not resolve", clause.path),
                    )
                }
            }
            _ => (
                Status::Skip,
                format!("path {} did not resolve", clause.path),
            ),
        }
    }

    fn describe_failure(
        &self,
        clause: &Comparison,
        negated: bool,
        found: &verdict_path::Resolved<'_>,
    ) -> String {
        let not = if negated { "not " } else { "" };
        match &clause.predicate {
            Predicate::Binary { op, value } => format!(
                "expected {}{} {}, found {} at {}",
                not,
                op,
                value,
                render_actual(found.node),
                found.path
            ),
            Predicate::Unary(op) => format!(
                "expected {}{}, found {} at {}",
                not,
                op,
                render_actual(found.node),
                found.path
            ),
        }
    }

    /// Folds the clause's custom `<<` message into the diagnostic.
    fn compose_message(&self, clause: &Comparison, reason: String) -> String {
        match &clause.message {
            Some(custom) => format!("{} ({})", reason, custom),
            None => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_model::{Format, parse};
    use verdict_rules::parse_rules;

    fn run(rules: &str, doc: &str) -> ValidationReport {
        run_with(rules, doc, EvalOptions::default())
    }

    fn run_with(rules: &str, doc: &str, options: EvalOptions) -> ValidationReport {
        let rules = parse_rules(rules).unwrap();
        let document = parse(doc, Format::Yaml).unwrap();
        evaluate(&rules, &document, &options).unwrap()
    }

    #[test]
    fn test_simple_pass() {
        let report = run("rule check_foo { foo.bar == true }", "foo:\n  bar: true\n");
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.rules[0].clauses.len(), 1);
        assert_eq!(report.rules[0].clauses[0].status, Status::Pass);
    }

    #[test]
    fn test_simple_fail_cites_path_and_expectation() {
        let report = run("rule check_foo { foo.bar == true }", "foo:\n  bar: false\n");
        assert_eq!(report.status, Status::Fail);
        let clause = &report.rules[0].clauses[0];
        assert_eq!(clause.status, Status::Fail);
        let message = clause.message.as_deref().unwrap();
        assert!(message.contains("foo.bar"), "message: {}", message);
        assert!(message.contains("true"), "message: {}", message);
    }

    #[test]
    fn test_unresolved_path_skips() {
        let report = run("rule r { foo.baz == 1 }", "foo:\n  bar: true\n");
        assert_eq!(report.rules[0].status, Status::Skip);
        assert_eq!(report.status, Status::Pass);
    }

    #[test]
    fn test_unresolved_path_fails_under_exists() {
        let report = run("rule r { foo.baz exists }", "foo:\n  bar: true\n");
        assert_eq!(report.rules[0].status, Status::Fail);

        let report = run("rule r { not foo.baz exists }", "foo:\n  bar: true\n");
        assert_eq!(report.rules[0].status, Status::Pass);
    }

    #[test]
    fn test_wildcard_all_must_pass_cites_offender() {
        let report = run(
            "rule r { items[*].ok == true }",
            "items:\n  - ok: true\n  - ok: false\n",
        );
        assert_eq!(report.status, Status::Fail);
        let message = report.rules[0].clauses[0].message.as_deref().unwrap();
        assert!(message.contains("items[1].ok"), "message: {}", message);
    }

    #[test]
    fn test_any_quantifier_needs_one_match() {
        let doc = "items:\n  - ok: true\n  - ok: false\n";
        let report = run("rule r { any items[*].ok == true }", doc);
        assert_eq!(report.status, Status::Pass);

        let report = run("rule r { any items[*].ok == 7 }", doc);
        assert_eq!(report.status, Status::Fail);
    }

    #[test]
    fn test_and_or_not_aggregation() {
        let doc = "a: 1\nb: 2\n";
        let report = run("rule r { a == 1 and b == 3 }", doc);
        assert_eq!(report.status, Status::Fail);

        let report = run("rule r { a == 1 or b == 3 }", doc);
        assert_eq!(report.status, Status::Pass);

        let report = run("rule r { not (a == 1 and b == 2) }", doc);
        assert_eq!(report.status, Status::Fail);
    }

    #[test]
    fn test_skip_propagates_through_not() {
        let report = run("rule r { not missing.key == 1 }", "a: 1\n");
        assert_eq!(report.rules[0].status, Status::Skip);
    }

    #[test]
    fn test_or_with_skip_and_fail_fails() {
        let report = run("rule r { missing == 1 or a == 2 }", "a: 1\n");
        assert_eq!(report.rules[0].status, Status::Fail);
    }

    #[test]
    fn test_when_guard_skips_rule() {
        let rules = "rule prod_tls when env == 'prod' { tls == true }";
        let report = run(rules, "env: dev\ntls: false\n");
        assert_eq!(report.rules[0].status, Status::Skip);
        assert_eq!(report.status, Status::Pass);

        let report = run(rules, "env: prod\ntls: false\n");
        assert_eq!(report.rules[0].status, Status::Fail);
    }

    #[test]
    fn test_rule_reference_uses_referenced_status() {
        let rules = "rule a { b }\nrule b { x == 1 }";
        let report = run(rules, "x: 1\n");
        assert_eq!(report.rules[0].status, Status::Pass);
        assert_eq!(report.rules[1].status, Status::Pass);

        let report = run(rules, "x: 2\n");
        assert_eq!(report.rules[0].status, Status::Fail);
    }

    #[test]
    fn test_undefined_reference_fails_with_diagnostic() {
        let report = run("rule a { ghost }", "x: 1\n");
        assert_eq!(report.rules[0].status, Status::Fail);
        let message = report.rules[0].clauses[0].message.as_deref().unwrap();
        assert!(message.contains("ghost"));
        assert!(message.contains("not defined"));
    }

    #[test]
    fn test_circular_reference_aborts_with_structured_error() {
        let rules = parse_rules("rule a { b }\nrule b { a }").unwrap();
        let document = parse("x: 1\n", Format::Yaml).unwrap();
        let err = evaluate(&rules, &document, &EvalOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Reference(ReferenceError::Circular { .. })
        ));
    }

    #[test]
    fn test_type_mismatch_degrades_to_fail_and_run_continues() {
        let report = run(
            "rule bad { name > 3 }\nrule good { name == 'web' }",
            "name: web\n",
        );
        assert_eq!(report.rules[0].status, Status::Fail);
        assert!(
            report.rules[0].clauses[0]
                .message
                .as_deref()
                .unwrap()
                .contains("string")
        );
        assert_eq!(report.rules[1].status, Status::Pass);
        assert_eq!(report.status, Status::Fail);
    }

    #[test]
    fn test_custom_message_is_included() {
        let report = run(
            "rule r { tls == true << 'tls is mandatory' }",
            "tls: false\n",
        );
        let message = report.rules[0].clauses[0].message.as_deref().unwrap();
        assert!(message.contains("tls is mandatory"));
    }

    #[test]
    fn test_strict_mode_fails_on_skip() {
        let rules = "rule r { missing.key == 1 }";
        let report = run(rules, "a: 1\n");
        assert_eq!(report.status, Status::Pass);

        let strict = run_with(
            rules,
            "a: 1\n",
            EvalOptions {
                strict: true,
                verbose: false,
            },
        );
        assert_eq!(strict.status, Status::Fail);
    }

    #[test]
    fn test_verbose_includes_candidates() {
        let doc = "items:\n  - ok: true\n  - ok: false\n";
        let rules = "rule r { items[*].ok == true }";
        let report = run(rules, doc);
        assert!(report.rules[0].clauses[0].candidates.is_empty());

        let verbose = run_with(
            rules,
            doc,
            EvalOptions {
                strict: false,
                verbose: true,
            },
        );
        let candidates = &verbose.rules[0].clauses[0].candidates;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].status, Status::Pass);
        assert_eq!(candidates[1].status, Status::Fail);
        assert_eq!(candidates[1].path, "items[1].ok");
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let rules = parse_rules(
            "rule a { items[*].n >= 1 }\nrule b { a or fallback exists }",
        )
        .unwrap();
        let document = parse("items:\n  - n: 1\n  - n: 0\n", Format::Yaml).unwrap();
        let first = evaluate(&rules, &document, &EvalOptions::default()).unwrap();
        let second = evaluate(&rules, &document, &EvalOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_outcomes_keep_declaration_order() {
        let report = run(
            "rule zz { a == 1 }\nrule aa { a == 1 }\nrule mm { a == 1 }",
            "a: 1\n",
        );
        let names: Vec<_> = report.rules.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["zz", "aa", "mm"]);
    }
}
