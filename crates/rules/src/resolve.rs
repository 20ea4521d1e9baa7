//! Two-phase name binding for rule references.
//!
//! Parsing leaves rule references symbolic so forward references work.
//! Before evaluation this pass walks every reference with a visited set:
//! a cycle is a structural error; an unknown name is left for evaluation
//! to report as a clause failure.

use crate::ast::{Expr, Rule, RuleSet};
use crate::error::ReferenceError;
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

impl RuleSet {
    /// Checks every rule-reference chain for cycles. Returns the first
    /// cycle found, as the chain of names that closes it.
    pub fn resolve(&self) -> Result<(), ReferenceError> {
        let mut states: HashMap<&str, Visit> = HashMap::new();
        for rule in &self.rules {
            if states.get(rule.name.as_str()) != Some(&Visit::Done) {
                let mut chain = Vec::new();
                self.visit(rule, &mut states, &mut chain)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        rule: &'a Rule,
        states: &mut HashMap<&'a str, Visit>,
        chain: &mut Vec<String>,
    ) -> Result<(), ReferenceError> {
        states.insert(&rule.name, Visit::InProgress);
        chain.push(rule.name.clone());

        let mut refs = Vec::new();
        if let Some(when) = &rule.when {
            collect_refs(when, &mut refs);
        }
        collect_refs(&rule.body, &mut refs);

        for name in refs {
            match states.get(name) {
                Some(Visit::Done) => {}
                Some(Visit::InProgress) => {
                    let mut cycle = chain.clone();
                    cycle.push(name.to_string());
                    return Err(ReferenceError::Circular { chain: cycle });
                }
                None => {
                    // Unknown references are not resolvable here; the
                    // evaluator reports them against the referring clause.
                    if let Some(target) = self.rule(name) {
                        self.visit(target, states, chain)?;
                    }
                }
            }
        }

        states.insert(&rule.name, Visit::Done);
        chain.pop();
        Ok(())
    }
}

/// Appends every rule name referenced by `expr`, left to right.
pub fn collect_refs<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Comparison(_) => {}
        Expr::RuleRef { name, .. } => out.push(name),
        Expr::Not(inner) => collect_refs(inner, out),
        Expr::And(children) | Expr::Or(children) => {
            for child in children {
                collect_refs(child, out);
            }
        }
    }
}
