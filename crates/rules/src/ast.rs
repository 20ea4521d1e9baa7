//! Defines the Abstract Syntax Tree for the rule language.

use std::fmt;
use verdict_model::Scalar;
use verdict_path::Path;

/// Source position of a clause or rule, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Binary comparison operators between a resolved path and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Matches,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::In => "in",
            CmpOp::Matches => "matches",
        };
        f.write_str(text)
    }
}

/// Unary checks applied directly to a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Exists,
    Empty,
    IsString,
    IsList,
    IsMap,
    IsNumber,
    IsBool,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnaryOp::Exists => "exists",
            UnaryOp::Empty => "empty",
            UnaryOp::IsString => "is_string",
            UnaryOp::IsList => "is_list",
            UnaryOp::IsMap => "is_map",
            UnaryOp::IsNumber => "is_number",
            UnaryOp::IsBool => "is_bool",
        };
        f.write_str(text)
    }
}

/// A literal value on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Scalar(Scalar),
    Regex(String),
    List(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Scalar(s) => write!(f, "{}", s),
            Literal::Regex(r) => write!(f, "/{}/", r),
            Literal::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Binary { op: CmpOp, value: Literal },
    Unary(UnaryOp),
}

/// A single comparison clause: a path, a predicate, and how multiple
/// matched candidates combine (`any` flips all-must-pass to any-may-pass).
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub path: Path,
    pub predicate: Predicate,
    pub any: bool,
    pub message: Option<String>,
    pub location: Location,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.any {
            f.write_str("any ")?;
        }
        match &self.predicate {
            Predicate::Binary { op, value } => write!(f, "{} {} {}", self.path, op, value),
            Predicate::Unary(op) => write!(f, "{} {}", self.path, op),
        }
    }
}

/// A clause tree node. AND binds tighter than OR; NOT binds tightest;
/// ties break left-to-right.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Comparison(Comparison),
    /// A reference to another named rule; resolved by name at evaluation,
    /// so forward references parse fine.
    RuleRef { name: String, location: Location },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

/// A named rule block with an optional `when` guard.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub when: Option<Expr>,
    pub body: Expr,
    pub location: Location,
}

/// An ordered set of parsed rules. Order is declaration order and drives
/// report ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }
}
