//! A `nom`-based parser for the rule language.
//!
//! ```text
//! rule no_plain_http when env == 'prod' {
//!     # every listener must be https
//!     listeners[*].scheme == 'https' << "plain http is not allowed"
//!         or exempt_service
//! }
//! ```
//!
//! AND binds tighter than OR, NOT binds tightest, and parentheses group.
//! Two clauses in sequence with no operator between them are an implicit
//! AND. A bare identifier is a reference to another rule; references may
//! point forward, so unknown names surface at evaluation, not here.

use super::ast::{CmpOp, Comparison, Expr, Literal, Location, Predicate, Rule, RuleSet, UnaryOp};
use crate::error::RuleParseError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace1, one_of, satisfy},
    combinator::{cut, map, not, opt, recognize, verify},
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use verdict_model::Scalar;

/// Words with grammar meaning; not usable as rule names, bare references,
/// or the first step of a clause path.
const RESERVED: &[&str] = &[
    "rule", "when", "and", "or", "not", "any", "in", "matches", "exists", "empty", "is_string",
    "is_list", "is_map", "is_number", "is_bool", "true", "false", "null",
];

// --- Main Public Parser ---

pub fn parse_rules(content: &str) -> Result<RuleSet, RuleParseError> {
    let mut rules = Vec::new();
    let mut input = content;
    loop {
        let rest = match sp::<nom::error::Error<&str>>(input) {
            Ok((rest, _)) => rest,
            Err(_) => input,
        };
        if rest.is_empty() {
            break;
        }
        match rule_block(content)(rest) {
            Ok((next, rule)) => {
                rules.push(rule);
                input = next;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(err_at(content, e.input));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(err_at(content, ""));
            }
        }
    }
    Ok(RuleSet { rules })
}

fn err_at(src: &str, rest: &str) -> RuleParseError {
    let location = location_of(src, rest);
    let snippet: String = rest
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(24)
        .collect();
    let message = if snippet.trim().is_empty() {
        "unexpected end of input".to_string()
    } else {
        format!("invalid rule syntax near '{}'", snippet.trim())
    };
    RuleParseError {
        line: location.line,
        column: location.column,
        message,
    }
}

/// Position of `rest` (a suffix of `src`) within `src`, 1-based.
fn location_of(src: &str, rest: &str) -> Location {
    let offset = src.len() - rest.len();
    let consumed = &src[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = match consumed.rfind('\n') {
        Some(pos) => offset - pos,
        None => offset + 1,
    };
    Location { line, column }
}

// --- Combinators & Helpers ---

/// Zero or more whitespace characters and `#` line comments.
fn sp<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(many0(alt((
        multispace1,
        recognize(pair(char('#'), take_while(|c| c != '\n'))),
    ))))
    .parse(input)
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(sp, inner, sp)
}

/// A keyword: the exact text not running into a longer identifier.
fn word<'a, E: ParseError<&'a str>>(
    w: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = E> {
    terminated(
        tag(w),
        not(satisfy(|c: char| c.is_alphanumeric() || c == '_' || c == '-')),
    )
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

fn unreserved_name(input: &str) -> IResult<&str, &str> {
    verify(identifier, |s: &&str| !RESERVED.contains(s)).parse(input)
}

// --- Literal Parsers ---

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn regex_literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('/'), take_while1(|c| c != '/'), char('/')),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

/// Numbers keep their int/float distinction; `5` and `5.0` compare
/// numerically equal later, but diagnostics print what was written.
fn number(input: &str) -> IResult<&str, Scalar> {
    let (rest, text) = recognize((
        opt(char('-')),
        digit1,
        opt(preceded(char('.'), digit1)),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)?;
    let scalar = if text.contains(['.', 'e', 'E']) {
        Scalar::Float(text.parse().unwrap_or(f64::NAN))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Scalar::Int(i),
            Err(_) => Scalar::Float(text.parse().unwrap_or(f64::NAN)),
        }
    };
    Ok((rest, scalar))
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        map(word("null"), |_| Literal::Scalar(Scalar::Null)),
        map(word("true"), |_| Literal::Scalar(Scalar::Bool(true))),
        map(word("false"), |_| Literal::Scalar(Scalar::Bool(false))),
        map(number, Literal::Scalar),
        map(string_literal, |s| Literal::Scalar(Scalar::String(s))),
        map(regex_literal, Literal::Regex),
        list_literal,
    ))
    .parse(input)
}

fn list_literal(input: &str) -> IResult<&str, Literal> {
    map(
        delimited(
            ws(char('[')),
            nom::multi::separated_list0(ws(char(',')), literal),
            ws(char(']')),
        ),
        Literal::List,
    )
    .parse(input)
}

// --- Operator Parsers ---

fn binary_op(input: &str) -> IResult<&str, CmpOp> {
    alt((
        map(tag("=="), |_| CmpOp::Eq),
        map(tag("!="), |_| CmpOp::Ne),
        map(tag(">="), |_| CmpOp::Ge),
        map(tag("<="), |_| CmpOp::Le),
        map(tag(">"), |_| CmpOp::Gt),
        map(tag("<"), |_| CmpOp::Lt),
        map(word("in"), |_| CmpOp::In),
        map(word("matches"), |_| CmpOp::Matches),
    ))
    .parse(input)
}

fn unary_op(input: &str) -> IResult<&str, UnaryOp> {
    alt((
        map(word("exists"), |_| UnaryOp::Exists),
        map(word("empty"), |_| UnaryOp::Empty),
        map(word("is_string"), |_| UnaryOp::IsString),
        map(word("is_list"), |_| UnaryOp::IsList),
        map(word("is_map"), |_| UnaryOp::IsMap),
        map(word("is_number"), |_| UnaryOp::IsNumber),
        map(word("is_bool"), |_| UnaryOp::IsBool),
    ))
    .parse(input)
}

fn or_op(input: &str) -> IResult<&str, &str> {
    ws(alt((word("or"), word("OR"), tag("||")))).parse(input)
}

fn and_op(input: &str) -> IResult<&str, &str> {
    ws(alt((word("and"), word("AND"), tag("&&")))).parse(input)
}

fn not_op(input: &str) -> IResult<&str, &str> {
    ws(alt((word("not"), word("NOT"), tag("!")))).parse(input)
}

// --- Expression Parsers (in order of precedence) ---

fn disjunction<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        let (i, first) = conjunction(src)(input)?;
        let (i, rest) = many0(preceded(or_op, conjunction(src))).parse(i)?;
        if rest.is_empty() {
            Ok((i, first))
        } else {
            let mut children = vec![first];
            children.extend(rest);
            Ok((i, Expr::Or(children)))
        }
    }
}

fn conjunction<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        let (i, first) = negation(src)(input)?;
        // The separator is optional: clauses stacked one per line are an
        // implicit conjunction.
        let (i, rest) = many0(preceded(opt(and_op), negation(src))).parse(i)?;
        if rest.is_empty() {
            Ok((i, first))
        } else {
            let mut children = vec![first];
            children.extend(rest);
            Ok((i, Expr::And(children)))
        }
    }
}

fn negation<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        let (i, neg) = opt(not_op).parse(input)?;
        let (i, expr) = atom(src)(i)?;
        if neg.is_some() {
            Ok((i, Expr::Not(Box::new(expr))))
        } else {
            Ok((i, expr))
        }
    }
}

fn atom<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        alt((
            delimited(ws(char('(')), disjunction(src), ws(char(')'))),
            comparison(src),
            rule_ref(src),
        ))
        .parse(input)
    }
}

/// `[any] path (binary-op literal | unary-op) [<< "message"]`
fn comparison<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        let (i, _) = sp(input)?;
        let location = location_of(src, i);
        let (i, any) = opt(terminated(word("any"), sp)).parse(i)?;
        let (i, path) = verdict_path::path(i)?;
        let (i, predicate) = alt((
            map(pair(ws(binary_op), literal), |(op, value)| {
                Predicate::Binary { op, value }
            }),
            map(ws(unary_op), Predicate::Unary),
        ))
        .parse(i)?;
        let (i, message) = opt(preceded(ws(tag("<<")), string_literal)).parse(i)?;
        Ok((
            i,
            Expr::Comparison(Comparison {
                path,
                predicate,
                any: any.is_some(),
                message,
                location,
            }),
        ))
    }
}

fn rule_ref<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Expr> + 'a {
    move |input| {
        let (i, _) = sp(input)?;
        let location = location_of(src, i);
        let (i, name) = unreserved_name(i)?;
        Ok((
            i,
            Expr::RuleRef {
                name: name.to_string(),
                location,
            },
        ))
    }
}

// --- Rule Block Parser ---

fn rule_block<'a>(src: &'a str) -> impl FnMut(&'a str) -> IResult<&'a str, Rule> + 'a {
    move |input| {
        let (i, _) = sp(input)?;
        let location = location_of(src, i);
        let (i, _) = word("rule").parse(i)?;
        // Once `rule` is seen the block must be well-formed; cut so the
        // error points here instead of backtracking to the file level.
        let (i, name) = cut(ws(unreserved_name)).parse(i)?;
        let (i, when) = opt(preceded(word("when"), disjunction(src))).parse(i)?;
        let (i, _) = cut(ws(char('{'))).parse(i)?;
        let (i, body) = cut(disjunction(src)).parse(i)?;
        let (i, _) = cut(ws(char('}'))).parse(i)?;
        Ok((
            i,
            Rule {
                name: name.to_string(),
                when,
                body,
                location,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_path::Segment;

    fn single_rule(text: &str) -> Rule {
        let mut set = parse_rules(text).unwrap();
        assert_eq!(set.rules.len(), 1);
        set.rules.remove(0)
    }

    #[test]
    fn test_parse_simple_rule() {
        let rule = single_rule("rule check_foo { foo.bar == true }");
        assert_eq!(rule.name, "check_foo");
        assert!(rule.when.is_none());
        let Expr::Comparison(clause) = &rule.body else {
            panic!("expected a comparison");
        };
        assert_eq!(
            clause.path.segments,
            vec![Segment::Key("foo".into()), Segment::Key("bar".into())]
        );
        assert_eq!(
            clause.predicate,
            Predicate::Binary {
                op: CmpOp::Eq,
                value: Literal::Scalar(Scalar::Bool(true)),
            }
        );
        assert!(!clause.any);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let rule = single_rule("rule r { a == 1 or b == 2 and c == 3 }");
        let Expr::Or(children) = &rule.body else {
            panic!("expected OR at the top");
        };
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Expr::Comparison(_)));
        let Expr::And(right) = &children[1] else {
            panic!("expected AND on the right");
        };
        assert_eq!(right.len(), 2);
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let rule = single_rule("rule r { (a == 1 or b == 2) and c == 3 }");
        let Expr::And(children) = &rule.body else {
            panic!("expected AND at the top");
        };
        assert!(matches!(children[0], Expr::Or(_)));
    }

    #[test]
    fn test_implicit_conjunction_between_lines() {
        let rule = single_rule("rule r {\n  a == 1\n  b == 2\n}");
        let Expr::And(children) = &rule.body else {
            panic!("expected implicit AND");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_negation_forms() {
        for text in [
            "rule r { not a.b == 1 }",
            "rule r { NOT a.b == 1 }",
            "rule r { ! a.b == 1 }",
        ] {
            let rule = single_rule(text);
            assert!(matches!(rule.body, Expr::Not(_)), "failed on {}", text);
        }
    }

    #[test]
    fn test_rule_reference_and_forward_reference() {
        let set = parse_rules(
            "rule a { uses_b }\nrule uses_b { x exists }",
        )
        .unwrap();
        let Expr::RuleRef { name, .. } = &set.rules[0].body else {
            panic!("expected a rule reference");
        };
        assert_eq!(name, "uses_b");
    }

    #[test]
    fn test_when_guard() {
        let rule = single_rule("rule prod_only when env == 'prod' { tls == true }");
        let Some(Expr::Comparison(guard)) = &rule.when else {
            panic!("expected a when guard");
        };
        assert_eq!(guard.path.to_string(), "env");
    }

    #[test]
    fn test_any_quantifier() {
        let rule = single_rule("rule r { any items[*].ok == true }");
        let Expr::Comparison(clause) = &rule.body else {
            panic!("expected a comparison");
        };
        assert!(clause.any);
    }

    #[test]
    fn test_unary_operators() {
        let rule = single_rule("rule r { a exists\n b empty\n c is_list }");
        let Expr::And(children) = &rule.body else {
            panic!("expected AND");
        };
        let ops: Vec<_> = children
            .iter()
            .map(|c| match c {
                Expr::Comparison(Comparison {
                    predicate: Predicate::Unary(op),
                    ..
                }) => *op,
                other => panic!("unexpected clause {:?}", other),
            })
            .collect();
        assert_eq!(ops, vec![UnaryOp::Exists, UnaryOp::Empty, UnaryOp::IsList]);
    }

    #[test]
    fn test_in_list_and_matches_regex() {
        let rule = single_rule("rule r { env in ['dev', 'prod']\n name matches /^[a-z]+$/ }");
        let Expr::And(children) = &rule.body else {
            panic!("expected AND");
        };
        let Expr::Comparison(first) = &children[0] else {
            panic!();
        };
        assert_eq!(
            first.predicate,
            Predicate::Binary {
                op: CmpOp::In,
                value: Literal::List(vec![
                    Literal::Scalar(Scalar::String("dev".into())),
                    Literal::Scalar(Scalar::String("prod".into())),
                ]),
            }
        );
        let Expr::Comparison(second) = &children[1] else {
            panic!();
        };
        assert_eq!(
            second.predicate,
            Predicate::Binary {
                op: CmpOp::Matches,
                value: Literal::Regex("^[a-z]+$".into()),
            }
        );
    }

    #[test]
    fn test_custom_message() {
        let rule = single_rule("rule r { tls == true << \"tls is required\" }");
        let Expr::Comparison(clause) = &rule.body else {
            panic!();
        };
        assert_eq!(clause.message.as_deref(), Some("tls is required"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let set = parse_rules(
            "# file header\nrule r { # inline\n  a == 1\n}\n# trailing\n",
        )
        .unwrap();
        assert_eq!(set.rules.len(), 1);
    }

    #[test]
    fn test_numbers_keep_int_float_distinction() {
        let rule = single_rule("rule r { a == 5\n b == 5.5\n c == -2 }");
        let Expr::And(children) = &rule.body else {
            panic!();
        };
        let values: Vec<_> = children
            .iter()
            .map(|c| match c {
                Expr::Comparison(Comparison {
                    predicate: Predicate::Binary { value, .. },
                    ..
                }) => value.clone(),
                _ => panic!(),
            })
            .collect();
        assert_eq!(
            values,
            vec![
                Literal::Scalar(Scalar::Int(5)),
                Literal::Scalar(Scalar::Float(5.5)),
                Literal::Scalar(Scalar::Int(-2)),
            ]
        );
    }

    #[test]
    fn test_clause_location_is_recorded() {
        let rule = single_rule("rule r {\n  foo.bar == true\n}");
        let Expr::Comparison(clause) = &rule.body else {
            panic!();
        };
        assert_eq!(clause.location.line, 2);
        assert_eq!(clause.location.column, 3);
    }

    #[test]
    fn test_parse_error_has_position() {
        let err = parse_rules("rule r { foo.bar == }").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 1);
        assert!(err.message.contains("invalid rule syntax"));

        let err = parse_rules("not_a_rule_block").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_quoted_path_step() {
        let rule = single_rule("rule r { metadata.'app.kubernetes.io/name' exists }");
        let Expr::Comparison(clause) = &rule.body else {
            panic!();
        };
        assert_eq!(
            clause.path.segments[1],
            Segment::Key("app.kubernetes.io/name".into())
        );
    }
}
