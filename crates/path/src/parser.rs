//! A `nom`-based parser for path expressions.

use super::ast::{Path, Segment};
use crate::error::PathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, i64 as nom_i64},
    combinator::{map, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded},
};

// --- Main Public Parser ---

pub fn parse_path(input: &str) -> Result<Path, PathError> {
    match path(input.trim()) {
        Ok(("", parsed)) => Ok(parsed),
        Ok((rem, _)) => Err(PathError::PathParse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(PathError::PathParse(input.to_string(), e.to_string())),
    }
}

/// The embeddable path parser. Public so the rule-language parser can
/// compose it inside clause parsing.
pub fn path(input: &str) -> IResult<&str, Path> {
    let (input, mut segments) = first_step(input)?;
    let (input, rest) = many0(following).parse(input)?;
    for mut chunk in rest {
        segments.append(&mut chunk);
    }
    Ok((input, Path { segments }))
}

// --- Step Parsers ---

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
    ))
    .parse(input)
}

fn quoted_key(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
    ))
    .parse(input)
}

/// A named or wildcard step (`foo`, `'foo bar'`, `*`).
fn step(input: &str) -> IResult<&str, Segment> {
    alt((
        map(char('*'), |_| Segment::AnyValue),
        map(identifier, |s| Segment::Key(s.to_string())),
        map(quoted_key, |s| Segment::Key(s.to_string())),
    ))
    .parse(input)
}

fn bracket(input: &str) -> IResult<&str, Segment> {
    delimited(
        char('['),
        alt((
            map(char('*'), |_| Segment::AnyIndex),
            map(nom_i64, Segment::Index),
        )),
        char(']'),
    )
    .parse(input)
}

fn first_step(input: &str) -> IResult<&str, Vec<Segment>> {
    alt((
        // A path may open with recursive descent (`..name`).
        map(preceded(tag(".."), step), |s| vec![Segment::Descendant, s]),
        map(step, |s| vec![s]),
    ))
    .parse(input)
}

/// Everything after the first step must be introduced by `.`, `..`, or `[`.
fn following(input: &str) -> IResult<&str, Vec<Segment>> {
    alt((
        map(preceded(tag(".."), step), |s| vec![Segment::Descendant, s]),
        map(preceded(char('.'), step), |s| vec![s]),
        map(bracket, |s| vec![s]),
    ))
    .parse(input)
}
