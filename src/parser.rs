//! This module provides the parser for the textual rule notation, utilizing the `pest` crate.
//!
//! A rule is written as `read,old_state->write,new_state,move`, for example `_,3->1,Accept,L`.
//! The move is one of `L`, `R`, `N` (or `-`) in any case, and may be omitted to keep the head
//! in place. Rule lists hold one rule per line or `;`-separated rules, with `#` comments.

use crate::types::{Move, ParseError, Rule, BLANK_SYMBOL};
use pest::{iterators::Pair, Parser as PestParser};
use std::str::FromStr;

mod grammar {
    use pest_derive::Parser as PestParser;

    /// Derives a `PestParser` for the rule notation defined in `grammar.pest`.
    #[derive(PestParser)]
    #[grammar = "grammar.pest"]
    pub struct RuleNotationParser;
}

use grammar::RuleNotationParser;
/// The grammar's token kinds, as produced by `pest`.
pub use grammar::Rule as Token;

/// Parses a list of rules, preserving their order.
///
/// Blank lines and `#` comments are ignored. An input with no rules yields an
/// empty list; whether that list is runnable is for the validator to decide.
///
/// # Errors
///
/// Returns a `ParseError` pointing at the first malformed position.
pub fn parse_rules(input: &str) -> Result<Vec<Rule>, ParseError> {
    let pairs = RuleNotationParser::parse(Token::rule_list, input)
        .map_err(|e| ParseError::from(Box::new(e)))?;

    Ok(pairs
        .flat_map(Pair::into_inner)
        .filter(|pair| pair.as_rule() == Token::rule)
        .map(|pair| parse_rule(pair.into_inner()))
        .collect())
}

impl FromStr for Rule {
    type Err = ParseError;

    /// Parses exactly one rule; surrounding whitespace and a trailing comment are allowed.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let pairs = RuleNotationParser::parse(Token::single_rule, input)
            .map_err(|e| ParseError::from(Box::new(e)))?;

        Ok(parse_rule(pairs.flatten()))
    }
}

/// Builds a `Rule` from the pairs below a `Token::rule`.
///
/// Rule: rule > [symbol, state, symbol, state, movement?]
fn parse_rule<'i>(pairs: impl Iterator<Item = Pair<'i, Token>>) -> Rule {
    let mut fields = pairs.filter(|pair| {
        matches!(
            pair.as_rule(),
            Token::symbol | Token::state | Token::movement
        )
    });

    let read = parse_symbol(&mut fields);
    let old_state = parse_string(&mut fields);
    let write = parse_symbol(&mut fields);
    let new_state = parse_string(&mut fields);
    let movement = fields
        .next()
        .map(|p| parse_movement(p.as_str()))
        .unwrap_or(Move::Stay);

    Rule::new(read, &old_state, write, &new_state, movement)
}

fn parse_symbol<'i>(pairs: &mut impl Iterator<Item = Pair<'i, Token>>) -> char {
    pairs
        .next()
        .and_then(|p| p.as_str().chars().next())
        .unwrap_or(BLANK_SYMBOL)
}

fn parse_string<'i>(pairs: &mut impl Iterator<Item = Pair<'i, Token>>) -> String {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

/// The grammar only admits `l`, `r`, `n` and `-`, so anything but left/right stays.
fn parse_movement(input: &str) -> Move {
    match input {
        "L" | "l" => Move::Left,
        "R" | "r" => Move::Right,
        _ => Move::Stay,
    }
}
