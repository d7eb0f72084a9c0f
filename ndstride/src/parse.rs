/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! A compact textual syntax for lists of [`Selector`]s, one per
//! active axis.
//! ```text
//! selectors        ::= selector ( "," selector )*
//! selector         ::= list
//!                    | range
//!                    | index
//!                    | wildcard
//! list             ::= "[" ( number ( "," number )* )? "]"
//! range            ::= signed? ":" signed? ( ":" signed )?
//! index            ::= number
//! wildcard         ::= "*"
//! number           ::= [0-9]+
//! signed           ::= "-"? number
//! ```
//!
//! Notes:
//! - A range like `1:7:2` has the form `start:end:step`. A missing
//!   start or end is resolved against the axis it is applied to, in
//!   the direction of the step, so `::-1` reverses an axis.
//! - An index like `3` closes the axis at position 3.
//! - A list like `[2,0,2]` gathers positions in order; repeats are
//!   allowed.
//! - Whitespace is stripped before parsing.
//! - The empty string is the empty list of selectors.

use nom::IResult;
use nom::Parser as _;
use nom::branch::alt;
use nom::character::complete::char;
use nom::character::complete::digit1;
use nom::combinator::all_consuming;
use nom::combinator::map;
use nom::combinator::map_res;
use nom::combinator::opt;
use nom::combinator::recognize;
use nom::multi::separated_list0;
use nom::multi::separated_list1;
use nom::sequence::delimited;
use nom::sequence::preceded;

use crate::shape::Range;
use crate::shape::Selector;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("failed to parse selectors {input:?}: {reason}")]
    Syntax { input: String, reason: String },

    #[error("range {selector} has a zero step")]
    ZeroStep { selector: String },
}

fn number(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse).parse(input)
}

fn signed(input: &str) -> IResult<&str, isize> {
    map_res(recognize((opt(char('-')), digit1)), str::parse).parse(input)
}

fn list(input: &str) -> IResult<&str, Selector> {
    map(
        delimited(char('['), separated_list0(char(','), number), char(']')),
        Selector::List,
    )
    .parse(input)
}

fn range(input: &str) -> IResult<&str, Selector> {
    let (input, (start, end, step)) = (
        opt(signed),
        preceded(char(':'), opt(signed)),
        opt(preceded(char(':'), signed)),
    )
        .parse(input)?;

    Ok((
        input,
        Selector::Range(Range(start, end, step.unwrap_or(1))),
    ))
}

fn index(input: &str) -> IResult<&str, Selector> {
    map(number, Selector::Index).parse(input)
}

fn wildcard(input: &str) -> IResult<&str, Selector> {
    map(char('*'), |_| Selector::All).parse(input)
}

fn selector(input: &str) -> IResult<&str, Selector> {
    alt((list, range, index, wildcard)).parse(input)
}

fn selectors(input: &str) -> IResult<&str, Vec<Selector>> {
    separated_list1(char(','), selector).parse(input)
}

impl Selector {
    /// Parse a comma-separated list of selectors, ignoring all
    /// whitespace.
    ///
    /// ```
    /// # use ndstride::Selector;
    /// let selectors = Selector::parse_list("1, 1:3, *, [0,2], ::-1").unwrap();
    /// assert_eq!(selectors.len(), 5);
    /// assert_eq!(selectors[2], Selector::All);
    /// ```
    pub fn parse_list(input: &str) -> Result<Vec<Selector>, ParseError> {
        let input: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let (_, selectors) =
            all_consuming(selectors)
                .parse(&input)
                .map_err(|err| ParseError::Syntax {
                    input: input.clone(),
                    reason: err.to_string(),
                })?;
        if let Some(zero) = selectors
            .iter()
            .find(|s| matches!(s, Selector::Range(Range(_, _, 0))))
        {
            return Err(ParseError::ZeroStep {
                selector: zero.to_string(),
            });
        }
        Ok(selectors)
    }
}
