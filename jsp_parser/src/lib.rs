// Instance files are whitespace separated numbers with `#` line comments,
// so a token level chumsky grammar is enough.

use std::{fmt::Display, str::FromStr};

use chumsky::{prelude::*, Parser};
use structs::{Instance, InstanceError};
use thiserror::Error;

pub mod structs;

#[derive(Debug, Error)]
pub enum JspParseError {
    #[error("ParseError occurred: {0:?}")]
    ParseError(Vec<Simple<char>>),
    #[error("Expected {expected} numbers after the header, found {found}")]
    TaskCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// Parses an instance in the classic job-shop format:
///
/// ```text
/// # comment
/// <jobs> <machines>
/// <machine> <duration> <machine> <duration> ...   (one line per job)
/// ```
pub fn parse_instance(content: &str) -> Result<Instance, JspParseError> {
    let ((jobs, machines), values) = crate::instance_parser()
        .parse(content)
        .map_err(JspParseError::ParseError)?;

    let expected = jobs
        .checked_mul(machines)
        .and_then(|tasks| tasks.checked_mul(2))
        .unwrap_or(usize::MAX);
    if values.len() != expected {
        return Err(JspParseError::TaskCountMismatch {
            expected,
            found: values.len(),
        });
    }

    let tasks: Vec<(usize, u32)> = values
        .chunks_exact(2)
        .map(|pair| (pair[0] as usize, pair[1]))
        .collect();

    let jobs = (0..jobs)
        .map(|job| tasks[job * machines..(job + 1) * machines].to_vec())
        .collect();

    Ok(Instance::new(machines, jobs)?)
}

pub(crate) fn filler_parser() -> impl Parser<char, (), Error = Simple<char>> {
    let comment = just('#')
        .then(filter(|c: &char| *c != '\n').repeated())
        .ignored()
        .labelled("comment");

    let whitespace = filter(|c: &char| c.is_whitespace()).ignored();

    comment.or(whitespace).repeated().ignored()
}

pub(crate) fn number_parser<T>() -> impl Parser<char, T, Error = Simple<char>>
where
    T: FromStr,
    T::Err: Display,
{
    filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|digits: String, span| {
            digits
                .parse::<T>()
                .map_err(|err| Simple::custom(span, format!("{digits}: {err}")))
        })
        .then_ignore(crate::filler_parser())
        .labelled("number")
}

pub(crate) fn instance_parser(
) -> impl Parser<char, ((usize, usize), Vec<u32>), Error = Simple<char>> {
    crate::filler_parser()
        .ignore_then(crate::number_parser::<usize>())
        .then(crate::number_parser::<usize>())
        .then(crate::number_parser::<u32>().repeated())
        .then_ignore(end())
}
