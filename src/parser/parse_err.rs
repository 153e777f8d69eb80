//! Parser error types and related utilities
//!

use std::fmt;
use strum_macros::Display;
use thiserror::Error;

/// The "kind" of error generated during CDDL parsing.
#[non_exhaustive]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input ended while a rule was still open.
    #[strum(serialize = "Unexpected end of file")]
    UnexpectedEof,
    /// A rule name was not followed by `=`.
    #[strum(serialize = "Expected =")]
    ExpectedAssign,
    /// Something other than a rule name appeared between rules.
    #[strum(serialize = "Expected a rule id")]
    ExpectedId,
    /// An identifier ended with `-` or `.`.
    #[strum(serialize = "Invalid rule id")]
    InvalidId,
    /// A type was expected, but no literal, name, or opening bracket was found.
    #[strum(serialize = "Expected [ or { or (")]
    ExpectedGroupent,
    /// Bad separator inside an array body.
    #[strum(serialize = "Expected , or ( or ]")]
    ExpectedCommaOrLeftParOrRightSqbracket,
    /// Bad separator inside a map body.
    #[strum(serialize = "Expected , or ( or }")]
    ExpectedCommaOrLeftParOrRightCurbracket,
    /// Bad separator inside a group body.
    #[strum(serialize = "Expected , or )")]
    ExpectedCommaOrRightPar,
    /// Bad token after a type.
    #[strum(serialize = "Expected .. or / or , or right bracket")]
    ExpectedRangeopOrSlashOrCommaOrRightBracket,
    /// A numeric literal didn't parse correctly.
    #[strum(serialize = "Invalid number")]
    InvalidNumber,
    /// An occurrence indicator was followed by something other than a count
    /// or whitespace.
    #[strum(serialize = "Expected unsigned integer or space")]
    ExpectedUintOrSpace,
    /// A quoted text value contained a bad escape sequence.
    #[strum(serialize = "Malformed text string")]
    MalformedText,
    /// An `n*m` occurrence with `n > m`.
    #[strum(serialize = "Invalid occurrence bounds")]
    InvalidOccurrence,
}

/// A 1-based position in the CDDL input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Default for Location {
    fn default() -> Self {
        Location { line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// An error that occurred during CDDL parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
// thiserror will generate a Display implementation.
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    /// The "kind" of error generated during CDDL parsing.
    pub kind: ErrorKind,
    /// The line where the error was detected.
    pub line: usize,
    /// The column where the error was detected.
    pub column: usize,
}

impl ParseError {
    /// The position of the offending character.
    pub fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }
}

pub(crate) fn parse_error(kind: ErrorKind, at: Location) -> ParseError {
    ParseError {
        kind,
        line: at.line,
        column: at.column,
    }
}

#[test]
fn parse_error_display() {
    let err = parse_error(ErrorKind::ExpectedAssign, Location { line: 3, column: 7 });
    assert_eq!(err.to_string(), "Expected = at line 3, column 7");
    assert_eq!(err.location().to_string(), "line 3, column 7");
}
