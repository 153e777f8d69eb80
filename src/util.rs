//! This module defines error and result types.
//!

use crate::parser::ParseError;
use std::result::Result;
use thiserror::Error;

/// An error detected while validating a stream of events.
///
/// Validation stops at the first error; see [`Validator`] for the matching
/// rules that decide which error is reported.
///
/// [`Validator`]: crate::validate::Validator
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidateError {
    /// The rule expected a text string.
    #[error("Expected text string")]
    ExpectedTstr,
    /// The rule expected an unsigned integer.
    #[error("Expected uint")]
    ExpectedUint,
    /// The rule expected an integer.
    #[error("Expected int")]
    ExpectedInt,
    /// The rule expected a negative integer.
    #[error("Expected nint")]
    ExpectedNint,
    /// The rule expected a floating-point value.
    #[error("Expected float")]
    ExpectedFloat,
    /// The rule expected `true` or `false`.
    #[error("Expected bool")]
    ExpectedBool,
    /// The rule expected a null value.
    #[error("Expected nil")]
    ExpectedNil,
    /// The rule expected a byte string.
    #[error("Expected byte string")]
    ExpectedBstr,
    /// The rule expected the start of an array.
    #[error("Expected array")]
    ExpectedArray,
    /// The rule expected the start of a map.
    #[error("Expected map")]
    ExpectedMap,
    /// The rule accepts any value, but the container ended instead.
    #[error("Expected a value")]
    ExpectedValue,
    /// The value had the right type but not the literal value required.
    #[error("Expected {0}")]
    ExpectedLiteral(String),
    /// A numeric value outside the range (or of the wrong kind for it).
    #[error("Expected value in range {0}")]
    OutOfRange(String),
    /// None of the alternatives of a choice accepted the value.
    #[error("Expected one of {0} alternatives")]
    NoMatchingChoice(usize),
    /// A required entry did not occur often enough.
    #[error("Missing entry {0}")]
    MissingEntry(String),
    /// An entry occurred more often than its occurrence limit.
    #[error("Too many occurrences of {0}")]
    TooManyOccurrences(String),
    /// Two entries of the same map share a key.
    #[error("Duplicate map key {0}")]
    DuplicateKey(String),
    /// A rule reference could not be resolved.
    #[error("Rule not found: {0}")]
    RuleNotFound(String),
    /// The event stream contained an event that is illegal at this point.
    #[error("Unexpected {0} event")]
    UnexpectedEvent(&'static str),
    /// The event stream ended before the document was complete.
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    /// Reference chains or nesting exceeded the configured limits.
    #[error("Hit recursion limit")]
    RecursionLimit,
    /// A logical error in the CDDL structure.
    #[error("Structural({0})")]
    Structural(String),
    /// A data value that can't be expressed as validation events.
    #[error("ValueError({0})")]
    ValueError(String),
    /// The event source reported an error.
    #[error("Event source error: {0}")]
    Cursor(String),
}

/// A validation that doesn't return anything.
pub type ValidateResult = Result<(), ValidateError>;

/// Any error returned by the one-step helpers that both compile a schema and
/// validate a document.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// An error during CDDL parsing.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A data mismatch during validation.
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl Error {
    /// Returns the validation error, if this is one.
    pub fn as_validate(&self) -> Option<&ValidateError> {
        match self {
            Error::Validate(e) => Some(e),
            Error::Parse(_) => None,
        }
    }

    /// Returns the parse error, if this is one.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Validate(_) => None,
        }
    }
}
