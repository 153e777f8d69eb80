//! Conversion of numeric tokens into literal values.
//!
//! The scanner decides where a number starts and ends; this module only
//! turns the delimited token text into a [`Literal`].

use crate::rule::Literal;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, hex_digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    number::complete::recognize_float,
    sequence::{pair, preceded},
    IResult,
};

// `-0x1f`
fn hex_int(input: &str) -> IResult<&str, Literal> {
    map_res(
        pair(opt(tag("-")), preceded(tag("0x"), hex_digit1)),
        |(sign, digits): (Option<&str>, &str)| {
            i128::from_str_radix(digits, 16).map(|v| match sign {
                Some(_) => Literal::Int(-v),
                None => Literal::Int(v),
            })
        },
    )(input)
}

// `-17`
fn dec_int(input: &str) -> IResult<&str, Literal> {
    map_res(recognize(pair(opt(tag("-")), digit1)), |s: &str| {
        s.parse::<i128>().map(Literal::Int)
    })(input)
}

// `1.5`, `-2e10`
fn float(input: &str) -> IResult<&str, Literal> {
    map_res(recognize_float, |s: &str| s.parse::<f64>().map(Literal::Float))(input)
}

/// Convert a complete numeric token.
///
/// Returns `None` if the token isn't a number, or doesn't fit the literal
/// types.
pub(crate) fn number_literal(token: &str) -> Option<Literal> {
    let mut number = alt((
        all_consuming(hex_int),
        all_consuming(dec_int),
        all_consuming(float),
    ));
    number(token).ok().map(|(_, literal)| literal)
}

#[test]
fn test_number_literal() {
    assert_eq!(number_literal("0"), Some(Literal::Int(0)));
    assert_eq!(number_literal("-0x10"), Some(Literal::Int(-16)));
    assert_eq!(number_literal("0xff"), Some(Literal::Int(255)));
    assert_eq!(number_literal("-12"), Some(Literal::Int(-12)));
    assert_eq!(number_literal("0.25"), Some(Literal::Float(0.25)));
    assert_eq!(number_literal("1e2"), Some(Literal::Float(100.0)));
    assert_eq!(
        number_literal("18446744073709551616"),
        Some(Literal::Int(18_446_744_073_709_551_616))
    );
    assert_eq!(number_literal("0x"), None);
    assert_eq!(number_literal("1.2.3"), None);
    assert_eq!(number_literal("abc"), None);
}
