//! This module implements validation from [`serde_cbor::Value`].
//!
//! CDDL and CBOR were designed to work with one another, so the mapping to
//! events is almost exact.  The exceptions: map keys must be text, integers
//! must fit in 64 bits, and tags aren't supported.
//!
//! # Examples
//!
//! ```
//! use cddl_stream::validate_cbor_bytes;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct PersonStruct {
//!     name: String,
//!     age: u32,
//! }
//!
//! let input = PersonStruct {
//!     name: "Bob".to_string(),
//!     age: 43,
//! };
//! let cbor_bytes = serde_cbor::to_vec(&input).unwrap();
//! let cddl_input = "person = {name: tstr, age: int}";
//! validate_cbor_bytes("person", cddl_input, &cbor_bytes).unwrap();
//! ```

#![cfg(feature = "serde_cbor")]

use crate::event::{Event, EventCursor};
use crate::parser::parse_cddl;
use crate::spec::Specification;
use crate::util::{Error, ValidateError, ValidateResult};
use serde_cbor::Value as CBOR_Value;
use std::collections::btree_map::Iter as MapIter;
use std::convert::TryFrom;
use std::slice::Iter as SliceIter;

/// An open structure, or a map value that follows its key.
enum Frame<'a> {
    Array(SliceIter<'a, CBOR_Value>),
    Map(MapIter<'a, CBOR_Value, CBOR_Value>),
    Value(&'a CBOR_Value),
}

fn integer_event(i: i128) -> Result<Event, ValidateError> {
    let event = if i >= 0 {
        u64::try_from(i).map(Event::Uint64)
    } else {
        i64::try_from(i).map(Event::Int64)
    };
    event.map_err(|_| ValidateError::ValueError(format!("integer {} doesn't fit in 64 bits", i)))
}

/// An [`EventCursor`] that walks a CBOR value.
///
/// Events are produced one at a time as the validator advances.  A value
/// that has no event form (a tag, a non-text map key, an integer wider
/// than 64 bits) is reported as a [`ValidateError::ValueError`] when the
/// cursor reaches it.
pub struct CborCursor<'a> {
    current: Option<Event>,
    stack: Vec<Frame<'a>>,
}

impl<'a> CborCursor<'a> {
    /// Create a cursor positioned at the first event of `value`.
    ///
    /// This fails if the top-level value itself can't be expressed as an
    /// event.
    pub fn new(value: &'a CBOR_Value) -> Result<CborCursor<'a>, ValidateError> {
        let mut cursor = CborCursor {
            current: None,
            stack: Vec::new(),
        };
        cursor.current = Some(cursor.open(value)?);
        Ok(cursor)
    }

    /// The first event of `value`; structures are pushed for later.
    fn open(&mut self, value: &'a CBOR_Value) -> Result<Event, ValidateError> {
        let event = match value {
            CBOR_Value::Null => Event::Null,
            CBOR_Value::Bool(b) => Event::Bool(*b),
            CBOR_Value::Integer(i) => integer_event(*i)?,
            CBOR_Value::Float(f) => Event::Double(*f),
            CBOR_Value::Bytes(b) => Event::ByteString(b.clone()),
            CBOR_Value::Text(t) => Event::String(t.clone()),
            CBOR_Value::Array(a) => {
                self.stack.push(Frame::Array(a.iter()));
                Event::BeginArray
            }
            CBOR_Value::Map(m) => {
                self.stack.push(Frame::Map(m.iter()));
                Event::BeginObject
            }
            CBOR_Value::Tag(tag, _) => {
                return Err(ValidateError::ValueError(format!("unsupported tag {}", tag)));
            }
            _ => return Err(ValidateError::ValueError("unsupported CBOR value".into())),
        };
        Ok(event)
    }

    fn advance(&mut self) -> Result<Option<Event>, ValidateError> {
        let frame = match self.stack.last_mut() {
            Some(frame) => frame,
            None => return Ok(None),
        };
        let event = match frame {
            Frame::Value(value) => {
                let value = *value;
                self.stack.pop();
                self.open(value)?
            }
            Frame::Array(elements) => match elements.next() {
                Some(value) => self.open(value)?,
                None => {
                    self.stack.pop();
                    Event::EndArray
                }
            },
            Frame::Map(members) => match members.next() {
                Some((CBOR_Value::Text(key), value)) => {
                    self.stack.push(Frame::Value(value));
                    Event::Name(key.clone())
                }
                Some(_) => {
                    return Err(ValidateError::ValueError("map key is not a text string".into()));
                }
                None => {
                    self.stack.pop();
                    Event::EndObject
                }
            },
        };
        Ok(Some(event))
    }
}

impl EventCursor for CborCursor<'_> {
    fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }

    fn next(&mut self) -> Result<(), ValidateError> {
        if self.current.is_some() {
            self.current = self.advance()?;
        }
        Ok(())
    }
}

/// Convert a CBOR value into the equivalent sequence of events.
pub fn events_from_cbor(value: &CBOR_Value) -> Result<Vec<Event>, ValidateError> {
    let mut cursor = CborCursor::new(value)?;
    let mut events = Vec::new();
    while let Some(event) = cursor.current.take() {
        events.push(event);
        cursor.current = cursor.advance()?;
    }
    Ok(events)
}

/// Validate already-parsed CBOR data against an already-compiled CDDL schema.
pub fn validate_cbor(spec: &Specification, value: &CBOR_Value) -> ValidateResult {
    spec.validate(&mut CborCursor::new(value)?)
}

/// Validate CBOR-encoded data against a specified rule in a text CDDL schema.
pub fn validate_cbor_bytes(name: &str, cddl: &str, cbor: &[u8]) -> Result<(), Error> {
    let spec = parse_cddl(cddl)?;

    let cbor_value: CBOR_Value =
        serde_cbor::from_slice(cbor).map_err(|e| ValidateError::ValueError(format!("{}", e)))?;

    spec.validate_rule(name, &mut CborCursor::new(&cbor_value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_events() {
        let mut m = std::collections::BTreeMap::new();
        m.insert(CBOR_Value::Text("b".into()), CBOR_Value::Integer(-2));
        m.insert(CBOR_Value::Text("a".into()), CBOR_Value::Bytes(vec![1, 2]));
        let value = CBOR_Value::Array(vec![CBOR_Value::Map(m), CBOR_Value::Float(0.5)]);
        assert_eq!(
            events_from_cbor(&value).unwrap(),
            vec![
                Event::BeginArray,
                Event::BeginObject,
                Event::Name("a".into()),
                Event::ByteString(vec![1, 2]),
                Event::Name("b".into()),
                Event::Int64(-2),
                Event::EndObject,
                Event::Double(0.5),
                Event::EndArray,
            ]
        );
    }

    #[test]
    fn cbor_unsupported() {
        let value = CBOR_Value::Integer(i128::from(u64::MAX) + 1);
        assert!(matches!(events_from_cbor(&value), Err(ValidateError::ValueError(_))));

        let mut m = std::collections::BTreeMap::new();
        m.insert(CBOR_Value::Integer(1), CBOR_Value::Null);
        assert!(matches!(events_from_cbor(&CBOR_Value::Map(m)), Err(ValidateError::ValueError(_))));

        let value = CBOR_Value::Tag(1, Box::new(CBOR_Value::Integer(0)));
        assert!(matches!(events_from_cbor(&value), Err(ValidateError::ValueError(_))));
    }

    #[test]
    fn cbor_cursor_reports_errors_on_advance() {
        let value = CBOR_Value::Array(vec![
            CBOR_Value::Integer(1),
            CBOR_Value::Tag(1, Box::new(CBOR_Value::Integer(0))),
        ]);
        let mut cursor = CborCursor::new(&value).unwrap();
        assert_eq!(cursor.current(), Some(&Event::BeginArray));
        cursor.next().unwrap();
        assert_eq!(cursor.current(), Some(&Event::Uint64(1)));
        let err = cursor.next().unwrap_err();
        assert_eq!(err, ValidateError::ValueError("unsupported tag 1".into()));

        // The bad value is never reached if validation stops first.
        let spec = parse_cddl("thing = [tstr, * any]").unwrap();
        assert_eq!(validate_cbor(&spec, &value), Err(ValidateError::ExpectedTstr));
        let spec = parse_cddl("thing = [int, * any]").unwrap();
        assert!(matches!(validate_cbor(&spec, &value), Err(ValidateError::ValueError(_))));
    }
}
