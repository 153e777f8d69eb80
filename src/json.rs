//! This module implements validation from [`serde_json::Value`].
//!
//! # Examples
//!
//! ```
//! use cddl_stream::validate_json_str;
//!
//! let cddl_input = "person = {name: tstr, age: int}";
//! let json_str = r#"{ "name": "Bob", "age": 43 }"#;
//!
//! validate_json_str("person", cddl_input, &json_str).unwrap();
//! ```
//!

#![cfg(feature = "serde_json")]

use crate::event::{Event, EventCursor};
use crate::parser::parse_cddl;
use crate::spec::Specification;
use crate::util::{Error, ValidateError, ValidateResult};
use serde_json::map::Iter as MapIter;
use serde_json::Value as JSON_Value;
use std::slice::Iter as SliceIter;

/// An open structure, or a map value that follows its key.
enum Frame<'a> {
    Array(SliceIter<'a, JSON_Value>),
    Object(MapIter<'a>),
    Value(&'a JSON_Value),
}

fn number_event(num: &serde_json::Number) -> Event {
    // serde_json allows as_f64 to work on integers, so the integer
    // conversions have to be tried first.
    if let Some(u) = num.as_u64() {
        Event::Uint64(u)
    } else if let Some(i) = num.as_i64() {
        Event::Int64(i)
    } else {
        Event::Double(num.as_f64().unwrap_or(f64::NAN))
    }
}

/// An [`EventCursor`] that walks a JSON value.
///
/// Events are produced one at a time as the validator advances, so the
/// document is never copied.
pub struct JsonCursor<'a> {
    current: Option<Event>,
    stack: Vec<Frame<'a>>,
}

impl<'a> JsonCursor<'a> {
    /// Create a cursor positioned at the first event of `value`.
    pub fn new(value: &'a JSON_Value) -> JsonCursor<'a> {
        let mut cursor = JsonCursor {
            current: None,
            stack: Vec::new(),
        };
        cursor.current = Some(cursor.open(value));
        cursor
    }

    /// The first event of `value`; structures are pushed for later.
    fn open(&mut self, value: &'a JSON_Value) -> Event {
        match value {
            JSON_Value::Null => Event::Null,
            JSON_Value::Bool(b) => Event::Bool(*b),
            JSON_Value::Number(num) => number_event(num),
            JSON_Value::String(t) => Event::String(t.clone()),
            JSON_Value::Array(a) => {
                self.stack.push(Frame::Array(a.iter()));
                Event::BeginArray
            }
            JSON_Value::Object(m) => {
                self.stack.push(Frame::Object(m.iter()));
                Event::BeginObject
            }
        }
    }

    fn advance(&mut self) -> Option<Event> {
        let event = match self.stack.last_mut()? {
            Frame::Value(value) => {
                let value = *value;
                self.stack.pop();
                self.open(value)
            }
            Frame::Array(elements) => match elements.next() {
                Some(value) => self.open(value),
                None => {
                    self.stack.pop();
                    Event::EndArray
                }
            },
            Frame::Object(members) => match members.next() {
                Some((key, value)) => {
                    self.stack.push(Frame::Value(value));
                    Event::Name(key.clone())
                }
                None => {
                    self.stack.pop();
                    Event::EndObject
                }
            },
        };
        Some(event)
    }
}

impl EventCursor for JsonCursor<'_> {
    fn current(&self) -> Option<&Event> {
        self.current.as_ref()
    }

    fn next(&mut self) -> Result<(), ValidateError> {
        if self.current.is_some() {
            self.current = self.advance();
        }
        Ok(())
    }
}

/// Convert a JSON value into the equivalent sequence of events.
pub fn events_from_json(value: &JSON_Value) -> Vec<Event> {
    let mut cursor = JsonCursor::new(value);
    let mut events = Vec::new();
    while let Some(event) = cursor.current.take() {
        events.push(event);
        cursor.current = cursor.advance();
    }
    events
}

#[test]
fn test_json_number_behavior() {
    // Ensures that our JSON decoder tracks number types precisely, and
    // doesn't, say, allow floating-point values to become integers.

    let json_value: JSON_Value = serde_json::from_str("1").unwrap();
    assert_eq!(events_from_json(&json_value), vec![Event::Uint64(1)]);

    let json_value: JSON_Value = serde_json::from_str("-1").unwrap();
    assert_eq!(events_from_json(&json_value), vec![Event::Int64(-1)]);

    let json_value: JSON_Value = serde_json::from_str("1.0").unwrap();
    assert_eq!(events_from_json(&json_value), vec![Event::Double(1.0)]);
}

#[test]
fn test_json_events() {
    let json_value: JSON_Value = serde_json::from_str(r#"{"x": [1, "a"], "y": null}"#).unwrap();
    assert_eq!(
        events_from_json(&json_value),
        vec![
            Event::BeginObject,
            Event::Name("x".into()),
            Event::BeginArray,
            Event::Uint64(1),
            Event::String("a".into()),
            Event::EndArray,
            Event::Name("y".into()),
            Event::Null,
            Event::EndObject,
        ]
    );
}

/// Validate already-parsed JSON data against an already-compiled CDDL schema.
pub fn validate_json(spec: &Specification, value: &JSON_Value) -> ValidateResult {
    spec.validate(&mut JsonCursor::new(value))
}

/// Validate JSON-encoded data against a specified rule in a UTF-8 CDDL schema.
pub fn validate_json_str(name: &str, cddl: &str, json: &str) -> Result<(), Error> {
    let spec = parse_cddl(cddl)?;

    // Deserialize the JSON text
    let json_value: JSON_Value =
        serde_json::from_str(json).map_err(|e| ValidateError::ValueError(format!("{}", e)))?;

    spec.validate_rule(name, &mut JsonCursor::new(&json_value))?;
    Ok(())
}

#[test]
fn test_json_cursor_is_lazy() {
    let json_value: JSON_Value = serde_json::from_str(r#"[{"a": []}, 2]"#).unwrap();
    let mut cursor = JsonCursor::new(&json_value);
    assert_eq!(cursor.current(), Some(&Event::BeginArray));
    assert!(cursor.stack.len() == 1);
    cursor.next().unwrap();
    assert_eq!(cursor.current(), Some(&Event::BeginObject));
    cursor.next().unwrap();
    assert_eq!(cursor.current(), Some(&Event::Name("a".into())));
    // The member value is only opened once the key has been consumed.
    assert!(matches!(cursor.stack.last(), Some(Frame::Value(_))));
    for _ in 0..5 {
        cursor.next().unwrap();
    }
    assert_eq!(cursor.current(), Some(&Event::EndArray));
    cursor.next().unwrap();
    assert!(cursor.done());
    cursor.next().unwrap();
    assert!(cursor.done());
}
