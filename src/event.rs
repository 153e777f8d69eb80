//! This module declares the structural events that validation consumes.
//!
//! A document is never materialized as a tree.  Instead, a reader for some
//! encoding (JSON, CBOR, ...) presents the document as a flat sequence of
//! [`Event`]s through the [`EventCursor`] trait, and the validator pulls
//! events one at a time.
//!
//! For example, the JSON document `{"x": [1, "a"]}` is the event sequence
//! ```text
//! BeginObject, Name("x"), BeginArray, Uint64(1), String("a"), EndArray, EndObject
//! ```

use crate::util::ValidateError;
use strum_macros::IntoStaticStr;

/// One structural event of a document.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[allow(missing_docs)]
pub enum Event {
    #[strum(serialize = "begin_array")]
    BeginArray,
    #[strum(serialize = "end_array")]
    EndArray,
    #[strum(serialize = "begin_object")]
    BeginObject,
    #[strum(serialize = "end_object")]
    EndObject,
    /// A map key.
    #[strum(serialize = "name")]
    Name(String),
    #[strum(serialize = "string_value")]
    String(String),
    #[strum(serialize = "byte_string_value")]
    ByteString(Vec<u8>),
    #[strum(serialize = "uint64_value")]
    Uint64(u64),
    #[strum(serialize = "int64_value")]
    Int64(i64),
    #[strum(serialize = "double_value")]
    Double(f64),
    #[strum(serialize = "bool_value")]
    Bool(bool),
    #[strum(serialize = "null_value")]
    Null,
}

impl Event {
    /// The event kind, e.g. `"begin_array"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Returns true for `EndArray` and `EndObject`.
    pub fn is_end(&self) -> bool {
        matches!(self, Event::EndArray | Event::EndObject)
    }

    /// Returns true for events that open a nested structure.
    pub fn is_begin(&self) -> bool {
        matches!(self, Event::BeginArray | Event::BeginObject)
    }

    /// Returns the integer value of a `Uint64` or `Int64` event.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Event::Uint64(u) => Some(i128::from(*u)),
            Event::Int64(i) => Some(i128::from(*i)),
            _ => None,
        }
    }
}

/// A pull-style source of structural events.
///
/// The cursor always has a "current" event until it is exhausted.  The
/// validator only ever looks at the current event; it never buffers events.
pub trait EventCursor {
    /// The current event, or `None` once the cursor is exhausted.
    fn current(&self) -> Option<&Event>;

    /// Advance to the next event.
    ///
    /// Event sources that decode lazily can report decoding failures here.
    fn next(&mut self) -> Result<(), ValidateError>;

    /// Returns true once every event has been consumed.
    fn done(&self) -> bool {
        self.current().is_none()
    }
}

/// An [`EventCursor`] over an in-memory list of events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventList {
    events: Vec<Event>,
    position: usize,
}

impl EventList {
    /// Create a cursor positioned at the first event.
    pub fn new(events: Vec<Event>) -> EventList {
        EventList {
            events,
            position: 0,
        }
    }

    /// The events that have not been consumed yet.
    pub fn remaining(&self) -> &[Event] {
        &self.events[self.position.min(self.events.len())..]
    }
}

impl From<Vec<Event>> for EventList {
    fn from(events: Vec<Event>) -> Self {
        EventList::new(events)
    }
}

impl EventCursor for EventList {
    fn current(&self) -> Option<&Event> {
        self.events.get(self.position)
    }

    fn next(&mut self) -> Result<(), ValidateError> {
        if self.position < self.events.len() {
            self.position += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_list_cursor() {
        let mut list = EventList::new(vec![Event::BeginArray, Event::Uint64(1), Event::EndArray]);
        assert_eq!(list.current(), Some(&Event::BeginArray));
        list.next().unwrap();
        list.next().unwrap();
        assert_eq!(list.remaining(), &[Event::EndArray]);
        list.next().unwrap();
        assert!(list.done());
        // Advancing past the end is harmless.
        list.next().unwrap();
        assert_eq!(list.current(), None);
    }

    #[test]
    fn event_kinds() {
        assert_eq!(Event::BeginObject.kind(), "begin_object");
        assert_eq!(Event::Name("a".into()).kind(), "name");
        assert_eq!(Event::Int64(-3).as_integer(), Some(-3));
        assert_eq!(Event::Double(1.0).as_integer(), None);
        assert!(Event::EndArray.is_end());
        assert!(!Event::Null.is_begin());
        assert_eq!(format!("{:?}", Event::String("x".into())), r#"String("x")"#);
    }
}
