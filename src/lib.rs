//! `cddl-stream` is a library for validating streamed data against a CDDL
//! document that describes the expected structure of the data.
//!
//! CDDL is a text document described by [RFC8610] that describes data
//! structures.  CDDL is not tied to any specific serialization or encoding
//! method; it can be used to validate data that is in [CBOR] or JSON format.
//!
//! The goal of this library is to validate a document as it is read, without
//! first building the whole document in memory.
//!
//! # Implementation Details
//!
//! - CDDL text is compiled by a state machine with an explicit stack, so
//!   deeply nested schemas can't overflow the call stack.  The result is a
//!   [`Specification`]: an arena of [`Rule`](crate::rule::Rule) nodes, a
//!   dictionary of rule names, and a root rule.
//!
//! - Rule references are kept by name and resolved when validation reaches
//!   them, so rules may be defined in any order and may refer to
//!   themselves.
//!
//! - Documents are presented to the validator as a stream of structural
//!   [`Event`]s through the [`EventCursor`] trait.  The validator tracks
//!   nesting with its own frame stack.
//!
//! - The `serde_json` and `serde_cbor` features add [`JsonCursor`] and
//!   [`CborCursor`], which walk an already-decoded value and hand its events
//!   to the validator one at a time without copying the document.
//!
//! # Examples
//!
//! This example validates JSON-encoded data against a CDDL schema:
//!
//! ```
//! # #[cfg(feature = "serde_json")]
//! use cddl_stream::validate_json_str;
//!
//! let cddl_input = "person = {name: tstr, age: int}";
//! let json_str = r#"{ "name": "Bob", "age": 43 }"#;
//!
//! # #[cfg(feature = "serde_json")]
//! validate_json_str("person", cddl_input, &json_str).unwrap();
//! ```
//!
//! If the JSON data doesn't have the expected structure, an error will
//! result:
//! ```
//! # #[cfg(feature = "serde_json")]
//! use cddl_stream::validate_json_str;
//!
//! let cddl_input = "person = {name: tstr, age: int}";
//! let json_str = r#"{ "name": "Bob", "age": "forty three" }"#;
//!
//! # #[cfg(feature = "serde_json")]
//! assert!(validate_json_str("person", cddl_input, &json_str).is_err());
//! ```
//!
//! Any event source can be validated, by implementing [`EventCursor`] or by
//! collecting events into an [`EventList`]:
//! ```
//! use cddl_stream::{parse_cddl, Event, EventList};
//!
//! let spec = parse_cddl("point = [x: int, y: int]").unwrap();
//! let mut events = EventList::new(vec![
//!     Event::BeginArray,
//!     Event::Int64(-3),
//!     Event::Uint64(4),
//!     Event::EndArray,
//! ]);
//! spec.validate(&mut events).unwrap();
//! ```
//!
//! Supported prelude types:
//! - `any`, `uint`, `nint`, `int`, `bstr`, `bytes`, `tstr`, `text`
//! - `float`, `float16`, `float32`, `float64`, `float16-32`, `float32-64`
//! - `bool`, `true`, `false`, `nil`, `null`
//!
//! Note: float sizes are not validated.
//!
//! Supported CDDL features:
//! - Literal int, float, and UTF-8 text strings
//! - Arrays and maps
//! - Rule lookups by name
//! - Groups
//! - Choices (using `/` syntax)
//! - Occurrences (`?`, `*`, `+`, or `m*n`)
//! - Ranges (e.g. `1..7` or `1...8`)
//!
//! Unimplemented CDDL features:
//! - Group choices with `//`
//! - Control operators (e.g. `.size`, `.regexp`)
//! - Generic types
//! - Map keys with `=>` syntax
//! - Tagged data with `#`
//! - Byte string literals
//!
//! [RFC8610]: https://tools.ietf.org/html/rfc8610
//! [CBOR]: https://cbor.io/

#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![warn(clippy::cast_possible_truncation)]

pub mod context;
pub mod event;
pub mod parser;
pub mod rule;
pub mod spec;
pub mod util;
pub mod validate;

#[doc(inline)]
pub use event::{Event, EventCursor, EventList};
#[doc(inline)]
pub use spec::Specification;
#[doc(inline)]
pub use util::{Error, ValidateError, ValidateResult};
#[doc(inline)]
pub use validate::{ValidateOptions, Validator};

#[cfg(feature = "serde_cbor")]
pub mod cbor;
#[cfg(feature = "serde_cbor")]
#[doc(inline)]
pub use cbor::{validate_cbor, validate_cbor_bytes, CborCursor};

#[cfg(feature = "serde_json")]
pub mod json;
#[cfg(feature = "serde_json")]
#[doc(inline)]
pub use json::{validate_json, validate_json_str, JsonCursor};

#[doc(inline)]
pub use parser::{parse_cddl, ParseError};
