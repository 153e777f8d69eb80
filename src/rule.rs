//! This module defines the compiled rule model.
//!
//! A compiled CDDL document is a graph of [`Rule`] nodes.  The nodes are
//! stored in an arena owned by the [`Specification`], and refer to one
//! another by [`RuleId`].  Named references are kept symbolic
//! ([`Rule::Reference`]) and are resolved through the rule dictionary when
//! the validator reaches them, so rules may refer to rules that are defined
//! later in the document (or to themselves).
//!
//! This module doesn't know how to validate anything; see [`validate`].
//!
//! [`Specification`]: crate::spec::Specification
//! [`validate`]: crate::validate

use crate::event::Event;
use float_ord::FloatOrd;
use std::fmt;
use std::ops::Index;
use strum_macros::{Display, IntoStaticStr};

/// The index of a [`Rule`] inside a [`RuleArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    /// The raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One of the types named in the CDDL prelude.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    /// A text string
    #[strum(serialize = "tstr")]
    Tstr,
    /// An integer >= 0
    #[strum(serialize = "uint")]
    Uint,
    /// A positive or negative integer
    #[strum(serialize = "int")]
    Int,
    /// An integer < 0
    #[strum(serialize = "nint")]
    Nint,
    /// A floating-point value
    #[strum(serialize = "float")]
    Float,
    /// A boolean value: true or false
    #[strum(serialize = "bool")]
    Bool,
    /// Nil aka null: nothing.
    #[strum(serialize = "nil")]
    Nil,
    /// A byte string
    #[strum(serialize = "bstr")]
    Bstr,
}

impl PrimitiveType {
    /// Returns true if a single event is a value of this type.
    pub fn matches(self, event: &Event) -> bool {
        match (self, event) {
            (PrimitiveType::Tstr, Event::String(_)) => true,
            (PrimitiveType::Uint, Event::Uint64(_)) => true,
            (PrimitiveType::Uint, Event::Int64(i)) => *i >= 0,
            (PrimitiveType::Int, Event::Uint64(_)) | (PrimitiveType::Int, Event::Int64(_)) => true,
            (PrimitiveType::Nint, Event::Int64(i)) => *i < 0,
            (PrimitiveType::Float, Event::Double(_)) => true,
            (PrimitiveType::Bool, Event::Bool(_)) => true,
            (PrimitiveType::Nil, Event::Null) => true,
            (PrimitiveType::Bstr, Event::ByteString(_)) => true,
            _ => false,
        }
    }
}

/// A literal value, e.g. `7`, `1.3`, or ``"foo"``.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Literal {
    Bool(bool),
    Int(i128),
    Float(f64),
    Text(String),
}

impl Literal {
    /// The primitive type whose values this literal belongs to.
    pub fn primitive(&self) -> PrimitiveType {
        match self {
            Literal::Bool(_) => PrimitiveType::Bool,
            Literal::Int(_) => PrimitiveType::Int,
            Literal::Float(_) => PrimitiveType::Float,
            Literal::Text(_) => PrimitiveType::Tstr,
        }
    }

    /// Returns true if the event carries exactly this value.
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Literal::Bool(b), Event::Bool(v)) => b == v,
            (Literal::Int(i), _) => event.as_integer() == Some(*i),
            (Literal::Float(f), Event::Double(v)) => FloatOrd(*f) == FloatOrd(*v),
            (Literal::Text(t), Event::String(v)) => t == v,
            _ => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            // FIXME: it's annoying that floating point values can omit the
            // decimal, which can be confused for an integer.
            Literal::Float(fl) => write!(f, "{}", fl),
            Literal::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Marks an occurrence without an upper limit.
pub const UNBOUNDED: usize = usize::MAX;

/// Specify a CDDL occurrence's limits.
///
/// An "occurrence" in CDDL specifies how many times a value should repeat
/// (in an array) or flag optional map keys.  [RFC8610] specifies the following
/// occurrence symbols:
/// ```text
/// "?" Optional
/// "*" Zero or more
/// "+" One or more
/// n*m Between n and m, inclusive (n and m are both optional)
/// ```
///
/// [RFC8610]: https://tools.ietf.org/html/rfc8610
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occur {
    /// The minimum number of occurrences.
    pub min: usize,
    /// The maximum number of occurrences, or [`UNBOUNDED`].
    pub max: usize,
}

impl Occur {
    /// Exactly once; the default when no occurrence indicator is given.
    pub const ONCE: Occur = Occur { min: 1, max: 1 };
    /// `?`
    pub const OPTIONAL: Occur = Occur { min: 0, max: 1 };
    /// `*`
    pub const ZERO_OR_MORE: Occur = Occur {
        min: 0,
        max: UNBOUNDED,
    };
    /// `+`
    pub const ONE_OR_MORE: Occur = Occur {
        min: 1,
        max: UNBOUNDED,
    };

    /// Get the CDDL symbol for this occurrence.
    ///
    /// Returns `?`, `*`, `+`, `n*m`, or an empty string for "exactly once".
    pub fn symbol(&self) -> String {
        match (self.min, self.max) {
            (1, 1) => String::new(),
            (0, 1) => "?".into(),
            (0, UNBOUNDED) => "*".into(),
            (1, UNBOUNDED) => "+".into(),
            (n, UNBOUNDED) => format!("{}*", n),
            (n, m) => format!("{}*{}", n, m),
        }
    }
}

impl Default for Occur {
    fn default() -> Self {
        Occur::ONCE
    }
}

/// One member of an array, map, or group.
///
/// Map members carry a key; array members may carry one too, but array keys
/// are informational only and are ignored by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// The member key, if any.
    pub key: Option<String>,
    /// How many times the member may occur.
    pub occur: Occur,
    /// The rule each occurrence must satisfy.
    pub rule: RuleId,
}

impl GroupEntry {
    /// A keyless entry that must occur exactly once.
    pub fn new(rule: RuleId) -> GroupEntry {
        GroupEntry {
            key: None,
            occur: Occur::ONCE,
            rule,
        }
    }
}

/// A range of numbers.
///
/// Ranges can be defined as inclusive (`..`) or exclusive (`...`).  The
/// endpoints are rules so that they can name constants defined elsewhere;
/// they must resolve to two integer or two float literals.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Range {
    pub start: RuleId,
    pub end: RuleId,
    pub inclusive: bool,
}

/// Any node of the compiled rule graph.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[allow(missing_docs)]
pub enum Rule {
    Primitive(PrimitiveType),
    Literal(Literal),
    /// A by-name reference, resolved at validation time.
    Reference(String),
    Array(Vec<GroupEntry>),
    Map(Vec<GroupEntry>),
    /// A group is inlined into whatever contains it.
    Group(Vec<GroupEntry>),
    /// Alternatives (`a / b`), stored as keyless entries in source order.
    Choice(Vec<GroupEntry>),
    Range(Range),
    /// Accepts any single value: the prelude type `any`.
    Unconstrained,
}

impl Rule {
    /// A cheap, non-consuming check of whether this rule can accept a value
    /// starting with `event`.
    ///
    /// Answers precisely for primitives, literals, arrays, maps, and
    /// `Unconstrained`.  References, groups, choices, and ranges need the
    /// rule dictionary to decide, so they return false here; the validator
    /// has a dictionary-aware version of this check.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Rule::Primitive(p) => p.matches(event),
            Rule::Literal(l) => l.matches(event),
            Rule::Array(_) => *event == Event::BeginArray,
            Rule::Map(_) => *event == Event::BeginObject,
            Rule::Unconstrained => !event.is_end() && !is_name(event),
            Rule::Reference(_) | Rule::Group(_) | Rule::Choice(_) | Rule::Range(_) => false,
        }
    }

    /// A short description, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Rule::Primitive(p) => p.to_string(),
            Rule::Literal(l) => l.to_string(),
            Rule::Reference(name) => name.clone(),
            Rule::Unconstrained => "any".into(),
            other => {
                let variant: &str = other.into();
                variant.to_lowercase()
            }
        }
    }
}

fn is_name(event: &Event) -> bool {
    matches!(event, Event::Name(_))
}

/// The owner of every rule node of a compiled document.
///
/// Rules are only ever appended, never removed, so a [`RuleId`] handed out
/// by an arena stays valid for the arena's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleArena {
    rules: Vec<Rule>,
}

impl RuleArena {
    /// Create an empty arena.
    pub fn new() -> RuleArena {
        RuleArena::default()
    }

    /// Store a rule and return its id.
    pub fn alloc(&mut self, rule: Rule) -> RuleId {
        self.rules.push(rule);
        RuleId(self.rules.len() - 1)
    }

    /// Look up a rule by id.
    ///
    /// Ids are only created by `alloc`, so this can only fail if an id from
    /// one arena is used with another.
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// The number of rules stored.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rules are stored.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Index<RuleId> for RuleArena {
    type Output = Rule;

    fn index(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }
}
