//! This module defines the rule dictionary and the Context trait.
//!
//! A [`Context`] is used to specify runtime behavior for validation.
//! When a validation needs to resolve a rule reference, it will ask the
//! `Context` to perform the name resolution.
//!

use crate::rule::{Literal, PrimitiveType, Rule, RuleArena, RuleId};
use crate::util::ValidateError;
use std::collections::BTreeMap;

/// This type is used in [`RuleDictionary`] to perform rule lookups.
pub type RulesByName = BTreeMap<String, RuleId>;

/// A Context contains any external information required for validation.
///
/// Right now, that only includes a way to resolve a name reference to a
/// rule, and a way to fetch rule nodes by id.
pub trait Context {
    /// Lookup a rule by name.
    fn lookup_rule(&self, name: &str) -> Result<RuleId, ValidateError>;

    /// Fetch a rule node by id.
    fn rule(&self, id: RuleId) -> Result<&Rule, ValidateError>;
}

/// The names defined by the CDDL prelude, and the rules they stand for.
fn prelude() -> Vec<(&'static str, Rule)> {
    use PrimitiveType::*;
    vec![
        ("any", Rule::Unconstrained),
        ("tstr", Rule::Primitive(Tstr)),
        ("text", Rule::Primitive(Tstr)),
        ("uint", Rule::Primitive(Uint)),
        ("nint", Rule::Primitive(Nint)),
        ("int", Rule::Primitive(Int)),
        ("float", Rule::Primitive(Float)),
        ("float16", Rule::Primitive(Float)),
        ("float32", Rule::Primitive(Float)),
        ("float64", Rule::Primitive(Float)),
        ("float16-32", Rule::Primitive(Float)),
        ("float32-64", Rule::Primitive(Float)),
        ("bool", Rule::Primitive(Bool)),
        ("true", Rule::Literal(Literal::Bool(true))),
        ("false", Rule::Literal(Literal::Bool(false))),
        ("nil", Rule::Primitive(Nil)),
        ("null", Rule::Primitive(Nil)),
        ("bstr", Rule::Primitive(Bstr)),
        ("bytes", Rule::Primitive(Bstr)),
    ]
}

/// A mapping from rule names to compiled rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleDictionary {
    rules: RulesByName,
}

impl RuleDictionary {
    /// Create an empty dictionary.
    pub fn new() -> RuleDictionary {
        RuleDictionary::default()
    }

    /// Create a dictionary holding the prelude names, allocating their
    /// rules in `arena`.
    pub fn with_prelude(arena: &mut RuleArena) -> RuleDictionary {
        let mut dict = RuleDictionary::new();
        for (name, rule) in prelude() {
            dict.insert(name, arena.alloc(rule));
        }
        dict
    }

    /// Bind a name, replacing (and returning) any earlier binding.
    pub fn insert<S: Into<String>>(&mut self, name: S, rule: RuleId) -> Option<RuleId> {
        self.rules.insert(name.into(), rule)
    }

    /// Look up a name.
    pub fn get(&self, name: &str) -> Option<RuleId> {
        self.rules.get(name).copied()
    }

    /// Returns true if the name is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// All bound names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// The number of bound names.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A simple context that pairs a rule arena with a dictionary.
#[allow(missing_docs)]
pub struct BasicContext<'a> {
    pub arena: &'a RuleArena,
    pub dictionary: &'a RuleDictionary,
}

impl<'a> BasicContext<'a> {
    /// Create a new BasicContext.
    pub fn new(arena: &'a RuleArena, dictionary: &'a RuleDictionary) -> BasicContext<'a> {
        BasicContext { arena, dictionary }
    }
}

impl Context for BasicContext<'_> {
    fn lookup_rule(&self, name: &str) -> Result<RuleId, ValidateError> {
        self.dictionary
            .get(name)
            .ok_or_else(|| ValidateError::RuleNotFound(name.into()))
    }

    fn rule(&self, id: RuleId) -> Result<&Rule, ValidateError> {
        self.arena
            .get(id)
            .ok_or_else(|| ValidateError::Structural(format!("no rule with id {}", id.index())))
    }
}
