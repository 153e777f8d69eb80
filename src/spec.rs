//! This module defines the compiled form of a CDDL document.
//!

use crate::context::{Context, RuleDictionary};
use crate::event::EventCursor;
use crate::parser::{parse_cddl, ParseError};
use crate::rule::{Rule, RuleArena, RuleId};
use crate::util::{ValidateError, ValidateResult};
use crate::validate::{ValidateOptions, Validator};

/// A compiled CDDL document.
///
/// A `Specification` owns every rule node of the document along with the
/// dictionary of rule names, and remembers which rule is the root (the
/// first rule in the document).  It never changes after compilation, so
/// one `Specification` can be shared by any number of validations, each
/// with its own [`EventCursor`].
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    arena: RuleArena,
    dictionary: RuleDictionary,
    root_name: String,
    root: RuleId,
}

impl Specification {
    pub(crate) fn new(
        arena: RuleArena,
        dictionary: RuleDictionary,
        root_name: String,
        root: RuleId,
    ) -> Specification {
        Specification {
            arena,
            dictionary,
            root_name,
            root,
        }
    }

    /// Compile CDDL text.  This is the same as [`parse_cddl`].
    pub fn parse(input: &str) -> Result<Specification, ParseError> {
        parse_cddl(input)
    }

    /// The root rule's id.
    pub fn root(&self) -> RuleId {
        self.root
    }

    /// The root rule's name.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// The root rule.
    pub fn root_rule(&self) -> &Rule {
        &self.arena[self.root]
    }

    /// Fetch a rule node by id.
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.arena.get(id)
    }

    /// Look up a rule by name, including the prelude names.
    pub fn lookup(&self, name: &str) -> Option<RuleId> {
        self.dictionary.get(name)
    }

    /// The rule dictionary.
    pub fn dictionary(&self) -> &RuleDictionary {
        &self.dictionary
    }

    /// A validator for this document, using the default options.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self)
    }

    /// A validator for this document, using the given options.
    pub fn validator_with(&self, options: ValidateOptions) -> Validator<'_> {
        Validator::with_options(self, options)
    }

    /// Validate a document against the root rule.
    pub fn validate(&self, cursor: &mut dyn EventCursor) -> ValidateResult {
        self.validator().validate_id(self.root, cursor)
    }

    /// Validate a document against a named rule.
    pub fn validate_rule(&self, name: &str, cursor: &mut dyn EventCursor) -> ValidateResult {
        let id = self.lookup_rule(name)?;
        self.validator().validate_id(id, cursor)
    }
}

impl Context for Specification {
    fn lookup_rule(&self, name: &str) -> Result<RuleId, ValidateError> {
        self.lookup(name)
            .ok_or_else(|| ValidateError::RuleNotFound(name.into()))
    }

    fn rule(&self, id: RuleId) -> Result<&Rule, ValidateError> {
        self.arena
            .get(id)
            .ok_or_else(|| ValidateError::Structural(format!("no rule with id {}", id.index())))
    }
}
