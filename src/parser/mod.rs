//! This module contains the CDDL compiler.
//!
//! The compiler turns CDDL text into a [`Specification`].  It doesn't
//! use recursive descent: every nested production is tracked by an entry
//! on an explicit state stack, so the depth of nesting in the input is
//! limited only by available memory.
//!
//! Named references are never resolved here.  Any identifier used as a
//! value becomes a [`Rule::Reference`], and the named definitions are only
//! bound in the dictionary once the whole input has been consumed.  This
//! allows definitions to appear in any order.
//!
//! # Examples
//! ```
//! use cddl_stream::parse_cddl;
//!
//! let spec = parse_cddl("person = { name: tstr, age: uint }").unwrap();
//! assert_eq!(spec.root_name(), "person");
//! ```

use crate::context::RuleDictionary;
use crate::rule::{GroupEntry, Literal, Occur, Range, Rule, RuleArena, RuleId, UNBOUNDED};
use crate::spec::Specification;
use scanner::{is_ealpha, Scanner};
use tracing::{debug, trace};

mod number;
pub mod parse_err;
mod scanner;

#[doc(inline)]
pub use parse_err::{ErrorKind, Location, ParseError};

/// What the parser is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// The start of a rule definition, or the end of input.
    ExpectRule,
    /// The `=` after a rule name.
    ExpectAssign,
    /// A rule's right-hand side is complete.
    BindRule,
    /// One operand: a literal, a name, or an opening bracket.
    ExpectType,
    /// A choice (`/`), a range operator, or the end of the type.
    AfterType,
    /// The next member of a structure, or its closing bracket.
    Members,
    /// An optional comma after a member.
    MembersSep,
    /// The occurrence and key of a member.
    EntryStart,
    /// A member's value is complete.
    EntryEnd,
}

#[derive(Debug, Clone, Copy)]
struct StateItem {
    state: State,
    /// The bracket that closes the innermost open structure, if any.
    delimiter: Option<char>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructureKind {
    Array,
    Map,
    Group,
}

impl StructureKind {
    fn from_opener(c: char) -> Option<(StructureKind, char)> {
        match c {
            '[' => Some((StructureKind::Array, ']')),
            '{' => Some((StructureKind::Map, '}')),
            '(' => Some((StructureKind::Group, ')')),
            _ => None,
        }
    }

    fn separator_error(self) -> ErrorKind {
        match self {
            StructureKind::Array => ErrorKind::ExpectedCommaOrLeftParOrRightSqbracket,
            StructureKind::Map => ErrorKind::ExpectedCommaOrLeftParOrRightCurbracket,
            StructureKind::Group => ErrorKind::ExpectedCommaOrRightPar,
        }
    }
}

/// A structure whose closing bracket hasn't been seen yet.
struct StructureBuilder {
    kind: StructureKind,
    entries: Vec<GroupEntry>,
}

/// The parts of a member that come before its value.
struct EntryBuilder {
    occur: Occur,
    key: Option<String>,
}

/// A type expression: one or more choices, the last of which may be the
/// start of a range awaiting its end.
#[derive(Default)]
struct TypeBuilder {
    choices: Vec<RuleId>,
    range_start: Option<(RuleId, bool)>,
}

/// A top-level definition waiting to be bound in the dictionary.
struct PendingRule {
    name: String,
    rule: Option<RuleId>,
}

/// Returns true for the characters that can begin a structure member.
fn starts_entry(c: char) -> bool {
    is_ealpha(c) || c.is_ascii_digit() || matches!(c, '"' | '-' | '?' | '*' | '+' | '[' | '{' | '(')
}

struct Parser {
    scanner: Scanner,
    arena: RuleArena,
    states: Vec<StateItem>,
    types: Vec<TypeBuilder>,
    entries: Vec<EntryBuilder>,
    structures: Vec<StructureBuilder>,
    pending: Vec<PendingRule>,
    /// The most recently completed value, waiting for its consumer.
    value: Option<RuleId>,
}

impl Parser {
    fn new(input: &str) -> Parser {
        Parser {
            scanner: Scanner::new(input),
            arena: RuleArena::new(),
            states: vec![StateItem {
                state: State::ExpectRule,
                delimiter: None,
            }],
            types: Vec::new(),
            entries: Vec::new(),
            structures: Vec::new(),
            pending: Vec::new(),
            value: None,
        }
    }

    fn push(&mut self, state: State, delimiter: Option<char>) {
        self.states.push(StateItem { state, delimiter });
    }

    /// Replace the state on top of the stack.
    fn replace(&mut self, state: State, delimiter: Option<char>) {
        self.states.pop();
        self.push(state, delimiter);
    }

    /// Start a complete type expression: an operand, then whatever follows it.
    fn push_type(&mut self, delimiter: Option<char>, operand: Option<RuleId>) {
        self.types.push(TypeBuilder::default());
        self.push(State::AfterType, delimiter);
        match operand {
            Some(id) => self.value = Some(id),
            None => self.push(State::ExpectType, delimiter),
        }
    }

    fn take_value(&mut self) -> RuleId {
        self.value
            .take()
            .expect("parser state completed without producing a value")
    }

    fn run(mut self) -> Result<Specification, ParseError> {
        while let Some(item) = self.states.last().copied() {
            trace!(state = ?item.state, depth = self.states.len(), "parser state");
            match item.state {
                State::ExpectRule => self.expect_rule()?,
                State::ExpectAssign => self.expect_assign()?,
                State::BindRule => self.bind_rule(),
                State::ExpectType => self.expect_type()?,
                State::AfterType => self.after_type(item.delimiter)?,
                State::Members => self.members(item.delimiter)?,
                State::MembersSep => self.members_sep(item.delimiter)?,
                State::EntryStart => self.entry_start(item.delimiter)?,
                State::EntryEnd => self.entry_end(),
            }
        }
        Ok(self.finish())
    }

    fn expect_rule(&mut self) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        match self.scanner.peek() {
            None if self.pending.is_empty() => Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            None => {
                self.states.pop();
                Ok(())
            }
            Some(c) if is_ealpha(c) => {
                let name = self.scanner.scan_id()?;
                self.pending.push(PendingRule { name, rule: None });
                self.push(State::BindRule, None);
                self.push(State::ExpectAssign, None);
                Ok(())
            }
            Some(_) => Err(self.scanner.error(ErrorKind::ExpectedId)),
        }
    }

    fn expect_assign(&mut self) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        match self.scanner.peek() {
            None => return Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            Some('=') => {
                self.scanner.bump();
            }
            Some(_) => return Err(self.scanner.error(ErrorKind::ExpectedAssign)),
        }
        // `==` is not an assignment.
        if self.scanner.peek() == Some('=') {
            return Err(self.scanner.error(ErrorKind::ExpectedAssign));
        }
        self.states.pop();
        self.push_type(None, None);
        Ok(())
    }

    fn bind_rule(&mut self) {
        let id = self.take_value();
        self.states.pop();
        if let Some(pending) = self.pending.last_mut() {
            debug!(name = %pending.name, rule = id.index(), "rule defined");
            pending.rule = Some(id);
        }
    }

    fn expect_type(&mut self) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        let c = match self.scanner.peek() {
            Some(c) => c,
            None => return Err(self.scanner.error(ErrorKind::UnexpectedEof)),
        };
        if let Some((kind, closer)) = StructureKind::from_opener(c) {
            self.scanner.bump();
            self.structures.push(StructureBuilder {
                kind,
                entries: Vec::new(),
            });
            self.replace(State::Members, Some(closer));
            return Ok(());
        }
        let rule = if c == '"' {
            Rule::Literal(Literal::Text(self.scanner.scan_text()?))
        } else if c == '-' || c.is_ascii_digit() {
            Rule::Literal(self.scanner.scan_number()?)
        } else if is_ealpha(c) {
            Rule::Reference(self.scanner.scan_id()?)
        } else {
            return Err(self.scanner.error(ErrorKind::ExpectedGroupent));
        };
        self.value = Some(self.arena.alloc(rule));
        self.states.pop();
        Ok(())
    }

    fn after_type(&mut self, delimiter: Option<char>) -> Result<(), ParseError> {
        let operand = self.take_value();
        self.scanner.skip_ws();
        let next = self.scanner.peek();

        if next == Some('.') {
            let builder = self.types.last_mut().expect("type builder for an open type");
            if self.scanner.peek_at(1) != Some('.') || builder.range_start.is_some() {
                return Err(self
                    .scanner
                    .error(ErrorKind::ExpectedRangeopOrSlashOrCommaOrRightBracket));
            }
            self.scanner.bump();
            self.scanner.bump();
            let inclusive = !self.scanner.eat('.');
            builder.range_start = Some((operand, inclusive));
            self.push(State::ExpectType, delimiter);
            return Ok(());
        }

        let operand = self.complete_operand(operand);
        if next == Some('/') {
            self.scanner.bump();
            self.push(State::ExpectType, delimiter);
            return Ok(());
        }

        let ends_type = match (delimiter, next) {
            (None, None) => true,
            (None, Some(c)) => is_ealpha(c),
            (Some(_), None) => return Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            // A mismatched closing bracket is left for the separator check.
            (Some(_), Some(c)) => c == ',' || starts_entry(c) || matches!(c, ']' | '}' | ')'),
        };
        if !ends_type {
            return Err(self
                .scanner
                .error(ErrorKind::ExpectedRangeopOrSlashOrCommaOrRightBracket));
        }

        let builder = self.types.pop().expect("type builder for an open type");
        let id = if builder.choices.len() == 1 {
            operand
        } else {
            let alternatives = builder.choices.into_iter().map(GroupEntry::new).collect();
            self.arena.alloc(Rule::Choice(alternatives))
        };
        self.value = Some(id);
        self.states.pop();
        Ok(())
    }

    /// Close a pending range, if any, and record the operand as a choice.
    fn complete_operand(&mut self, operand: RuleId) -> RuleId {
        let builder = self.types.last_mut().expect("type builder for an open type");
        let operand = match builder.range_start.take() {
            Some((start, inclusive)) => self.arena.alloc(Rule::Range(Range {
                start,
                end: operand,
                inclusive,
            })),
            None => operand,
        };
        builder.choices.push(operand);
        operand
    }

    fn structure_kind(&self) -> StructureKind {
        self.structures
            .last()
            .map(|s| s.kind)
            .expect("structure builder for an open structure")
    }

    fn members(&mut self, delimiter: Option<char>) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        match self.scanner.peek() {
            None => Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            Some(c) if Some(c) == delimiter => {
                self.scanner.bump();
                let structure = self
                    .structures
                    .pop()
                    .expect("structure builder for an open structure");
                let rule = match structure.kind {
                    StructureKind::Array => Rule::Array(structure.entries),
                    StructureKind::Map => Rule::Map(structure.entries),
                    StructureKind::Group => Rule::Group(structure.entries),
                };
                self.value = Some(self.arena.alloc(rule));
                self.states.pop();
                Ok(())
            }
            Some(c) if starts_entry(c) => {
                self.replace(State::MembersSep, delimiter);
                self.push(State::EntryStart, delimiter);
                Ok(())
            }
            Some(_) => Err(self.scanner.error(self.structure_kind().separator_error())),
        }
    }

    fn members_sep(&mut self, delimiter: Option<char>) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        match self.scanner.peek() {
            None => return Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            Some(',') => {
                self.scanner.bump();
            }
            Some(c) if Some(c) == delimiter || starts_entry(c) => {}
            Some(_) => return Err(self.scanner.error(self.structure_kind().separator_error())),
        }
        self.replace(State::Members, delimiter);
        Ok(())
    }

    fn entry_start(&mut self, delimiter: Option<char>) -> Result<(), ParseError> {
        self.scanner.skip_ws();
        let occur = self.occurrence()?;
        self.scanner.skip_ws();

        // An identifier or text is a key if a colon follows it; otherwise it
        // is the start of the value.
        let mut key = None;
        let mut operand = None;
        match self.scanner.peek() {
            None => return Err(self.scanner.error(ErrorKind::UnexpectedEof)),
            Some(c) if is_ealpha(c) || c == '"' => {
                let rule = if c == '"' {
                    let text = self.scanner.scan_text()?;
                    self.scanner.skip_ws();
                    if self.scanner.eat(':') {
                        key = Some(text);
                        None
                    } else {
                        Some(Rule::Literal(Literal::Text(text)))
                    }
                } else {
                    let id = self.scanner.scan_id()?;
                    self.scanner.skip_ws();
                    if self.scanner.eat(':') {
                        key = Some(id);
                        None
                    } else {
                        Some(Rule::Reference(id))
                    }
                };
                operand = rule.map(|rule| self.arena.alloc(rule));
            }
            Some(_) => {}
        }

        self.entries.push(EntryBuilder { occur, key });
        self.replace(State::EntryEnd, delimiter);
        self.push_type(delimiter, operand);
        Ok(())
    }

    /// Parse an optional occurrence indicator.
    fn occurrence(&mut self) -> Result<Occur, ParseError> {
        let start = self.scanner.location();
        let occur = match self.scanner.peek() {
            Some('?') => {
                self.scanner.bump();
                self.expect_space()?;
                Occur::OPTIONAL
            }
            Some('+') => {
                self.scanner.bump();
                self.expect_space()?;
                Occur::ONE_OR_MORE
            }
            Some('*') => {
                self.scanner.bump();
                Occur {
                    min: 0,
                    max: self.occurrence_max()?,
                }
            }
            Some(c) if c.is_ascii_digit() && self.scanner.at_occurrence_min() => {
                let min = self.scanner.scan_uint()?;
                self.scanner.bump();
                Occur {
                    min,
                    max: self.occurrence_max()?,
                }
            }
            _ => return Ok(Occur::ONCE),
        };
        if occur.min > occur.max {
            return Err(parse_err::parse_error(ErrorKind::InvalidOccurrence, start));
        }
        trace!(occur = %occur.symbol(), "occurrence");
        Ok(occur)
    }

    fn expect_space(&self) -> Result<(), ParseError> {
        if self.scanner.at_space() || self.scanner.at_end() {
            Ok(())
        } else {
            Err(self.scanner.error(ErrorKind::ExpectedUintOrSpace))
        }
    }

    /// The optional count after `*`.
    fn occurrence_max(&mut self) -> Result<usize, ParseError> {
        match self.scanner.peek() {
            Some(c) if c.is_ascii_digit() => self.scanner.scan_uint(),
            _ => {
                self.expect_space()?;
                Ok(UNBOUNDED)
            }
        }
    }

    fn entry_end(&mut self) {
        let rule = self.take_value();
        self.states.pop();
        let entry = self.entries.pop().expect("entry builder for an open entry");
        let structure = self
            .structures
            .last_mut()
            .expect("structure builder for an open structure");
        structure.entries.push(GroupEntry {
            key: entry.key,
            occur: entry.occur,
            rule,
        });
    }

    fn finish(self) -> Specification {
        let Parser {
            mut arena, pending, ..
        } = self;
        let mut dictionary = RuleDictionary::with_prelude(&mut arena);
        let root_name = pending[0].name.clone();
        let root = pending[0]
            .rule
            .expect("the first definition is always bound");
        for definition in pending {
            if let Some(rule) = definition.rule {
                dictionary.insert(definition.name, rule);
            }
        }
        debug!(rules = arena.len(), root = %root_name, "compiled CDDL");
        Specification::new(arena, dictionary, root_name, root)
    }
}

/// Compile CDDL text into a [`Specification`].
///
/// The first rule defined in the text becomes the root rule.  Either the
/// whole text compiles, or the first error found is returned along with
/// its line and column.
pub fn parse_cddl(input: &str) -> Result<Specification, ParseError> {
    Parser::new(input).run()
}
