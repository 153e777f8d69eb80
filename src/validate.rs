//! This module contains the streaming validator.
//!
//! Validation walks the compiled rules and the event stream together.  A
//! document is never assembled in memory: each event is examined once, as
//! the [`EventCursor`] presents it.
//!
//! Nested arrays, maps, and groups are tracked with an explicit stack of
//! frames rather than with recursive calls, so the nesting depth of a
//! document is bounded by [`ValidateOptions::max_nesting`] instead of by
//! the size of the call stack.
//!
//! # Matching rules
//!
//! - Array and group members are matched in order.  Each member is tried
//!   greedily, as many times as its occurrence allows, before moving on.
//!   There is no backtracking.
//! - An attempt that fails before consuming any event lets the matcher move
//!   on to the next member (if the current one has occurred often enough).
//!   An attempt that fails after consuming events fails the document.
//! - Array elements beyond the last member are skipped.
//! - Map keys that aren't in the schema are skipped, along with their values.

use crate::context::Context;
use crate::event::{Event, EventCursor};
use crate::rule::{GroupEntry, Literal, PrimitiveType, Range, Rule, RuleId};
use crate::util::{ValidateError, ValidateResult};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Limits that protect validation from runaway schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// The maximum number of structures (arrays, maps, and groups) that may
    /// be open at once.
    pub max_nesting: usize,
    /// The maximum number of references that may be followed without
    /// reaching a concrete rule.
    pub max_reference_chain: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            max_nesting: 4096,
            max_reference_chain: 64,
        }
    }
}

fn expected(primitive: PrimitiveType) -> ValidateError {
    match primitive {
        PrimitiveType::Tstr => ValidateError::ExpectedTstr,
        PrimitiveType::Uint => ValidateError::ExpectedUint,
        PrimitiveType::Int => ValidateError::ExpectedInt,
        PrimitiveType::Nint => ValidateError::ExpectedNint,
        PrimitiveType::Float => ValidateError::ExpectedFloat,
        PrimitiveType::Bool => ValidateError::ExpectedBool,
        PrimitiveType::Nil => ValidateError::ExpectedNil,
        PrimitiveType::Bstr => ValidateError::ExpectedBstr,
    }
}

fn check_literal(literal: &Literal, event: &Event) -> ValidateResult {
    if literal.matches(event) {
        Ok(())
    } else if literal.primitive().matches(event) {
        Err(ValidateError::ExpectedLiteral(literal.to_string()))
    } else {
        Err(expected(literal.primitive()))
    }
}

/// An event cursor that counts how many events have been consumed.
///
/// The count is how the matcher tells a failed attempt that consumed
/// nothing from one that did.
struct Walker<'c> {
    cursor: &'c mut dyn EventCursor,
    position: u64,
}

impl<'c> Walker<'c> {
    fn new(cursor: &'c mut dyn EventCursor) -> Walker<'c> {
        Walker {
            cursor,
            position: 0,
        }
    }

    fn current(&self) -> Option<&Event> {
        self.cursor.current()
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn advance(&mut self) -> ValidateResult {
        self.cursor.next()?;
        self.position += 1;
        Ok(())
    }

    /// Consume one complete value, including anything nested inside it.
    fn skip_value(&mut self) -> ValidateResult {
        let mut depth = 0usize;
        loop {
            let (opens, closes, stray_name, kind) = match self.current() {
                None => return Err(ValidateError::UnexpectedEnd),
                Some(event) => (
                    event.is_begin(),
                    event.is_end(),
                    matches!(event, Event::Name(_)),
                    event.kind(),
                ),
            };
            if closes {
                if depth == 0 {
                    return Err(ValidateError::UnexpectedEvent(kind));
                }
                depth -= 1;
            } else if opens {
                depth += 1;
            } else if stray_name && depth == 0 {
                return Err(ValidateError::UnexpectedEvent(kind));
            }
            self.advance()?;
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

/// Progress through the members of an array or group.
struct Sequence<'s> {
    entries: &'s [GroupEntry],
    index: usize,
    /// Occurrences of the current entry matched so far.
    count: usize,
    /// The cursor position when the current attempt began.
    attempt: u64,
}

impl<'s> Sequence<'s> {
    fn new(entries: &'s [GroupEntry]) -> Sequence<'s> {
        Sequence {
            entries,
            index: 0,
            count: 0,
            attempt: 0,
        }
    }

    fn next_entry(&mut self) {
        self.index += 1;
        self.count = 0;
    }

    /// Record a successful attempt.  A success that consumed nothing can't
    /// usefully repeat, so it moves on to the next entry.
    fn record(&mut self, consumed: bool) {
        if consumed {
            self.count += 1;
        } else {
            self.next_entry();
        }
    }

    /// Handle an attempt that failed without consuming anything.  Returns
    /// the error if the current entry hasn't occurred often enough.
    fn give_up(&mut self, error: ValidateError) -> Option<ValidateError> {
        match self.entries.get(self.index) {
            Some(entry) if self.count < entry.occur.min => Some(error),
            _ => {
                self.next_entry();
                None
            }
        }
    }

    /// The first entry, from the current one on, whose minimum isn't met.
    fn first_missing(&self) -> Option<&'s GroupEntry> {
        let entries = self.entries;
        let first = entries.get(self.index)?;
        if self.count < first.occur.min {
            return Some(first);
        }
        entries[self.index + 1..]
            .iter()
            .find(|entry| entry.occur.min > 0)
    }
}

/// One key of an open map.
struct Slot<'s> {
    key: &'s str,
    rule: RuleId,
    min: usize,
    max: usize,
    count: usize,
}

struct MapFrame<'s> {
    slots: Vec<Slot<'s>>,
    lookup: BTreeMap<&'s str, usize>,
}

/// A structure that is currently open.
enum Frame<'s> {
    Array(Sequence<'s>),
    Group(Sequence<'s>),
    Map(MapFrame<'s>),
}

impl Frame<'_> {
    fn name(&self) -> &'static str {
        match self {
            Frame::Array(_) => "array",
            Frame::Group(_) => "group",
            Frame::Map(_) => "map",
        }
    }
}

/// The result of starting to match one rule.
enum Step<'s> {
    /// The rule matched a complete value.
    Matched,
    /// The rule can't match here; nothing was consumed.
    Mismatch(ValidateError),
    /// The rule is a structure, which is now open.
    Enter(Frame<'s>),
}

enum Progress<'s> {
    Enter(Frame<'s>),
    Done(ValidateResult),
}

enum MapNext {
    End,
    Key(Option<usize>),
}

enum Boundary {
    Exhausted,
    End(bool),
    Value,
}

/// Validates event streams against compiled rules.
///
/// A `Validator` is cheap to create; it only holds a reference to the rules
/// and the options.  Each call to [`validate`](Self::validate) keeps its own
/// state, so one validator can be used for many documents.
#[derive(Clone, Copy)]
pub struct Validator<'s> {
    ctx: &'s dyn Context,
    options: ValidateOptions,
}

impl<'s> Validator<'s> {
    /// Create a validator with the default options.
    pub fn new(ctx: &'s dyn Context) -> Validator<'s> {
        Validator::with_options(ctx, ValidateOptions::default())
    }

    /// Create a validator with the given options.
    pub fn with_options(ctx: &'s dyn Context, options: ValidateOptions) -> Validator<'s> {
        Validator { ctx, options }
    }

    /// The options in use.
    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    /// Validate one complete value from `cursor` against a rule.
    ///
    /// The cursor must be exhausted once the value is complete.
    pub fn validate(&self, rule: &'s Rule, cursor: &mut dyn EventCursor) -> ValidateResult {
        let mut walker = Walker::new(cursor);
        let result = self.run(rule, &mut walker);
        if let Err(e) = &result {
            debug!(error = %e, position = walker.position(), "validation failed");
        }
        result
    }

    /// Validate against a rule given by id.
    pub fn validate_id(&self, id: RuleId, cursor: &mut dyn EventCursor) -> ValidateResult {
        let ctx = self.ctx;
        self.validate(ctx.rule(id)?, cursor)
    }

    fn run(&self, rule: &'s Rule, walker: &mut Walker<'_>) -> ValidateResult {
        if walker.current().is_none() {
            return Err(ValidateError::UnexpectedEnd);
        }
        let first = match self.begin_rule(rule, walker)? {
            Step::Matched => None,
            Step::Mismatch(e) => return Err(e),
            Step::Enter(frame) => Some(frame),
        };

        if let Some(frame) = first {
            trace!(frame = frame.name(), depth = 1, "enter");
            let mut frames = vec![frame];
            let mut delivered: Option<ValidateResult> = None;
            while let Some(mut frame) = frames.pop() {
                let progress = match &mut frame {
                    Frame::Array(seq) => self.step_sequence(seq, true, walker, delivered.take())?,
                    Frame::Group(seq) => self.step_sequence(seq, false, walker, delivered.take())?,
                    Frame::Map(map) => self.step_map(map, walker, delivered.take())?,
                };
                match progress {
                    Progress::Enter(child) => {
                        frames.push(frame);
                        if frames.len() >= self.options.max_nesting {
                            return Err(ValidateError::RecursionLimit);
                        }
                        trace!(frame = child.name(), depth = frames.len() + 1, "enter");
                        frames.push(child);
                    }
                    Progress::Done(result) => {
                        trace!(
                            frame = frame.name(),
                            depth = frames.len() + 1,
                            ok = result.is_ok(),
                            "leave"
                        );
                        delivered = Some(result);
                    }
                }
            }
            delivered.unwrap_or(Ok(()))?;
        }

        match walker.current() {
            None => Ok(()),
            Some(event) => Err(ValidateError::UnexpectedEvent(event.kind())),
        }
    }

    fn begin(&self, id: RuleId, walker: &mut Walker<'_>) -> Result<Step<'s>, ValidateError> {
        let ctx = self.ctx;
        self.begin_rule(ctx.rule(id)?, walker)
    }

    /// Start matching a rule against the current event.
    ///
    /// References and choices are resolved in a loop until a concrete rule
    /// is reached.
    fn begin_rule(
        &self,
        rule: &'s Rule,
        walker: &mut Walker<'_>,
    ) -> Result<Step<'s>, ValidateError> {
        let ctx = self.ctx;
        let mut rule = rule;
        let mut chain = 0;
        loop {
            let next = match rule {
                Rule::Reference(name) => ctx.lookup_rule(name)?,
                Rule::Choice(alternatives) => {
                    let event = match walker.current() {
                        Some(event) => event,
                        None => return Ok(Step::Mismatch(ValidateError::UnexpectedEnd)),
                    };
                    let mut chosen = None;
                    for alternative in alternatives {
                        if self.admits(alternative.rule, event, 0)? {
                            chosen = Some(alternative.rule);
                            break;
                        }
                    }
                    match chosen {
                        Some(id) => id,
                        None => {
                            return Ok(Step::Mismatch(ValidateError::NoMatchingChoice(
                                alternatives.len(),
                            )))
                        }
                    }
                }
                Rule::Group(entries) => {
                    return Ok(Step::Enter(Frame::Group(Sequence::new(entries))))
                }
                _ => return self.begin_value(rule, walker),
            };
            chain += 1;
            if chain > self.options.max_reference_chain {
                return Err(ValidateError::RecursionLimit);
            }
            rule = ctx.rule(next)?;
        }
    }

    /// Start matching a rule that consumes at least one event.
    fn begin_value(
        &self,
        rule: &'s Rule,
        walker: &mut Walker<'_>,
    ) -> Result<Step<'s>, ValidateError> {
        let verdict = match walker.current() {
            None => Err(ValidateError::UnexpectedEnd),
            Some(event) => match rule {
                Rule::Primitive(p) if p.matches(event) => Ok(()),
                Rule::Primitive(p) => Err(expected(*p)),
                Rule::Literal(literal) => check_literal(literal, event),
                Rule::Range(range) => self.range_verdict(range, event)?,
                Rule::Array(_) if *event == Event::BeginArray => Ok(()),
                Rule::Array(_) => Err(ValidateError::ExpectedArray),
                Rule::Map(_) if *event == Event::BeginObject => Ok(()),
                Rule::Map(_) => Err(ValidateError::ExpectedMap),
                Rule::Unconstrained if rule.matches(event) => Ok(()),
                Rule::Unconstrained => Err(ValidateError::ExpectedValue),
                Rule::Reference(_) | Rule::Group(_) | Rule::Choice(_) => {
                    unreachable!("begin_value called with an unresolved rule")
                }
            },
        };
        if let Err(e) = verdict {
            return Ok(Step::Mismatch(e));
        }
        match rule {
            Rule::Array(entries) => {
                walker.advance()?;
                Ok(Step::Enter(Frame::Array(Sequence::new(entries))))
            }
            Rule::Map(entries) => {
                let map = self.build_map(entries)?;
                walker.advance()?;
                Ok(Step::Enter(Frame::Map(map)))
            }
            Rule::Unconstrained => {
                walker.skip_value()?;
                Ok(Step::Matched)
            }
            _ => {
                walker.advance()?;
                Ok(Step::Matched)
            }
        }
    }

    /// A non-consuming check of whether a rule could accept a value
    /// starting with `event`.
    fn admits(&self, id: RuleId, event: &Event, depth: usize) -> Result<bool, ValidateError> {
        if depth > self.options.max_reference_chain {
            return Err(ValidateError::RecursionLimit);
        }
        let ctx = self.ctx;
        let admitted = match ctx.rule(id)? {
            Rule::Reference(name) => self.admits(ctx.lookup_rule(name)?, event, depth + 1)?,
            Rule::Choice(alternatives) => {
                for alternative in alternatives {
                    if self.admits(alternative.rule, event, depth + 1)? {
                        return Ok(true);
                    }
                }
                false
            }
            Rule::Group(entries) => {
                for entry in entries {
                    if self.admits(entry.rule, event, depth + 1)? {
                        return Ok(true);
                    }
                    if entry.occur.min > 0 {
                        return Ok(false);
                    }
                }
                true
            }
            Rule::Range(range) => self.range_verdict(range, event)?.is_ok(),
            other => other.matches(event),
        };
        Ok(admitted)
    }

    /// Follow references from `id` until something other than a reference
    /// is found.
    fn resolve(&self, id: RuleId) -> Result<&'s Rule, ValidateError> {
        let ctx = self.ctx;
        let mut rule = ctx.rule(id)?;
        let mut chain = 0;
        while let Rule::Reference(name) = rule {
            chain += 1;
            if chain > self.options.max_reference_chain {
                return Err(ValidateError::RecursionLimit);
            }
            rule = ctx.rule(ctx.lookup_rule(name)?)?;
        }
        Ok(rule)
    }

    /// Check a value against a range.  The outer error means the range
    /// itself is malformed.
    fn range_verdict(&self, range: &Range, event: &Event) -> Result<ValidateResult, ValidateError> {
        let start = self.resolve(range.start)?;
        let end = self.resolve(range.end)?;
        let op = if range.inclusive { ".." } else { "..." };
        let out_of_range = || {
            ValidateError::OutOfRange(format!("{}{}{}", start.describe(), op, end.describe()))
        };

        let verdict = match (start, end) {
            (Rule::Literal(Literal::Int(lo)), Rule::Literal(Literal::Int(hi))) => {
                match event.as_integer() {
                    None => Err(ValidateError::ExpectedInt),
                    Some(v) if v >= *lo && (v < *hi || (range.inclusive && v == *hi)) => Ok(()),
                    Some(_) => Err(out_of_range()),
                }
            }
            (Rule::Literal(Literal::Float(lo)), Rule::Literal(Literal::Float(hi))) => match event {
                Event::Double(v) if *v >= *lo && (*v < *hi || (range.inclusive && *v == *hi)) => {
                    Ok(())
                }
                Event::Double(_) => Err(out_of_range()),
                _ => Err(ValidateError::ExpectedFloat),
            },
            _ => {
                return Err(ValidateError::Structural(format!(
                    "range endpoints must be two integers or two floats: {}{}{}",
                    start.describe(),
                    op,
                    end.describe()
                )))
            }
        };
        Ok(verdict)
    }

    /// Build the key lookup for a map, inlining keyless group members.
    fn build_map(&self, entries: &'s [GroupEntry]) -> Result<MapFrame<'s>, ValidateError> {
        let mut map = MapFrame {
            slots: Vec::new(),
            lookup: BTreeMap::new(),
        };
        let mut work: Vec<(&'s GroupEntry, bool)> =
            entries.iter().rev().map(|e| (e, false)).collect();
        let mut inlined = 0;
        while let Some((entry, optional)) = work.pop() {
            match &entry.key {
                Some(key) => {
                    if map.lookup.insert(key.as_str(), map.slots.len()).is_some() {
                        return Err(ValidateError::DuplicateKey(key.clone()));
                    }
                    map.slots.push(Slot {
                        key,
                        rule: entry.rule,
                        min: if optional { 0 } else { entry.occur.min },
                        max: entry.occur.max,
                        count: 0,
                    });
                }
                None => {
                    let members = match self.resolve(entry.rule)? {
                        Rule::Group(members) => members,
                        other => {
                            return Err(ValidateError::Structural(format!(
                                "map member without a key: {}",
                                other.describe()
                            )))
                        }
                    };
                    inlined += 1;
                    if inlined > self.options.max_nesting {
                        return Err(ValidateError::RecursionLimit);
                    }
                    let optional = optional || entry.occur.min == 0;
                    work.extend(members.iter().rev().map(|e| (e, optional)));
                }
            }
        }
        Ok(map)
    }

    fn entry_name(&self, entry: &GroupEntry) -> String {
        match &entry.key {
            Some(key) => key.clone(),
            None => self
                .ctx
                .rule(entry.rule)
                .map(Rule::describe)
                .unwrap_or_default(),
        }
    }

    fn step_sequence(
        &self,
        seq: &mut Sequence<'s>,
        array: bool,
        walker: &mut Walker<'_>,
        delivered: Option<ValidateResult>,
    ) -> Result<Progress<'s>, ValidateError> {
        if let Some(result) = delivered {
            let consumed = walker.position() != seq.attempt;
            match result {
                Ok(()) => seq.record(consumed),
                Err(e) if consumed => return Ok(Progress::Done(Err(e))),
                Err(e) => {
                    if let Some(e) = seq.give_up(e) {
                        return Ok(Progress::Done(Err(e)));
                    }
                }
            }
        }

        let entries = seq.entries;
        loop {
            let entry = match entries.get(seq.index) {
                Some(entry) => entry,
                None if array => return self.skip_rest_of_array(walker).map(Progress::Done),
                None => return Ok(Progress::Done(Ok(()))),
            };
            if seq.count >= entry.occur.max {
                seq.next_entry();
                continue;
            }

            let boundary = match walker.current() {
                None => Boundary::Exhausted,
                Some(event) if event.is_end() => Boundary::End(*event == Event::EndArray),
                Some(_) => Boundary::Value,
            };
            match boundary {
                Boundary::Exhausted if array => {
                    return Ok(Progress::Done(Err(ValidateError::UnexpectedEnd)))
                }
                Boundary::Exhausted | Boundary::End(_) => {
                    if let Some(missing) = seq.first_missing() {
                        let name = self.entry_name(missing);
                        return Ok(Progress::Done(Err(ValidateError::MissingEntry(name))));
                    }
                    if !array {
                        // The end event belongs to the enclosing structure.
                        return Ok(Progress::Done(Ok(())));
                    }
                    if let Boundary::End(false) = boundary {
                        let err = ValidateError::UnexpectedEvent("end_object");
                        return Ok(Progress::Done(Err(err)));
                    }
                    walker.advance()?;
                    return Ok(Progress::Done(Ok(())));
                }
                Boundary::Value => {
                    seq.attempt = walker.position();
                    match self.begin(entry.rule, walker)? {
                        Step::Matched => seq.record(true),
                        Step::Mismatch(e) => {
                            if let Some(e) = seq.give_up(e) {
                                return Ok(Progress::Done(Err(e)));
                            }
                        }
                        Step::Enter(child) => return Ok(Progress::Enter(child)),
                    }
                }
            }
        }
    }

    /// Skip array elements that follow the last member, and the array's end.
    fn skip_rest_of_array(&self, walker: &mut Walker<'_>) -> Result<ValidateResult, ValidateError> {
        loop {
            match walker.current() {
                None => return Ok(Err(ValidateError::UnexpectedEnd)),
                Some(Event::EndArray) => {
                    walker.advance()?;
                    return Ok(Ok(()));
                }
                Some(_) => walker.skip_value()?,
            }
        }
    }

    fn step_map(
        &self,
        map: &mut MapFrame<'s>,
        walker: &mut Walker<'_>,
        delivered: Option<ValidateResult>,
    ) -> Result<Progress<'s>, ValidateError> {
        if let Some(Err(e)) = delivered {
            return Ok(Progress::Done(Err(e)));
        }
        loop {
            let next = match walker.current() {
                None => return Ok(Progress::Done(Err(ValidateError::UnexpectedEnd))),
                Some(Event::EndObject) => MapNext::End,
                Some(Event::Name(key)) => MapNext::Key(map.lookup.get(key.as_str()).copied()),
                Some(other) => {
                    let err = ValidateError::UnexpectedEvent(other.kind());
                    return Ok(Progress::Done(Err(err)));
                }
            };
            match next {
                MapNext::End => {
                    if let Some(slot) = map.slots.iter().find(|slot| slot.count < slot.min) {
                        let err = ValidateError::MissingEntry(slot.key.into());
                        return Ok(Progress::Done(Err(err)));
                    }
                    walker.advance()?;
                    return Ok(Progress::Done(Ok(())));
                }
                MapNext::Key(None) => {
                    walker.advance()?;
                    walker.skip_value()?;
                }
                MapNext::Key(Some(index)) => {
                    walker.advance()?;
                    let slot = &mut map.slots[index];
                    slot.count += 1;
                    if slot.count > slot.max {
                        let err = ValidateError::TooManyOccurrences(slot.key.into());
                        return Ok(Progress::Done(Err(err)));
                    }
                    let rule = slot.rule;
                    match self.begin(rule, walker)? {
                        Step::Matched => {}
                        Step::Mismatch(e) => return Ok(Progress::Done(Err(e))),
                        Step::Enter(child) => return Ok(Progress::Enter(child)),
                    }
                }
            }
        }
    }
}

impl Rule {
    /// Validate one complete value from `cursor` against this rule, using
    /// `ctx` to resolve references.
    pub fn validate(&self, ctx: &dyn Context, cursor: &mut dyn EventCursor) -> ValidateResult {
        Validator::new(ctx).validate(self, cursor)
    }
}
