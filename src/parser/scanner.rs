//! Character-level scanning of CDDL text.
//!
//! The [`Scanner`] owns the position in the input.  It knows how to skip
//! whitespace and comments, and how to read the few multi-character tokens
//! (identifiers, quoted text, numbers, unsigned counts).  It has no idea
//! which token is expected next; that is the job of the parser states.

use super::number::number_literal;
use super::parse_err::{parse_error, ErrorKind, Location, ParseError};
use crate::rule::Literal;
use tracing::trace;

/// Returns true for the characters that may start an identifier.
pub(crate) fn is_ealpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '@' || c == '_' || c == '$'
}

/// Returns true for the characters that may continue an identifier.
fn is_id_char(c: char) -> bool {
    is_ealpha(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

pub(crate) struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    pub(crate) fn new(input: &str) -> Scanner {
        Scanner {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// The position of the next unread character.
    pub(crate) fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> ParseError {
        parse_error(kind, self.location())
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    /// Look `n` characters past the next unread character.
    pub(crate) fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Consume one character, keeping the line and column up to date.
    ///
    /// A CR immediately followed by LF only counts as one line break.
    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' if self.peek() == Some('\n') => {}
            '\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
        Some(c)
    }

    /// Consume the next character if it is `c`.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and `;` comments.
    pub(crate) fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if is_space(c) {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' || (c == '\r' && self.peek() != Some('\n')) {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Returns true if the next character is whitespace or starts a comment.
    pub(crate) fn at_space(&self) -> bool {
        matches!(self.peek(), Some(c) if is_space(c) || c == ';')
    }

    /// Returns true if a run of digits is directly followed by `*`.
    ///
    /// This is how an occurrence minimum (`2*`) is told apart from a number.
    pub(crate) fn at_occurrence_min(&self) -> bool {
        let digits = self.chars[self.pos..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        digits > 0 && self.peek_at(digits) == Some('*')
    }

    /// Read an identifier.  The next character must be an `ealpha`.
    ///
    /// Identifiers may contain `-` and `.` but may not end with one.  A `.`
    /// followed by another `.` is a range operator, not part of the name.
    pub(crate) fn scan_id(&mut self) -> Result<String, ParseError> {
        let mut id = String::new();
        let mut last = self.location();
        while let Some(c) = self.peek() {
            if !is_id_char(c) || (c == '.' && self.peek_at(1) == Some('.')) {
                break;
            }
            last = self.location();
            id.push(c);
            self.bump();
        }
        if id.ends_with('-') || id.ends_with('.') {
            return Err(parse_error(ErrorKind::InvalidId, last));
        }
        trace!(%id, "identifier");
        Ok(id)
    }

    /// Read a quoted text value.  The next character must be `"`.
    pub(crate) fn scan_text(&mut self) -> Result<String, ParseError> {
        let start = self.location();
        self.bump();
        let mut raw = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(ErrorKind::UnexpectedEof)),
                Some('"') => break,
                Some('\\') => {
                    raw.push('\\');
                    match self.bump() {
                        Some(c) => raw.push(c),
                        None => return Err(self.error(ErrorKind::UnexpectedEof)),
                    }
                }
                Some(c) => raw.push(c),
            }
        }
        let text = escape8259::unescape(&raw)
            .map_err(|_| parse_error(ErrorKind::MalformedText, start))?;
        trace!(%text, "text");
        Ok(text)
    }

    /// Read a numeric literal.  The next character must be `-` or a digit.
    pub(crate) fn scan_number(&mut self) -> Result<Literal, ParseError> {
        let start = self.location();
        let mut token = String::new();
        if self.eat('-') {
            token.push('-');
        }
        match self.peek() {
            Some('0') => {
                token.push('0');
                self.bump();
                if self.peek() == Some('x') {
                    token.push('x');
                    self.bump();
                    if !self.take_digits(&mut token, |c| c.is_ascii_hexdigit()) {
                        return Err(self.error(ErrorKind::InvalidNumber));
                    }
                    return self.finish_number(token, start);
                }
            }
            Some(c) if c.is_ascii_digit() => {
                self.take_digits(&mut token, |c| c.is_ascii_digit());
            }
            _ => return Err(self.error(ErrorKind::InvalidNumber)),
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            token.push('.');
            self.bump();
            self.take_digits(&mut token, |c| c.is_ascii_digit());
        }
        if let Some(e) = self.peek().filter(|&c| c == 'e' || c == 'E') {
            token.push(e);
            self.bump();
            if let Some(sign) = self.peek().filter(|&c| c == '+' || c == '-') {
                token.push(sign);
                self.bump();
            }
            if !self.take_digits(&mut token, |c| c.is_ascii_digit()) {
                return Err(self.error(ErrorKind::InvalidNumber));
            }
        }
        self.finish_number(token, start)
    }

    fn finish_number(&mut self, token: String, start: Location) -> Result<Literal, ParseError> {
        // A number must not run straight into a name or more digits (`01`,
        // `3x`); a dot is only allowed as the start of a range operator.
        let trailing = match self.peek() {
            Some('.') => self.peek_at(1) != Some('.'),
            Some('-') => false,
            Some(c) => is_id_char(c),
            None => false,
        };
        if trailing {
            return Err(self.error(ErrorKind::InvalidNumber));
        }
        trace!(%token, "number");
        number_literal(&token).ok_or_else(|| parse_error(ErrorKind::InvalidNumber, start))
    }

    /// Read an unsigned count, as used in occurrences.
    pub(crate) fn scan_uint(&mut self) -> Result<usize, ParseError> {
        let start = self.location();
        let mut token = String::new();
        self.take_digits(&mut token, |c| c.is_ascii_digit());
        token
            .parse()
            .map_err(|_| parse_error(ErrorKind::InvalidNumber, start))
    }

    fn take_digits(&mut self, token: &mut String, accept: fn(char) -> bool) -> bool {
        let mut any = false;
        while let Some(c) = self.peek().filter(|&c| accept(c)) {
            token.push(c);
            self.bump();
            any = true;
        }
        any
    }
}
