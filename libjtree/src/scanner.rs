//! Lexical scanner.
//!
//! A byte cursor that skips insignificant whitespace and recognizes token
//! boundaries. It never allocates and never looks behind the cursor.

use crate::error::{ErrorKind, ParseError};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Position within an input buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at `offset`. Offsets past the end are clamped.
    pub fn new(input: &'a [u8], offset: usize) -> Self {
        Self {
            input,
            offset: offset.min(input.len()),
        }
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.input.len());
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.offset).copied()
    }

    /// Consume and return the current byte.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.offset += 1;
        Some(b)
    }

    /// Consume `byte` if it is next.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.offset += 1;
            true
        } else {
            false
        }
    }

    /// Consume `literal` if the input continues with exactly those bytes.
    pub fn eat_literal(&mut self, literal: &[u8]) -> bool {
        if self.rest().starts_with(literal) {
            self.offset += literal.len();
            true
        } else {
            false
        }
    }

    /// Skip space, tab, line feed and carriage return.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !is_whitespace(b) {
                break;
            }
            self.offset += 1;
        }
    }

    /// Skip a UTF-8 byte order mark at the cursor.
    pub fn skip_bom(&mut self) {
        self.eat_literal(BOM);
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    /// Error at the cursor: end of input, or the offending character.
    pub fn unexpected(&self) -> ParseError {
        match self.peek() {
            None => ParseError::new(ErrorKind::UnexpectedEnd, self.offset),
            Some(_) => ParseError::new(ErrorKind::UnexpectedChar(self.current_char()), self.offset),
        }
    }

    /// Error of `kind` at the cursor, or `UnexpectedEnd` if the input is exhausted.
    pub fn expected(&self, kind: ErrorKind) -> ParseError {
        if self.at_end() {
            ParseError::new(ErrorKind::UnexpectedEnd, self.offset)
        } else {
            ParseError::new(kind, self.offset)
        }
    }

    /// The character starting at the cursor, or U+FFFD if the bytes are not UTF-8.
    fn current_char(&self) -> char {
        let rest = self.rest();
        let len = rest.len().min(4);
        (1..=len)
            .find_map(|n| std::str::from_utf8(&rest[..n]).ok())
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// JSON insignificant whitespace.
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
