//! Error types for JSON parsing and tree manipulation.

use crate::node::NodeId;
use thiserror::Error;

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Result type for tree mutation and navigation.
pub type TreeResult<T> = std::result::Result<T, TreeError>;

/// What went wrong during a parse.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input ended where a value or delimiter was required.
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// A byte that cannot start any JSON value.
    #[error("Unexpected character {0:?}")]
    UnexpectedChar(char),

    /// An object member did not start with a quoted key.
    #[error("Expected string key")]
    ExpectedKey,

    /// Missing ':' after an object key.
    #[error("Expected colon after key")]
    ExpectedColon,

    /// Missing ',' or '}' after an object member.
    #[error("Expected ',' or '}}'")]
    ExpectedCommaOrBrace,

    /// Missing ',' or ']' after an array element.
    #[error("Expected ',' or ']'")]
    ExpectedCommaOrBracket,

    /// Input ended inside a string literal.
    #[error("Unterminated string")]
    UnterminatedString,

    /// Unescaped control character inside a string literal.
    #[error("Bad character in string")]
    BadCharInString,

    /// Unknown backslash escape.
    #[error("Bad escaped character")]
    BadEscapedChar,

    /// `\u` not followed by four hex digits.
    #[error("Bad Unicode escape")]
    BadUnicodeEscape,

    /// Unpaired or misordered UTF-16 surrogate escape.
    #[error("Illegal surrogate")]
    IllegalSurrogate,

    /// String bytes are not valid UTF-8.
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,

    /// Malformed number literal.
    #[error("Invalid number")]
    InvalidNumber,

    /// Containers nested deeper than the configured limit.
    #[error("Nesting too deep")]
    NestingTooDeep,

    /// Non-whitespace content after the document value.
    #[error("Unexpected extra content")]
    ExtraContent,

    /// The destination node was released before the parse started.
    #[error("Destination node no longer exists")]
    StaleDestination,
}

/// A parse failure and the byte offset where it was detected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl ParseError {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Byte offset of the offending input.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Map the offset to a line and column within `input`.
    pub fn location(&self, input: &[u8]) -> Location {
        Location::locate(input, self.offset)
    }

    /// Format the error with a line/column suffix for diagnostics.
    pub fn describe(&self, input: &[u8], ctx: &ParseContext) -> String {
        let loc = self.location(input);
        format!("{}{}", self.kind, ctx.loc_suffix(loc.line, loc.column))
    }
}

/// One-based line and column of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Columns count UTF-8 characters, not bytes.
    pub fn locate(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        // Count lead bytes only so multibyte characters take one column.
        let column = before[line_start..]
            .iter()
            .filter(|&&b| (b & 0xC0) != 0x80)
            .count()
            + 1;
        Self { line, column }
    }
}

/// Parse context carrying a filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, line: usize, column: usize) -> String {
        match &self.filename {
            Some(name) => format!(" at {}:{} of <{}>", line, column, name),
            None => format!(" at {}:{}", line, column),
        }
    }
}

/// Error type for tree navigation and mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The id refers to a released node.
    #[error("Node {0} has been released")]
    StaleNode(NodeId),

    /// Children can only be attached to arrays and objects.
    #[error("Node {0} is not an array or object")]
    NotAContainer(NodeId),

    /// A keyed operation was applied to something other than an object.
    #[error("Node {0} is not an object")]
    NotAnObject(NodeId),

    /// A string setter was applied to a non-string node.
    #[error("Node {0} is not a string")]
    NotAString(NodeId),

    /// A number setter was applied to a non-number node.
    #[error("Node {0} is not a number")]
    NotANumber(NodeId),

    /// The node already has a parent; detach it first.
    #[error("Node {0} is already attached")]
    AlreadyAttached(NodeId),

    /// Object members must carry a key.
    #[error("Node {0} has no key and cannot join an object")]
    MissingKey(NodeId),

    /// The operation needs a node with a parent.
    #[error("Node {0} is not attached")]
    NotAttached(NodeId),

    /// Attaching would make a node its own descendant.
    #[error("Attaching node {0} would create a cycle")]
    WouldCycle(NodeId),

    /// No child at the requested position.
    #[error("Index {index} out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    /// No member with the requested key.
    #[error("No member named {0:?}")]
    KeyNotFound(String),

    /// References alias another node's payload and cannot be changed through.
    #[error("Node {0} is a reference and cannot be modified")]
    ReferenceImmutable(NodeId),
}
