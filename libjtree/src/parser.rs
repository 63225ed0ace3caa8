//! Value parser.
//!
//! A recursive-descent parser that populates nodes of a [`Tree`] in place.
//! Each production either fully populates its destination node or resets it
//! to the type-unset state, releasing every node it allocated along the way.

use tracing::{debug, trace};

use crate::error::{ErrorKind, ParseError, Result};
use crate::node::{Children, NodeId, Value};
use crate::number::decode_number;
use crate::scanner::Cursor;
use crate::string::decode_string;
use crate::tree::Tree;

/// Containers may nest this deep by default.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Knobs for a parse.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Reject anything but whitespace after the document value.
    pub require_end: bool,
    /// Maximum number of nested arrays and objects.
    pub max_depth: usize,
    /// Skip a UTF-8 byte order mark at the start of the input.
    pub skip_bom: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            require_end: true,
            max_depth: DEFAULT_MAX_DEPTH,
            skip_bom: true,
        }
    }
}

/// Outcome of a document parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parsed {
    pub root: NodeId,
    /// Offset just past the consumed input.
    pub end: usize,
}

/// Parse a whole JSON document into a fresh tree.
pub fn parse(input: &[u8]) -> Result<(Tree, NodeId)> {
    let mut tree = Tree::new();
    let parsed = tree.parse(input)?;
    Ok((tree, parsed.root))
}

impl Tree {
    /// Parse a whole document into this tree with default options.
    pub fn parse(&mut self, input: &[u8]) -> Result<Parsed> {
        self.parse_with_options(input, &ParseOptions::default())
    }

    /// Parse a document into this tree, returning a new detached root.
    ///
    /// On failure nothing is left allocated.
    pub fn parse_with_options(&mut self, input: &[u8], options: &ParseOptions) -> Result<Parsed> {
        debug!(len = input.len(), "parsing document");
        let root = self.create_unset();
        let mut parser = Parser::new(self, input, options);
        if options.skip_bom {
            parser.cursor.skip_bom();
        }

        let result = parser.parse_value(root).and_then(|()| {
            if options.require_end {
                parser.cursor.skip_whitespace();
                if !parser.cursor.at_end() {
                    return Err(ParseError::new(ErrorKind::ExtraContent, parser.offset()));
                }
            }
            Ok(parser.offset())
        });

        match result {
            Ok(end) => {
                debug!(kind = ?self.kind(root), end, "parsed document");
                Ok(Parsed { root, end })
            }
            Err(e) => {
                debug!(error = %e, "parse failed");
                self.delete(root);
                Err(e)
            }
        }
    }
}

/// Low-level parser over one input buffer.
pub struct Parser<'t, 'a> {
    tree: &'t mut Tree,
    cursor: Cursor<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tree: &'t mut Tree, input: &'a [u8], options: &ParseOptions) -> Self {
        Self::at(tree, input, 0, options)
    }

    /// A parser whose cursor starts at `offset`.
    pub fn at(tree: &'t mut Tree, input: &'a [u8], offset: usize, options: &ParseOptions) -> Self {
        Self {
            tree,
            cursor: Cursor::new(input, offset),
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    /// Parse one value into `dest`, skipping leading whitespace.
    ///
    /// Whatever `dest` held before is released first. On failure `dest` is
    /// reset to [`Kind::Invalid`](crate::Kind::Invalid) with no children.
    pub fn parse_value(&mut self, dest: NodeId) -> Result<()> {
        self.prepare(dest)?;
        self.cursor.skip_whitespace();
        let result = self.dispatch(dest);
        if result.is_err() {
            self.tree.reset(dest);
        }
        result
    }

    fn dispatch(&mut self, dest: NodeId) -> Result<()> {
        let value = match self.cursor.peek() {
            Some(b'{') => return self.object(dest),
            Some(b'[') => return self.array(dest),
            Some(b'"') => Value::String(decode_string(&mut self.cursor)?),
            Some(b'-' | b'0'..=b'9') => Value::Number(decode_number(&mut self.cursor)?),
            Some(b'n') => self.literal(b"null", Value::Null)?,
            Some(b't') => self.literal(b"true", Value::Bool(true))?,
            Some(b'f') => self.literal(b"false", Value::Bool(false))?,
            _ => return Err(self.cursor.unexpected()),
        };
        self.tree.set_value(dest, value);
        Ok(())
    }

    fn literal(&mut self, word: &[u8], value: Value) -> Result<Value> {
        if self.cursor.eat_literal(word) {
            Ok(value)
        } else {
            Err(self.cursor.unexpected())
        }
    }

    /// Drop the previous contents of `dest`, which must still be live.
    fn prepare(&mut self, dest: NodeId) -> Result<()> {
        if !self.tree.contains(dest) {
            return Err(ParseError::new(ErrorKind::StaleDestination, self.offset()));
        }
        self.tree.reset(dest);
        Ok(())
    }

    /// Parse an object; the cursor must be on `{`.
    ///
    /// Like [`parse_value`](Self::parse_value), `dest` is cleared first and
    /// left type-unset on failure.
    pub fn parse_object(&mut self, dest: NodeId) -> Result<()> {
        self.prepare(dest)?;
        self.object(dest)
    }

    fn object(&mut self, dest: NodeId) -> Result<()> {
        self.enter(dest, Value::Object(Children::default()))?;
        let result = self.object_members(dest);
        self.leave(dest, result)
    }

    fn object_members(&mut self, dest: NodeId) -> Result<()> {
        self.cursor.skip_whitespace();
        if self.cursor.eat(b'}') {
            return Ok(());
        }

        loop {
            let key = decode_string(&mut self.cursor)?;
            self.cursor.skip_whitespace();
            if !self.cursor.eat(b':') {
                return Err(self.cursor.expected(ErrorKind::ExpectedColon));
            }

            let member = self.tree.create_unset();
            if let Err(e) = self.parse_value(member) {
                self.tree.delete(member);
                return Err(e);
            }
            self.tree.set_key_unchecked(member, key);
            self.tree.link_last(dest, member);

            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                Some(b',') => {
                    self.cursor.bump();
                    self.cursor.skip_whitespace();
                }
                Some(b'}') => {
                    self.cursor.bump();
                    return Ok(());
                }
                _ => return Err(self.cursor.expected(ErrorKind::ExpectedCommaOrBrace)),
            }
        }
    }

    /// Parse an array; the cursor must be on `[`.
    pub fn parse_array(&mut self, dest: NodeId) -> Result<()> {
        self.prepare(dest)?;
        self.array(dest)
    }

    fn array(&mut self, dest: NodeId) -> Result<()> {
        self.enter(dest, Value::Array(Children::default()))?;
        let result = self.array_elements(dest);
        self.leave(dest, result)
    }

    fn array_elements(&mut self, dest: NodeId) -> Result<()> {
        self.cursor.skip_whitespace();
        if self.cursor.eat(b']') {
            return Ok(());
        }

        loop {
            let element = self.tree.create_unset();
            if let Err(e) = self.parse_value(element) {
                self.tree.delete(element);
                return Err(e);
            }
            self.tree.link_last(dest, element);

            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                Some(b',') => {
                    self.cursor.bump();
                }
                Some(b']') => {
                    self.cursor.bump();
                    return Ok(());
                }
                _ => return Err(self.cursor.expected(ErrorKind::ExpectedCommaOrBracket)),
            }
        }
    }

    /// Consume the opening bracket and make `dest` an empty container.
    fn enter(&mut self, dest: NodeId, empty: Value) -> Result<()> {
        let open = match empty {
            Value::Object(_) => b'{',
            _ => b'[',
        };
        if self.cursor.peek() != Some(open) {
            return Err(self.cursor.unexpected());
        }
        if self.depth >= self.max_depth {
            return Err(ParseError::new(ErrorKind::NestingTooDeep, self.offset()));
        }
        self.cursor.bump();
        self.depth += 1;
        trace!(depth = self.depth, offset = self.offset(), "enter container");
        self.tree.set_value(dest, empty);
        Ok(())
    }

    fn leave(&mut self, dest: NodeId, result: Result<()>) -> Result<()> {
        trace!(depth = self.depth, offset = self.offset(), ok = result.is_ok(), "leave container");
        self.depth -= 1;
        if result.is_err() {
            self.tree.reset(dest);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, Format};
    use crate::node::Kind;

    fn parse_err(input: &str) -> ParseError {
        parse(input.as_bytes()).unwrap_err()
    }

    #[test]
    fn test_parse_scalars() {
        for (input, kind) in [
            ("null", Kind::Null),
            ("true", Kind::True),
            ("false", Kind::False),
            ("-1.5", Kind::Number),
            ("\"s\"", Kind::String),
        ] {
            let (tree, root) = parse(input.as_bytes()).unwrap();
            assert_eq!(tree.kind(root), kind, "{}", input);
            assert_eq!(tree.node_count(), 1);
        }
    }

    #[test]
    fn test_parse_nested() {
        let (tree, root) = parse(br#" { "a" : [1, {"b": null}], "c": "d" } "#).unwrap();
        assert!(tree.is_object(root));
        let a = tree.member(root, "a").unwrap();
        assert_eq!(tree.len(a), 2);
        let inner = tree.child_at(a, 1).unwrap();
        assert!(tree.is_null(tree.member(inner, "b").unwrap()));
        assert_eq!(tree.as_str(tree.member(root, "c").unwrap()), Some("d"));
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        assert_eq!(parse_err("True").kind, ErrorKind::UnexpectedChar('T'));
        assert_eq!(parse_err("nul").offset, 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_err(""), ParseError::new(ErrorKind::UnexpectedEnd, 0));
        assert_eq!(parse_err("  "), ParseError::new(ErrorKind::UnexpectedEnd, 2));
    }

    #[test]
    fn test_missing_colon() {
        assert_eq!(
            parse_err(r#"{"a" 1}"#),
            ParseError::new(ErrorKind::ExpectedColon, 5)
        );
    }

    #[test]
    fn test_trailing_comma_in_array() {
        let err = parse_err("[1,]");
        assert_eq!(err.offset, 3);
        assert_eq!(err.kind, ErrorKind::UnexpectedChar(']'));
    }

    #[test]
    fn test_trailing_comma_in_object() {
        assert_eq!(
            parse_err(r#"{"a":1,}"#),
            ParseError::new(ErrorKind::ExpectedKey, 7)
        );
    }

    #[test]
    fn test_bad_separator() {
        assert_eq!(
            parse_err("[1 2]"),
            ParseError::new(ErrorKind::ExpectedCommaOrBracket, 3)
        );
        assert_eq!(
            parse_err(r#"{"a":1 "b":2}"#),
            ParseError::new(ErrorKind::ExpectedCommaOrBrace, 7)
        );
        assert_eq!(
            parse_err("[1"),
            ParseError::new(ErrorKind::UnexpectedEnd, 2)
        );
    }

    #[test]
    fn test_extra_content() {
        assert_eq!(
            parse_err("{} x"),
            ParseError::new(ErrorKind::ExtraContent, 3)
        );
    }

    #[test]
    fn test_allow_trailing() {
        let mut tree = Tree::new();
        let options = ParseOptions {
            require_end: false,
            ..ParseOptions::default()
        };
        let parsed = tree.parse_with_options(b"[1] tail", &options).unwrap();
        assert_eq!(parsed.end, 3);
        assert!(tree.is_array(parsed.root));
    }

    #[test]
    fn test_failed_parse_releases_everything() {
        let mut tree = Tree::new();
        let keep = tree.create_string("keep");
        let err = tree
            .parse(br#"{"a": [1, 2, {"b": [true, false]}], "c": [1,]}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedChar(']'));
        assert_eq!(tree.node_count(), 1);
        assert!(tree.contains(keep));
    }

    #[test]
    fn test_max_depth() {
        let options = ParseOptions {
            max_depth: 3,
            ..ParseOptions::default()
        };
        let mut tree = Tree::new();
        tree.parse_with_options(b"[[[]]]", &options).unwrap();
        let err = tree.parse_with_options(b"[[[[]]]]", &options).unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::NestingTooDeep, 3));
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_default_depth_guards_stack() {
        let deep = "[".repeat(DEFAULT_MAX_DEPTH + 1);
        assert_eq!(parse_err(&deep).kind, ErrorKind::NestingTooDeep);
    }

    #[test]
    fn test_bom_skipped() {
        let (tree, root) = parse(b"\xEF\xBB\xBF{}").unwrap();
        assert!(tree.is_object(root));
    }

    #[test]
    fn test_parser_at_offset() {
        let mut tree = Tree::new();
        let dest = tree.create_unset();
        let input = b"xx [true] yy";
        let mut parser = Parser::at(&mut tree, input, 2, &ParseOptions::default());
        parser.parse_value(dest).unwrap();
        assert_eq!(parser.offset(), 9);
        assert_eq!(tree.len(dest), 1);
    }

    #[test]
    fn test_parse_value_failure_resets_dest() {
        let mut tree = Tree::new();
        let dest = tree.create_unset();
        let mut parser = Parser::new(&mut tree, b"[1, 2, x]", &ParseOptions::default());
        let err = parser.parse_value(dest).unwrap_err();
        assert_eq!(err.offset, 7);
        assert!(tree.is_invalid(dest));
        assert_eq!(tree.len(dest), 0);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_duplicate_keys_kept_in_order() {
        let (tree, root) = parse(br#"{"k": 1, "k": 2}"#).unwrap();
        let values: Vec<i64> = tree
            .children(root)
            .filter_map(|c| tree.as_i64(c))
            .collect();
        assert_eq!(values, [1, 2]);
        assert_eq!(tree.as_i64(tree.member(root, "k").unwrap()), Some(1));
    }

    #[test]
    fn test_failed_parse_into_reference_keeps_target() {
        let mut tree = Tree::new();
        let target = tree.create_int_array(&[1, 2]);
        let alias = tree.create_reference(target).unwrap();
        assert_eq!(tree.node_count(), 4);

        let err = Parser::new(&mut tree, b"x", &ParseOptions::default())
            .parse_value(alias)
            .unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::UnexpectedChar('x'), 0));
        assert!(tree.is_invalid(alias));
        assert!(!tree.node(alias).unwrap().is_reference());
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.len(target), 2);
        assert_eq!(encode(&tree, target, Format::Compact).unwrap(), "[1,2]");
    }

    #[test]
    fn test_parse_into_reference_replaces_alias() {
        let mut tree = Tree::new();
        let target = tree.create_string_array(&["a"]);
        let alias = tree.create_reference(target).unwrap();
        Parser::new(&mut tree, b"[true]", &ParseOptions::default())
            .parse_object(alias)
            .unwrap_err();
        Parser::new(&mut tree, b"[true]", &ParseOptions::default())
            .parse_value(alias)
            .unwrap();
        assert_eq!(encode(&tree, alias, Format::Compact).unwrap(), "[true]");
        assert_eq!(encode(&tree, target, Format::Compact).unwrap(), r#"["a"]"#);
        // No aliases remain, so deleting the target frees everything it owns.
        tree.delete(target);
        tree.delete(alias);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_parse_into_container_releases_old_children() {
        let mut tree = Tree::new();
        let dest = tree.create_int_array(&[1, 2, 3]);
        Parser::new(&mut tree, b"7", &ParseOptions::default())
            .parse_value(dest)
            .unwrap();
        assert_eq!(tree.as_i64(dest), Some(7));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_missing_bracket_clears_populated_dest() {
        let mut tree = Tree::new();
        let object = tree.parse(br#"{"a": [1]}"#).unwrap().root;
        let array = tree.create_int_array(&[4, 5]);

        let mut parser = Parser::new(&mut tree, b"42", &ParseOptions::default());
        assert_eq!(
            parser.parse_object(object),
            Err(ParseError::new(ErrorKind::UnexpectedChar('4'), 0))
        );
        assert_eq!(
            parser.parse_array(array),
            Err(ParseError::new(ErrorKind::UnexpectedChar('4'), 0))
        );
        assert!(tree.is_invalid(object));
        assert!(tree.is_invalid(array));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_stale_destination_is_an_error() {
        let mut tree = Tree::new();
        let dest = tree.create_unset();
        tree.delete(dest);
        let err = Parser::new(&mut tree, b"1", &ParseOptions::default())
            .parse_value(dest)
            .unwrap_err();
        assert_eq!(err, ParseError::new(ErrorKind::StaleDestination, 0));
        assert_eq!(tree.node_count(), 0);
    }
}
