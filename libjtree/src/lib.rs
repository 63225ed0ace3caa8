//! JSON parser and mutable node tree.
//!
//! Parsing produces a [`Tree`]: an arena of nodes linked as siblings under
//! their parent, with object members carrying their key. The tree can be
//! navigated, edited, duplicated and compared, then encoded back to JSON.
//!
//! # Parsing Pipeline
//!
//! 1. **Scanner**: A byte cursor that skips whitespace and recognizes token
//!    boundaries.
//!
//! 2. **Decoders**: String literals (escapes, surrogate pairs, UTF-8
//!    validation) and number literals (strict grammar, exact `i64` shadow).
//!
//! 3. **Value Parser**: Recursive descent that populates nodes in place and
//!    releases everything it built when a production fails.
//!
//! # Example
//!
//! ```
//! use libjtree::{encode, parse, Format};
//!
//! let (mut tree, root) = parse(b"{ \"a\" : [1, 2] }").unwrap();
//! let a = tree.member(root, "a").unwrap();
//! let three = tree.create_int(3);
//! tree.append(a, three).unwrap();
//! assert_eq!(encode(&tree, root, Format::Compact).unwrap(), r#"{"a":[1,2,3]}"#);
//! ```

mod encode;
mod error;
mod node;
mod number;
mod parser;
mod scanner;
mod string;
mod tree;

pub use encode::{encode, EncodeError, Format};
pub use error::{ErrorKind, Location, ParseContext, ParseError, Result, TreeError, TreeResult};
pub use node::{Children, Kind, Node, NodeId, Number, Value};
pub use parser::{parse, ParseOptions, Parsed, Parser, DEFAULT_MAX_DEPTH};
pub use scanner::is_whitespace;
pub use tree::{ChildIter, Tree};

