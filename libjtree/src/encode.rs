//! Serialize a node tree back to JSON text.
//!
//! Output round-trips: parsing the encoded text yields a tree that compares
//! equal to the source tree.

use thiserror::Error;

use crate::node::{NodeId, Number, Value};
use crate::tree::Tree;

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Tab-indented objects, one member per line; arrays on one line.
    #[default]
    Pretty,
    /// No insignificant whitespace.
    Compact,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The node is type-unset, released, or a dangling reference.
    #[error("Node {0} has no value to encode")]
    InvalidNode(NodeId),
}

/// Encode the subtree rooted at `id`.
pub fn encode(tree: &Tree, id: NodeId, format: Format) -> Result<String, EncodeError> {
    let mut out = String::new();
    Encoder { tree, format }.value(&mut out, id, 0)?;
    Ok(out)
}

struct Encoder<'t> {
    tree: &'t Tree,
    format: Format,
}

impl Encoder<'_> {
    fn value(&self, out: &mut String, id: NodeId, depth: usize) -> Result<(), EncodeError> {
        match self.tree.value(id) {
            None | Some(Value::Invalid) => return Err(EncodeError::InvalidNode(id)),
            Some(Value::Null) => out.push_str("null"),
            Some(Value::Bool(true)) => out.push_str("true"),
            Some(Value::Bool(false)) => out.push_str("false"),
            Some(Value::Number(n)) => out.push_str(&encode_number(n)),
            Some(Value::String(s)) => encode_string(out, s),
            Some(Value::Raw(json)) => out.push_str(json),
            Some(Value::Array(_)) => self.array(out, id, depth)?,
            Some(Value::Object(_)) => self.object(out, id, depth)?,
        }
        Ok(())
    }

    fn array(&self, out: &mut String, id: NodeId, depth: usize) -> Result<(), EncodeError> {
        out.push('[');
        for (i, child) in self.tree.children(id).enumerate() {
            if i > 0 {
                out.push_str(match self.format {
                    Format::Pretty => ", ",
                    Format::Compact => ",",
                });
            }
            self.value(out, child, depth + 1)?;
        }
        out.push(']');
        Ok(())
    }

    fn object(&self, out: &mut String, id: NodeId, depth: usize) -> Result<(), EncodeError> {
        if self.tree.len(id) == 0 {
            out.push_str("{}");
            return Ok(());
        }
        let pretty = self.format == Format::Pretty;
        out.push('{');
        for (i, child) in self.tree.children(id).enumerate() {
            if i > 0 {
                out.push(',');
            }
            if pretty {
                out.push('\n');
                push_tabs(out, depth + 1);
            }
            encode_string(out, self.tree.key(child).unwrap_or_default());
            out.push(':');
            if pretty {
                out.push('\t');
            }
            self.value(out, child, depth + 1)?;
        }
        if pretty {
            out.push('\n');
            push_tabs(out, depth);
        }
        out.push('}');
        Ok(())
    }
}

fn push_tabs(out: &mut String, n: usize) {
    out.extend(std::iter::repeat('\t').take(n));
}

/// Exact integers print as such; other values use the shortest text that
/// reads back to the same double. JSON has no NaN or infinity.
fn encode_number(n: &Number) -> String {
    if let Some(int) = n.as_i64() {
        return int.to_string();
    }
    let f = n.as_f64();
    if f.is_finite() {
        format!("{:?}", f)
    } else if f.is_nan() {
        "null".to_string()
    } else if f > 0.0 {
        // Overflows back to infinity when parsed.
        "1e999".to_string()
    } else {
        "-1e999".to_string()
    }
}

fn encode_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
