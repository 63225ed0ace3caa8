//! CBOR transcoding: convert between node trees and CBOR binary data.
//!
//! Mapping from CBOR to nodes:
//!   - CBOR null                  -> null
//!   - CBOR bool                  -> true / false
//!   - CBOR unsigned/negative int -> number, exact when it fits in i64
//!   - CBOR float (16/32/64)      -> number
//!   - CBOR text string           -> string
//!   - CBOR byte string           -> string holding base64
//!   - CBOR array (det/indet)     -> array
//!   - CBOR map (det/indet)       -> object (text string keys only)
//!   - CBOR tag, undefined, other -> error
//!
//! Mapping from nodes to CBOR:
//!   - null, bool                 -> simple values 22, 20/21
//!   - number with exact integer  -> smallest CBOR integer encoding
//!   - other numbers              -> float64, never downgraded
//!   - string                     -> text string
//!   - array / object             -> determinate-length array / map
//!   - raw fragment               -> error

use std::fmt::Write as _;

use base64::prelude::*;
use ciborium::value::Value as CborValue;
use libjtree::{NodeId, Tree, Value};

use super::{attach, payload};

/// Decode CBOR bytes into a new tree, returning the root node.
pub fn decode(input: &[u8]) -> Result<(Tree, NodeId), String> {
    let cbor: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    let mut tree = Tree::new();
    let root = cbor_to_node(&mut tree, &cbor)?;
    Ok((tree, root))
}

fn cbor_to_node(tree: &mut Tree, cbor: &CborValue) -> Result<NodeId, String> {
    let id = match cbor {
        CborValue::Null => tree.create_null(),
        CborValue::Bool(b) => tree.create_bool(*b),
        CborValue::Integer(i) => {
            let n: i128 = (*i).into();
            match i64::try_from(n) {
                Ok(n) => tree.create_int(n),
                Err(_) => tree.create_number(n as f64),
            }
        }
        CborValue::Float(f) => tree.create_number(*f),
        CborValue::Text(s) => tree.create_string(s.as_str()),
        CborValue::Bytes(b) => tree.create_string(BASE64_STANDARD.encode(b)),
        CborValue::Array(items) => {
            let array = tree.create_array();
            for item in items {
                let child = cbor_to_node(tree, item)?;
                attach(tree, array, None, child)?;
            }
            array
        }
        CborValue::Map(pairs) => {
            let object = tree.create_object();
            for (k, v) in pairs {
                let key = match k {
                    CborValue::Text(s) => s.clone(),
                    _ => return Err(format!("CBOR map key must be a text string, got: {:?}", k)),
                };
                let child = cbor_to_node(tree, v)?;
                attach(tree, object, Some(key), child)?;
            }
            object
        }
        CborValue::Tag(tag, _) => {
            return Err(format!("CBOR tagged value (tag {}) has no JSON equivalent", tag))
        }
        _ => return Err(format!("CBOR value {:?} has no JSON equivalent", cbor)),
    };
    Ok(id)
}

// Encoding writes bytes directly: ciborium's serializer shrinks floats to
// half or single precision whenever the value survives the narrowing.

/// Encode the subtree at `id` as CBOR bytes.
pub fn encode(tree: &Tree, id: NodeId) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    write_node(&mut buf, tree, id)?;
    Ok(buf)
}

fn write_node(buf: &mut Vec<u8>, tree: &Tree, id: NodeId) -> Result<(), String> {
    match payload(tree, id)? {
        Value::Null => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => write_integer(buf, i),
            None => {
                buf.push(0xfb);
                buf.extend_from_slice(&n.as_f64().to_be_bytes());
            }
        },
        Value::String(s) => write_text(buf, s),
        Value::Array(_) => {
            write_head(buf, 4, tree.len(id) as u64);
            for child in tree.children(id) {
                write_node(buf, tree, child)?;
            }
        }
        Value::Object(_) => {
            write_head(buf, 5, tree.len(id) as u64);
            for child in tree.children(id) {
                write_text(buf, tree.key(child).unwrap_or_default());
                write_node(buf, tree, child)?;
            }
        }
        Value::Raw(_) | Value::Invalid => {
            return Err(format!("node {} cannot be written as CBOR", id))
        }
    }
    Ok(())
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_head(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Write a major type with its argument in the shortest form: inline for
/// 0..=23, otherwise a 1, 2, 4 or 8 byte big-endian follow-up.
fn write_head(buf: &mut Vec<u8>, major: u8, arg: u64) {
    let high = major << 5;
    match arg {
        0..=23 => buf.push(high | arg as u8),
        24..=0xff => {
            buf.push(high | 24);
            buf.push(arg as u8);
        }
        0x100..=0xffff => {
            buf.push(high | 25);
            buf.extend_from_slice(&(arg as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            buf.push(high | 26);
            buf.extend_from_slice(&(arg as u32).to_be_bytes());
        }
        _ => {
            buf.push(high | 27);
            buf.extend_from_slice(&arg.to_be_bytes());
        }
    }
}

/// Major 0 carries `n` itself; major 1 carries `-1 - n`.
fn write_integer(buf: &mut Vec<u8>, n: i64) {
    if n < 0 {
        write_head(buf, 1, (-1 - n) as u64);
    } else {
        write_head(buf, 0, n as u64);
    }
}

/// Render CBOR bytes as diagnostic notation (RFC 8949 section 8).
///
/// Works from the wire bytes rather than a tree, so tags and byte strings
/// show up exactly as encoded.
pub fn diagnostic(input: &[u8]) -> Result<String, String> {
    let cbor: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    let mut out = String::new();
    Diagnostic { out: &mut out }.value(&cbor, 0);
    out.push('\n');
    Ok(out)
}

struct Diagnostic<'a> {
    out: &'a mut String,
}

impl Diagnostic<'_> {
    fn value(&mut self, cbor: &CborValue, depth: usize) {
        match cbor {
            CborValue::Null => self.out.push_str("null"),
            CborValue::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            CborValue::Integer(i) => self.out.push_str(&i128::from(*i).to_string()),
            CborValue::Float(f) => self.float(*f),
            CborValue::Text(s) => self.text(s),
            CborValue::Bytes(b) => {
                self.out.push_str("h'");
                for byte in b {
                    let _ = write!(self.out, "{:02x}", byte);
                }
                self.out.push('\'');
            }
            CborValue::Array(items) => {
                let inline = items.len() <= 4 && items.iter().all(is_scalar);
                self.sequence(('[', ']'), items.len(), inline, depth, |d, i| {
                    d.value(&items[i], depth + 1)
                });
            }
            CborValue::Map(pairs) => {
                let inline = pairs.len() <= 2
                    && pairs.iter().all(|(k, v)| is_scalar(k) && is_scalar(v));
                self.sequence(('{', '}'), pairs.len(), inline, depth, |d, i| {
                    d.value(&pairs[i].0, depth + 1);
                    d.out.push_str(": ");
                    d.value(&pairs[i].1, depth + 1);
                });
            }
            CborValue::Tag(tag, inner) => {
                self.out.push_str(&tag.to_string());
                self.out.push('(');
                self.value(inner, depth);
                self.out.push(')');
            }
            _ => self.out.push_str("undefined"),
        }
    }

    /// Shared layout for arrays and maps: one line when `inline`, otherwise
    /// one entry per line indented two spaces per level.
    fn sequence(
        &mut self,
        (open, close): (char, char),
        len: usize,
        inline: bool,
        depth: usize,
        mut entry: impl FnMut(&mut Self, usize),
    ) {
        self.out.push(open);
        if len == 0 {
            self.out.push(close);
            return;
        }
        let indent = "  ".repeat(depth + 1);
        for i in 0..len {
            if inline {
                if i > 0 {
                    self.out.push_str(", ");
                }
            } else {
                self.out.push_str(if i > 0 { ",\n" } else { "\n" });
                self.out.push_str(&indent);
            }
            entry(self, i);
        }
        if !inline {
            self.out.push('\n');
            self.out.push_str(&"  ".repeat(depth));
        }
        self.out.push(close);
    }

    fn float(&mut self, f: f64) {
        if f.is_nan() {
            self.out.push_str("NaN");
        } else if f.is_infinite() {
            self.out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
        } else {
            // Debug formatting always keeps a fraction or exponent.
            let _ = write!(self.out, "{:?}", f);
        }
    }

    fn text(&mut self, s: &str) {
        self.out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(self.out, "\\u{:04x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

fn is_scalar(cbor: &CborValue) -> bool {
    !matches!(
        cbor,
        CborValue::Array(_) | CborValue::Map(_) | CborValue::Tag(..)
    )
}
