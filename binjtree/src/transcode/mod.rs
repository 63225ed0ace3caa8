//! Conversions between node trees and other data formats.
//!
//! Every decoder builds a fresh [`Tree`] and every encoder walks one, so
//! object member order survives in both directions.

pub mod cbor;
pub mod toml;
pub mod yaml;

use libjtree::{NodeId, Tree, Value};

/// Payload of `id`, rejecting nodes that only make sense as JSON text.
pub(crate) fn payload(tree: &Tree, id: NodeId) -> Result<&Value, String> {
    match tree.value(id) {
        None | Some(Value::Invalid) => Err(format!("node {} has no value", id)),
        Some(Value::Raw(_)) => Err("raw JSON fragments can only be written as JSON".to_string()),
        Some(value) => Ok(value),
    }
}

/// Attach `child` to `parent`: as member `key` of an object, or as the next
/// array element when `key` is `None`.
pub(crate) fn attach(
    tree: &mut Tree,
    parent: NodeId,
    key: Option<String>,
    child: NodeId,
) -> Result<(), String> {
    let result = match key {
        Some(key) => tree.append_member(parent, key, child),
        None => tree.append(parent, child),
    };
    result.map_err(|e| e.to_string())
}
