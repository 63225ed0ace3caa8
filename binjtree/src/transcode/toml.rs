//! TOML transcoding: convert between node trees and TOML text.
//!
//! Mapping from TOML to nodes:
//!   - TOML string          -> string
//!   - TOML integer         -> number with an exact integer
//!   - TOML float           -> number
//!   - TOML boolean         -> true / false
//!   - TOML array           -> array
//!   - TOML table           -> object, keys in document order
//!   - TOML array of tables -> array of objects
//!   - TOML datetime        -> string (RFC 3339 text)
//!
//! Mapping from nodes to TOML:
//!   - null                 -> error (TOML has no null)
//!   - bool, string         -> the matching TOML value
//!   - number               -> TOML integer when it has an exact integer, else TOML float
//!   - array                -> TOML array, objects inside become inline tables
//!   - object               -> TOML table
//!   - raw fragment         -> error
//!
//! TOML requires the top-level value to be a table, so only objects encode.

use libjtree::{NodeId, Tree, Value};
use toml_edit::DocumentMut;

use super::{attach, payload};

/// Decode a TOML document into a new tree, returning the root object.
pub fn decode(input: &str) -> Result<(Tree, NodeId), String> {
    let doc: DocumentMut = input
        .parse::<DocumentMut>()
        .map_err(|e| format!("TOML parse error: {}", e))?;
    let mut tree = Tree::new();
    let root = table_to_node(&mut tree, doc.as_table())?;
    Ok((tree, root))
}

/// Encode the object at `id` as a TOML document.
pub fn encode(tree: &Tree, id: NodeId) -> Result<String, String> {
    if !tree.is_object(id) {
        return Err("TOML requires the top-level value to be a table/object".to_string());
    }
    let mut doc = DocumentMut::new();
    for child in tree.children(id) {
        let key = tree.key(child).unwrap_or_default();
        doc.insert(key, node_to_item(tree, child)?);
    }
    Ok(doc.to_string())
}

fn table_to_node(tree: &mut Tree, table: &toml_edit::Table) -> Result<NodeId, String> {
    let object = tree.create_object();
    for (key, item) in table.iter() {
        let child = item_to_node(tree, item)?;
        attach(tree, object, Some(key.to_string()), child)?;
    }
    Ok(object)
}

fn item_to_node(tree: &mut Tree, item: &toml_edit::Item) -> Result<NodeId, String> {
    match item {
        toml_edit::Item::Value(v) => value_to_node(tree, v),
        toml_edit::Item::Table(t) => table_to_node(tree, t),
        toml_edit::Item::ArrayOfTables(tables) => {
            let array = tree.create_array();
            for table in tables.iter() {
                let child = table_to_node(tree, table)?;
                attach(tree, array, None, child)?;
            }
            Ok(array)
        }
        toml_edit::Item::None => Ok(tree.create_null()),
    }
}

fn value_to_node(tree: &mut Tree, v: &toml_edit::Value) -> Result<NodeId, String> {
    let id = match v {
        toml_edit::Value::String(s) => tree.create_string(s.value().as_str()),
        toml_edit::Value::Integer(i) => tree.create_int(*i.value()),
        toml_edit::Value::Float(f) => tree.create_number(*f.value()),
        toml_edit::Value::Boolean(b) => tree.create_bool(*b.value()),
        toml_edit::Value::Datetime(dt) => tree.create_string(dt.value().to_string()),
        toml_edit::Value::Array(items) => {
            let array = tree.create_array();
            for item in items.iter() {
                let child = value_to_node(tree, item)?;
                attach(tree, array, None, child)?;
            }
            array
        }
        toml_edit::Value::InlineTable(table) => {
            let object = tree.create_object();
            for (key, item) in table.iter() {
                let child = value_to_node(tree, item)?;
                attach(tree, object, Some(key.to_string()), child)?;
            }
            object
        }
    };
    Ok(id)
}

fn node_to_item(tree: &Tree, id: NodeId) -> Result<toml_edit::Item, String> {
    if !tree.is_object(id) {
        return Ok(toml_edit::Item::Value(node_to_value(tree, id)?));
    }
    let mut table = toml_edit::Table::new();
    for child in tree.children(id) {
        let key = tree.key(child).unwrap_or_default();
        table.insert(key, node_to_item(tree, child)?);
    }
    Ok(toml_edit::Item::Table(table))
}

fn node_to_value(tree: &Tree, id: NodeId) -> Result<toml_edit::Value, String> {
    let value = match payload(tree, id)? {
        Value::Null => return Err("TOML has no null type".to_string()),
        Value::Bool(b) => toml_edit::Value::Boolean(toml_edit::Formatted::new(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => toml_edit::Value::Integer(toml_edit::Formatted::new(i)),
            None => toml_edit::Value::Float(toml_edit::Formatted::new(n.as_f64())),
        },
        Value::String(s) => toml_edit::Value::String(toml_edit::Formatted::new(s.clone())),
        Value::Array(_) => {
            let mut array = toml_edit::Array::new();
            for child in tree.children(id) {
                array.push(node_to_value(tree, child)?);
            }
            toml_edit::Value::Array(array)
        }
        Value::Object(_) => {
            let mut inline = toml_edit::InlineTable::new();
            for child in tree.children(id) {
                let key = tree.key(child).unwrap_or_default();
                inline.insert(key, node_to_value(tree, child)?);
            }
            toml_edit::Value::InlineTable(inline)
        }
        Value::Raw(_) | Value::Invalid => return Err(format!("node {} cannot be written as TOML", id)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libjtree::{encode as encode_json, Format};

    #[test]
    fn test_decode_tables_and_arrays() {
        let input = "title = \"x\"\n\n[owner]\nage = 42\n\n[[points]]\nx = 1.5\n\n[[points]]\nx = 2\n";
        let (tree, root) = decode(input).unwrap();
        assert_eq!(
            encode_json(&tree, root, Format::Compact).unwrap(),
            r#"{"title":"x","owner":{"age":42},"points":[{"x":1.5},{"x":2}]}"#
        );
    }

    #[test]
    fn test_encode_requires_object() {
        let (tree, root) = libjtree::parse(b"[1, 2]").unwrap();
        assert!(encode(&tree, root).is_err());
    }

    #[test]
    fn test_encode_rejects_null() {
        let (tree, root) = libjtree::parse(br#"{"a": {"b": null}}"#).unwrap();
        assert_eq!(encode(&tree, root), Err("TOML has no null type".to_string()));
    }

    #[test]
    fn test_encode_round_trips() {
        let (tree, root) = libjtree::parse(br#"{"n": 3, "f": 0.5, "list": [{"k": "v"}], "t": {"on": true}}"#).unwrap();
        let text = encode(&tree, root).unwrap();
        let (again, again_root) = decode(&text).unwrap();
        assert_eq!(
            encode_json(&again, again_root, Format::Compact).unwrap(),
            encode_json(&tree, root, Format::Compact).unwrap()
        );
    }
}
