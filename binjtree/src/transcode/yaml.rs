//! YAML transcoding: convert between node trees and YAML text.
//!
//! Mapping from YAML to nodes:
//!   - YAML null          -> null
//!   - YAML bool          -> true / false
//!   - YAML integer       -> number with an exact integer (u64 beyond i64 becomes a double)
//!   - YAML float         -> number
//!   - YAML string        -> string
//!   - YAML sequence      -> array
//!   - YAML mapping       -> object, keys in document order
//!   - YAML !!binary tag  -> string holding canonical base64
//!
//! Mapping from nodes to YAML:
//!   - null, bool, string -> the matching YAML scalar
//!   - number             -> YAML integer when it has an exact integer, else YAML float
//!   - array              -> YAML sequence
//!   - object             -> YAML mapping (a repeated key keeps its last value)
//!   - raw fragment       -> error

use base64::prelude::*;
use libjtree::{NodeId, Tree, Value};

use super::{attach, payload};

/// Decode a YAML document into a new tree, returning the root node.
pub fn decode(input: &str) -> Result<(Tree, NodeId), String> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(input).map_err(|e| format!("YAML parse error: {}", e))?;
    let mut tree = Tree::new();
    let root = yaml_to_node(&mut tree, &yaml)?;
    Ok((tree, root))
}

/// Encode the subtree at `id` as a YAML document.
pub fn encode(tree: &Tree, id: NodeId) -> Result<String, String> {
    let yaml = node_to_yaml(tree, id)?;
    serde_yaml::to_string(&yaml).map_err(|e| format!("YAML encode error: {}", e))
}

fn yaml_to_node(tree: &mut Tree, yaml: &serde_yaml::Value) -> Result<NodeId, String> {
    let id = match yaml {
        serde_yaml::Value::Null => tree.create_null(),
        serde_yaml::Value::Bool(b) => tree.create_bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                tree.create_int(i)
            } else if let Some(f) = n.as_f64() {
                tree.create_number(f)
            } else {
                return Err(format!("Unsupported YAML number: {:?}", n));
            }
        }
        serde_yaml::Value::String(s) => tree.create_string(s.as_str()),
        serde_yaml::Value::Sequence(seq) => {
            let array = tree.create_array();
            for item in seq {
                let child = yaml_to_node(tree, item)?;
                attach(tree, array, None, child)?;
            }
            array
        }
        serde_yaml::Value::Mapping(map) => {
            let object = tree.create_object();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    _ => return Err(format!("Unsupported YAML mapping key type: {:?}", k)),
                };
                let child = yaml_to_node(tree, v)?;
                attach(tree, object, Some(key), child)?;
            }
            object
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            match (tag.trim_start_matches('!'), &tagged.value) {
                ("binary", serde_yaml::Value::String(s)) => {
                    let clean: String = s.chars().filter(|c| !c.is_whitespace()).collect();
                    let bytes = BASE64_STANDARD
                        .decode(&clean)
                        .map_err(|e| format!("Invalid base64 in !!binary: {}", e))?;
                    tree.create_string(BASE64_STANDARD.encode(bytes))
                }
                // Unknown tags decode as their untagged content.
                _ => yaml_to_node(tree, &tagged.value)?,
            }
        }
    };
    Ok(id)
}

fn node_to_yaml(tree: &Tree, id: NodeId) -> Result<serde_yaml::Value, String> {
    let yaml = match payload(tree, id)? {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => serde_yaml::Value::Number(serde_yaml::Number::from(i)),
            None => serde_yaml::Value::Number(serde_yaml::Number::from(n.as_f64())),
        },
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::Array(_) => {
            let items: Result<Vec<serde_yaml::Value>, String> =
                tree.children(id).map(|child| node_to_yaml(tree, child)).collect();
            serde_yaml::Value::Sequence(items?)
        }
        Value::Object(_) => {
            let mut map = serde_yaml::Mapping::new();
            for child in tree.children(id) {
                let key = tree.key(child).unwrap_or_default().to_string();
                map.insert(serde_yaml::Value::String(key), node_to_yaml(tree, child)?);
            }
            serde_yaml::Value::Mapping(map)
        }
        Value::Raw(_) | Value::Invalid => return Err(format!("node {} cannot be written as YAML", id)),
    };
    Ok(yaml)
}
