//! Node representation.
//!
//! Nodes live inside a [`Tree`](crate::Tree) arena and are addressed by
//! [`NodeId`]. Siblings form a doubly-linked list through `prev`/`next`;
//! containers record their first and last child in [`Children`].

use std::borrow::Cow;
use std::fmt;

/// Stable handle to a node in a [`Tree`](crate::Tree).
///
/// The generation distinguishes a live node from an earlier occupant of the
/// same slot, so a handle to a released node never aliases a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Type tag of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Allocated but not yet populated, or a dangling reference.
    Invalid,
    Null,
    False,
    True,
    Number,
    String,
    /// Pre-rendered JSON text emitted verbatim by the encoder.
    Raw,
    Array,
    Object,
}

impl Kind {
    /// Returns `true` for arrays and objects.
    pub fn is_container(self) -> bool {
        matches!(self, Kind::Array | Kind::Object)
    }
}

/// A JSON number: the double value plus an exact integer when the literal
/// was an integer in `i64` range.
#[derive(Clone, Copy, Debug)]
pub struct Number {
    value: f64,
    int: Option<i64>,
}

impl Number {
    pub fn from_f64(value: f64) -> Self {
        Self { value, int: None }
    }

    pub fn from_i64(n: i64) -> Self {
        Self {
            value: n as f64,
            int: Some(n),
        }
    }

    pub(crate) fn with_int(value: f64, int: Option<i64>) -> Self {
        Self { value, int }
    }

    pub fn as_f64(&self) -> f64 {
        self.value
    }

    /// The exact integer, if the number was created from one.
    pub fn as_i64(&self) -> Option<i64> {
        self.int
    }

    /// Integer view of any number: the exact integer if there is one,
    /// otherwise the double truncated and clamped to the `i64` range.
    /// NaN maps to zero.
    pub fn saturating_int(&self) -> i64 {
        match self.int {
            Some(n) => n,
            // `as` saturates and maps NaN to 0.
            None => self.value as i64,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.int, other.int) {
            (Some(a), Some(b)) => a == b,
            _ => self.value == other.value,
        }
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::from_i64(n)
    }
}

/// First and last child of a container plus the child count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Children {
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) len: usize,
}

impl Children {
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    pub fn last(&self) -> Option<NodeId> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Payload of an owned node.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Freshly allocated; no type yet.
    Invalid,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Raw(String),
    Array(Children),
    Object(Children),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Invalid => Kind::Invalid,
            Value::Null => Kind::Null,
            Value::Bool(false) => Kind::False,
            Value::Bool(true) => Kind::True,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Raw(_) => Kind::Raw,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub(crate) fn children(&self) -> Option<&Children> {
        match self {
            Value::Array(c) | Value::Object(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match self {
            Value::Array(c) | Value::Object(c) => Some(c),
            _ => None,
        }
    }
}

/// Whether a node owns its payload or aliases another node's.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Payload {
    Owned(Value),
    Reference(NodeId),
}

/// A single node of the tree.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) payload: Payload,
    pub(crate) key: Option<Cow<'static, str>>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            payload: Payload::Owned(value),
            key: None,
            parent: None,
            prev: None,
            next: None,
        }
    }

    pub(crate) fn reference(target: NodeId) -> Self {
        Self {
            payload: Payload::Reference(target),
            key: None,
            parent: None,
            prev: None,
            next: None,
        }
    }

    /// Member name when this node belongs to an object.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// `true` when the key is borrowed static storage rather than owned.
    pub fn key_is_const(&self) -> bool {
        matches!(self.key, Some(Cow::Borrowed(_)))
    }

    /// `true` when this node aliases another node's payload.
    pub fn is_reference(&self) -> bool {
        matches!(self.payload, Payload::Reference(_))
    }

    /// The aliased node, for references.
    pub fn target(&self) -> Option<NodeId> {
        match self.payload {
            Payload::Reference(id) => Some(id),
            Payload::Owned(_) => None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }

    pub(crate) fn owned(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Owned(v) => Some(v),
            Payload::Reference(_) => None,
        }
    }

    pub(crate) fn owned_mut(&mut self) -> Option<&mut Value> {
        match &mut self.payload {
            Payload::Owned(v) => Some(v),
            Payload::Reference(_) => None,
        }
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.parent.is_none() && self.prev.is_none() && self.next.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_equality_prefers_exact_int() {
        assert_eq!(Number::from_i64(3), Number::from_f64(3.0));
        assert_ne!(
            Number::from_i64(9_007_199_254_740_993),
            Number::from_i64(9_007_199_254_740_992)
        );
    }

    #[test]
    fn test_saturating_int() {
        assert_eq!(Number::from_f64(1e300).saturating_int(), i64::MAX);
        assert_eq!(Number::from_f64(-1e300).saturating_int(), i64::MIN);
        assert_eq!(Number::from_f64(f64::NAN).saturating_int(), 0);
        assert_eq!(Number::from_f64(2.9).saturating_int(), 2);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Bool(true).kind(), Kind::True);
        assert_eq!(Value::Bool(false).kind(), Kind::False);
        assert_eq!(Value::Array(Children::default()).kind(), Kind::Array);
        assert!(Kind::Object.is_container());
        assert!(!Kind::Raw.is_container());
    }

    #[test]
    fn test_key_flags() {
        let mut node = Node::new(Value::Null);
        node.key = Some(Cow::Borrowed("const"));
        assert!(node.key_is_const());
        node.key = Some(Cow::Owned("owned".to_string()));
        assert!(!node.key_is_const());
        assert_eq!(node.key(), Some("owned"));
    }
}
