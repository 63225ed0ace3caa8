//! The node arena.
//!
//! A [`Tree`] owns every node it allocates. Nodes reference each other by
//! [`NodeId`]; a released slot bumps its generation so stale ids are detected
//! instead of aliasing whatever reuses the slot.
//!
//! Ownership follows the child links: deleting a node releases its whole
//! subtree. A reference node owns nothing but its own slot; reads through it
//! see the target's payload and children.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::{TreeError, TreeResult};
use crate::node::{Children, Kind, Node, NodeId, Number, Payload, Value};

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of JSON nodes.
#[derive(Clone, Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    references: usize,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes, across all roots.
    pub fn node_count(&self) -> usize {
        self.live
    }

    // =========================================================================
    // Slots
    // =========================================================================

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        if node.is_reference() {
            self.references -= 1;
        }
        Some(node)
    }

    /// The node behind `id`, or `None` if it has been released.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&Node> {
        self.get(id).ok_or(TreeError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.get_mut(id).ok_or(TreeError::StaleNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// The node whose payload `id` exposes: `id` itself, or a reference's
    /// target. `None` for stale ids and dangling references.
    pub fn resolve(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id)?.payload {
            Payload::Owned(_) => Some(id),
            Payload::Reference(target) => self.get(target).map(|_| target),
        }
    }

    /// Payload of `id`, looking through references.
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        let resolved = self.resolve(id)?;
        self.get(resolved)?.owned()
    }

    pub fn kind(&self, id: NodeId) -> Kind {
        self.value(id).map_or(Kind::Invalid, Value::kind)
    }

    pub fn key(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.key()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.prev
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.value(id)?.children()?.first
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.value(id)?.children()?.last
    }

    /// Number of children; zero for non-containers.
    pub fn len(&self, id: NodeId) -> usize {
        self.value(id)
            .and_then(Value::children)
            .map_or(0, Children::len)
    }

    /// Iterate over the direct children of `id` in order.
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.first_child(id),
        }
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// First member of object `id` whose key equals `key`.
    pub fn member(&self, id: NodeId, key: &str) -> Option<NodeId> {
        if self.kind(id) != Kind::Object {
            return None;
        }
        self.children(id).find(|&c| self.key(c) == Some(key))
    }

    /// Like [`member`](Self::member) but compares keys ASCII case-insensitively.
    pub fn member_ignore_case(&self, id: NodeId, key: &str) -> Option<NodeId> {
        if self.kind(id) != Kind::Object {
            return None;
        }
        self.children(id)
            .find(|&c| self.key(c).is_some_and(|k| k.eq_ignore_ascii_case(key)))
    }

    pub fn has_member(&self, id: NodeId, key: &str) -> bool {
        self.member(id, key).is_some()
    }

    pub fn as_str(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_raw(&self, id: NodeId) -> Option<&str> {
        match self.value(id)? {
            Value::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self, id: NodeId) -> Option<Number> {
        match self.value(id)? {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self, id: NodeId) -> Option<f64> {
        self.as_number(id).map(|n| n.as_f64())
    }

    pub fn as_i64(&self, id: NodeId) -> Option<i64> {
        self.as_number(id)?.as_i64()
    }

    pub fn as_bool(&self, id: NodeId) -> Option<bool> {
        match self.value(id)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Null
    }

    pub fn is_bool(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Kind::True | Kind::False)
    }

    pub fn is_number(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Number
    }

    pub fn is_string(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::String
    }

    pub fn is_array(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Array
    }

    pub fn is_object(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Object
    }

    pub fn is_invalid(&self, id: NodeId) -> bool {
        self.kind(id) == Kind::Invalid
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// A type-unset node, the destination handed to the low-level parser.
    pub fn create_unset(&mut self) -> NodeId {
        self.alloc(Node::new(Value::Invalid))
    }

    pub fn create_null(&mut self) -> NodeId {
        self.alloc(Node::new(Value::Null))
    }

    pub fn create_bool(&mut self, b: bool) -> NodeId {
        self.alloc(Node::new(Value::Bool(b)))
    }

    pub fn create_true(&mut self) -> NodeId {
        self.create_bool(true)
    }

    pub fn create_false(&mut self) -> NodeId {
        self.create_bool(false)
    }

    pub fn create_number(&mut self, n: impl Into<Number>) -> NodeId {
        self.alloc(Node::new(Value::Number(n.into())))
    }

    pub fn create_int(&mut self, n: i64) -> NodeId {
        self.create_number(Number::from_i64(n))
    }

    pub fn create_string(&mut self, s: impl Into<String>) -> NodeId {
        self.alloc(Node::new(Value::String(s.into())))
    }

    /// A node whose text is emitted verbatim by the encoder.
    pub fn create_raw(&mut self, json: impl Into<String>) -> NodeId {
        self.alloc(Node::new(Value::Raw(json.into())))
    }

    pub fn create_array(&mut self) -> NodeId {
        self.alloc(Node::new(Value::Array(Children::default())))
    }

    pub fn create_object(&mut self) -> NodeId {
        self.alloc(Node::new(Value::Object(Children::default())))
    }

    /// A node aliasing `target`'s payload and children without owning them.
    ///
    /// A reference to a reference aliases the final target directly.
    pub fn create_reference(&mut self, target: NodeId) -> TreeResult<NodeId> {
        let resolved = self.resolve(target).ok_or(TreeError::StaleNode(target))?;
        self.references += 1;
        Ok(self.alloc(Node::reference(resolved)))
    }

    pub fn create_int_array(&mut self, numbers: &[i64]) -> NodeId {
        let array = self.create_array();
        for &n in numbers {
            let child = self.create_int(n);
            self.link_last(array, child);
        }
        array
    }

    pub fn create_float_array(&mut self, numbers: &[f64]) -> NodeId {
        let array = self.create_array();
        for &n in numbers {
            let child = self.create_number(n);
            self.link_last(array, child);
        }
        array
    }

    pub fn create_string_array<S: AsRef<str>>(&mut self, strings: &[S]) -> NodeId {
        let array = self.create_array();
        for s in strings {
            let child = self.create_string(s.as_ref());
            self.link_last(array, child);
        }
        array
    }

    // =========================================================================
    // Linking
    // =========================================================================

    /// Append `child` to `parent` without validation. Both must be live,
    /// `parent` an owned container and `child` detached.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let last = self.last_owned_child(parent);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev = last;
            node.next = None;
        }
        if let Some(last) = last {
            if let Some(node) = self.get_mut(last) {
                node.next = Some(child);
            }
        }
        if let Some(children) = self.owned_children_mut(parent) {
            if children.first.is_none() {
                children.first = Some(child);
            }
            children.last = Some(child);
            children.len += 1;
        }
    }

    /// Insert `child` immediately before `before`, a child of `parent`.
    fn link_before(&mut self, parent: NodeId, before: NodeId, child: NodeId) {
        let prev = self.prev(before);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
            node.prev = prev;
            node.next = Some(before);
        }
        if let Some(node) = self.get_mut(before) {
            node.prev = Some(child);
        }
        match prev {
            Some(prev) => {
                if let Some(node) = self.get_mut(prev) {
                    node.next = Some(child);
                }
            }
            None => {
                if let Some(children) = self.owned_children_mut(parent) {
                    children.first = Some(child);
                }
            }
        }
        if let Some(children) = self.owned_children_mut(parent) {
            children.len += 1;
        }
    }

    /// Remove `id` from its parent's child list, leaving it detached.
    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent.take(), node.prev.take(), node.next.take());
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => {
                if let Some(node) = self.get_mut(prev) {
                    node.next = next;
                }
            }
            None => {
                if let Some(children) = self.owned_children_mut(parent) {
                    children.first = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(node) = self.get_mut(next) {
                    node.prev = prev;
                }
            }
            None => {
                if let Some(children) = self.owned_children_mut(parent) {
                    children.last = prev;
                }
            }
        }
        if let Some(children) = self.owned_children_mut(parent) {
            children.len -= 1;
        }
    }

    fn last_owned_child(&self, parent: NodeId) -> Option<NodeId> {
        self.get(parent)?.owned()?.children()?.last
    }

    fn owned_children_mut(&mut self, parent: NodeId) -> Option<&mut Children> {
        self.get_mut(parent)?.owned_mut()?.children_mut()
    }

    /// Kind of an owned container, rejecting references and scalars.
    fn owned_container(&self, parent: NodeId) -> TreeResult<Kind> {
        let node = self.node(parent)?;
        let value = node.owned().ok_or(TreeError::ReferenceImmutable(parent))?;
        match value.kind() {
            kind @ (Kind::Array | Kind::Object) => Ok(kind),
            _ => Err(TreeError::NotAContainer(parent)),
        }
    }

    fn owned_object(&self, parent: NodeId) -> TreeResult<()> {
        match self.owned_container(parent) {
            Ok(Kind::Object) => Ok(()),
            Ok(_) | Err(TreeError::NotAContainer(_)) => Err(TreeError::NotAnObject(parent)),
            Err(e) => Err(e),
        }
    }

    /// Validate that `child` may be attached beneath `parent`.
    fn check_attach(&self, parent: NodeId, child: NodeId) -> TreeResult<Kind> {
        let kind = self.owned_container(parent)?;
        let node = self.node(child)?;
        if !node.is_detached() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if kind == Kind::Object && node.key.is_none() {
            return Err(TreeError::MissingKey(child));
        }
        if self.reaches_ancestor(child, parent) {
            return Err(TreeError::WouldCycle(child));
        }
        Ok(kind)
    }

    /// Whether attaching `from` beneath `parent` would close a loop: `from`
    /// is `parent` or one of its ancestors, or something reachable from
    /// `from` through reference targets is.
    fn reaches_ancestor(&self, from: NodeId, parent: NodeId) -> bool {
        let mut ancestors = HashSet::new();
        let mut cur = Some(parent);
        while let Some(id) = cur {
            if id == from {
                return true;
            }
            ancestors.insert(id);
            cur = self.parent(id);
        }
        if self.references == 0 {
            return false;
        }

        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if ancestors.contains(&id) {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(Payload::Reference(target)) = self.get(id).map(|n| &n.payload) {
                stack.push(*target);
                continue;
            }
            let mut c = self.first_child(id);
            while let Some(cid) = c {
                stack.push(cid);
                c = self.next(cid);
            }
        }
        false
    }

    // =========================================================================
    // Attaching
    // =========================================================================

    /// Append `child` as the last element of `parent`.
    ///
    /// Array elements lose any key they carried; object members must
    /// already have one (see [`append_member`](Self::append_member)).
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let kind = self.check_attach(parent, child)?;
        if kind == Kind::Array {
            self.node_mut(child)?.key = None;
        }
        self.link_last(parent, child);
        Ok(())
    }

    /// Append `child` to object `object` under `key`.
    ///
    /// A `&'static str` key is stored borrowed and never copied.
    pub fn append_member(
        &mut self,
        object: NodeId,
        key: impl Into<Cow<'static, str>>,
        child: NodeId,
    ) -> TreeResult<()> {
        self.owned_object(object)?;
        let previous = self.node_mut(child)?.key.replace(key.into());
        if let Err(e) = self.check_attach(object, child) {
            self.node_mut(child)?.key = previous;
            return Err(e);
        }
        self.link_last(object, child);
        Ok(())
    }

    /// Insert `child` at `index`; an index past the end appends.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> TreeResult<()> {
        let kind = self.check_attach(parent, child)?;
        if kind == Kind::Array {
            self.node_mut(child)?.key = None;
        }
        match self.child_at(parent, index) {
            Some(before) => self.link_before(parent, before, child),
            None => self.link_last(parent, child),
        }
        Ok(())
    }

    /// Append a new reference to `target` to array `parent`.
    pub fn append_reference(&mut self, parent: NodeId, target: NodeId) -> TreeResult<NodeId> {
        let reference = self.create_reference(target)?;
        if let Err(e) = self.append(parent, reference) {
            self.release(reference);
            return Err(e);
        }
        Ok(reference)
    }

    /// Append a new reference to `target` to object `object` under `key`.
    pub fn append_member_reference(
        &mut self,
        object: NodeId,
        key: impl Into<Cow<'static, str>>,
        target: NodeId,
    ) -> TreeResult<NodeId> {
        let reference = self.create_reference(target)?;
        if let Err(e) = self.append_member(object, key, reference) {
            self.release(reference);
            return Err(e);
        }
        Ok(reference)
    }

    // =========================================================================
    // Detaching
    // =========================================================================

    /// Unlink `id` from its parent. The node keeps its key and subtree and
    /// becomes a root owned directly by the caller.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<NodeId> {
        self.node(id)?;
        self.unlink(id);
        Ok(id)
    }

    pub fn detach_at(&mut self, parent: NodeId, index: usize) -> TreeResult<NodeId> {
        self.owned_container(parent)?;
        let child = self
            .child_at(parent, index)
            .ok_or(TreeError::IndexOutOfBounds {
                index,
                len: self.len(parent),
            })?;
        self.detach(child)
    }

    pub fn detach_member(&mut self, object: NodeId, key: &str) -> TreeResult<NodeId> {
        self.owned_object(object)?;
        let child = self
            .member(object, key)
            .ok_or_else(|| TreeError::KeyNotFound(key.to_string()))?;
        self.detach(child)
    }

    pub fn detach_member_ignore_case(&mut self, object: NodeId, key: &str) -> TreeResult<NodeId> {
        self.owned_object(object)?;
        let child = self
            .member_ignore_case(object, key)
            .ok_or_else(|| TreeError::KeyNotFound(key.to_string()))?;
        self.detach(child)
    }

    // =========================================================================
    // Deleting
    // =========================================================================

    /// Release `id` and everything it owns. Stale ids are ignored.
    ///
    /// An attached node is unlinked from its parent first. A reference
    /// releases only itself; its target is untouched.
    pub fn delete(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        self.unlink(id);
        self.release_subtree(id);
    }

    fn release_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let mut c = self
                .get(id)
                .and_then(Node::owned)
                .and_then(Value::children)
                .and_then(|ch| ch.first);
            while let Some(cid) = c {
                c = self.next(cid);
                stack.push(cid);
            }
            self.release(id);
        }
    }

    pub fn delete_at(&mut self, parent: NodeId, index: usize) -> TreeResult<()> {
        let child = self.detach_at(parent, index)?;
        self.delete(child);
        Ok(())
    }

    pub fn delete_member(&mut self, object: NodeId, key: &str) -> TreeResult<()> {
        let child = self.detach_member(object, key)?;
        self.delete(child);
        Ok(())
    }

    pub fn delete_member_ignore_case(&mut self, object: NodeId, key: &str) -> TreeResult<()> {
        let child = self.detach_member_ignore_case(object, key)?;
        self.delete(child);
        Ok(())
    }

    /// Release any owned children and return `id` to the type-unset state.
    ///
    /// A reference drops its alias; the target keeps its payload.
    pub(crate) fn reset(&mut self, id: NodeId) {
        let mut c = self
            .get(id)
            .and_then(Node::owned)
            .and_then(Value::children)
            .and_then(|ch| ch.first);
        while let Some(cid) = c {
            c = self.next(cid);
            self.release_subtree(cid);
        }
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let was_reference = node.is_reference();
        node.payload = Payload::Owned(Value::Invalid);
        if was_reference {
            self.references -= 1;
        }
    }

    // =========================================================================
    // Replacing and setting
    // =========================================================================

    /// Put `new` in `old`'s place, inheriting its key, and release `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> TreeResult<()> {
        let parent = self
            .node(old)?
            .parent
            .ok_or(TreeError::NotAttached(old))?;
        let key = self.node(old)?.key.clone();
        let previous = std::mem::replace(&mut self.node_mut(new)?.key, key);
        if let Err(e) = self.check_attach(parent, new) {
            self.node_mut(new)?.key = previous;
            return Err(e);
        }
        self.link_before(parent, old, new);
        self.delete(old);
        Ok(())
    }

    pub fn replace_at(&mut self, parent: NodeId, index: usize, new: NodeId) -> TreeResult<()> {
        self.owned_container(parent)?;
        let old = self
            .child_at(parent, index)
            .ok_or(TreeError::IndexOutOfBounds {
                index,
                len: self.len(parent),
            })?;
        self.replace(old, new)
    }

    pub fn replace_member(&mut self, object: NodeId, key: &str, new: NodeId) -> TreeResult<()> {
        self.owned_object(object)?;
        let old = self
            .member(object, key)
            .ok_or_else(|| TreeError::KeyNotFound(key.to_string()))?;
        self.replace(old, new)
    }

    pub fn set_number(&mut self, id: NodeId, n: impl Into<Number>) -> TreeResult<()> {
        match self.owned_value_mut(id)? {
            Value::Number(slot) => {
                *slot = n.into();
                Ok(())
            }
            _ => Err(TreeError::NotANumber(id)),
        }
    }

    pub fn set_string(&mut self, id: NodeId, s: impl Into<String>) -> TreeResult<()> {
        match self.owned_value_mut(id)? {
            Value::String(slot) => {
                *slot = s.into();
                Ok(())
            }
            _ => Err(TreeError::NotAString(id)),
        }
    }

    /// Rename `id`. Array elements cannot carry keys.
    pub fn set_key(&mut self, id: NodeId, key: impl Into<Cow<'static, str>>) -> TreeResult<()> {
        if let Some(parent) = self.node(id)?.parent {
            if self.kind(parent) != Kind::Object {
                return Err(TreeError::NotAnObject(parent));
            }
        }
        self.node_mut(id)?.key = Some(key.into());
        Ok(())
    }

    pub(crate) fn set_value(&mut self, id: NodeId, value: Value) {
        if let Some(node) = self.get_mut(id) {
            node.payload = Payload::Owned(value);
        }
    }

    pub(crate) fn set_key_unchecked(&mut self, id: NodeId, key: String) {
        if let Some(node) = self.get_mut(id) {
            node.key = Some(Cow::Owned(key));
        }
    }

    fn owned_value_mut(&mut self, id: NodeId) -> TreeResult<&mut Value> {
        let node = self.node_mut(id)?;
        node.owned_mut().ok_or(TreeError::ReferenceImmutable(id))
    }

    // =========================================================================
    // Duplicate and compare
    // =========================================================================

    /// Copy `id` into a new detached node owned by the caller.
    ///
    /// References are materialized as owned copies of their target. Without
    /// `recurse`, containers are copied empty.
    pub fn duplicate(&mut self, id: NodeId, recurse: bool) -> TreeResult<NodeId> {
        let key = self.node(id)?.key.clone();
        let copy = self.duplicate_value(id, recurse)?;
        if let Some(node) = self.get_mut(copy) {
            node.key = key;
        }
        Ok(copy)
    }

    fn duplicate_value(&mut self, id: NodeId, recurse: bool) -> TreeResult<NodeId> {
        let value = self.value(id).ok_or(TreeError::StaleNode(id))?;
        let shell = match value {
            Value::Array(_) => Value::Array(Children::default()),
            Value::Object(_) => Value::Object(Children::default()),
            other => other.clone(),
        };
        let copy = self.alloc(Node::new(shell));
        if recurse {
            let children: Vec<NodeId> = self.children(id).collect();
            for child in children {
                let dup = match self.duplicate(child, true) {
                    Ok(dup) => dup,
                    Err(e) => {
                        self.delete(copy);
                        return Err(e);
                    }
                };
                self.link_last(copy, dup);
            }
        }
        Ok(copy)
    }

    /// Structural equality of two subtrees.
    ///
    /// Arrays compare element-wise in order; objects compare as sets of
    /// members, so member order does not matter. Invalid nodes are never
    /// equal to anything.
    pub fn compare(&self, a: NodeId, b: NodeId, case_sensitive: bool) -> bool {
        let (Some(va), Some(vb)) = (self.value(a), self.value(b)) else {
            return false;
        };
        match (va, vb) {
            (Value::Invalid, _) | (_, Value::Invalid) => false,
            (Value::Null, Value::Null) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::String(x), Value::String(y)) | (Value::Raw(x), Value::Raw(y)) => x == y,
            (Value::Array(x), Value::Array(y)) => {
                x.len == y.len
                    && self
                        .children(a)
                        .zip(self.children(b))
                        .all(|(ca, cb)| self.compare(ca, cb, case_sensitive))
            }
            (Value::Object(x), Value::Object(y)) => {
                x.len == y.len
                    && self.members_within(a, b, case_sensitive)
                    && self.members_within(b, a, case_sensitive)
            }
            _ => false,
        }
    }

    /// Every member of `a` has an equal counterpart in `b`.
    fn members_within(&self, a: NodeId, b: NodeId, case_sensitive: bool) -> bool {
        self.children(a).all(|ca| {
            let Some(key) = self.key(ca) else {
                return false;
            };
            let cb = if case_sensitive {
                self.member(b, key)
            } else {
                self.member_ignore_case(b, key)
            };
            cb.is_some_and(|cb| self.compare(ca, cb, case_sensitive))
        })
    }
}

/// Iterator over the direct children of a node.
pub struct ChildIter<'t> {
    tree: &'t Tree,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.next(id);
        Some(id)
    }
}
