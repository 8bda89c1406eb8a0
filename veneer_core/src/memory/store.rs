// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with topology, attribute, and style management.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;
use understory_dirty::{Channel, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId};
use super::traverse::{Ancestors, Children};
use crate::style;

/// An attribute on a node changed.
pub const ATTRIBUTES: Channel = Channel::new(0);
/// A node's child list changed.
pub const CHILD_LIST: Channel = Channel::new(1);
/// A text node's data changed.
pub const CHARACTER_DATA: Channel = Channel::new(2);
/// Something that feeds layout changed at or below a node.
pub const LAYOUT: Channel = Channel::new(3);

/// What a node slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// An element with a tag, attributes, and children.
    Element,
    /// A text node.
    Text,
}

/// Struct-of-arrays storage for a headless document.
///
/// Slot 0 is the `body` root; a node is connected when its ancestor chain
/// reaches it. Nodes are addressed by [`NodeId`] and are never freed.
///
/// Every mutation marks a dirty channel; [`evaluate`](Self::evaluate) drains
/// them into [`DomChanges`](super::DomChanges), which is what mutation and
/// resize observers are fed from.
#[derive(Debug)]
pub struct MemoryStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Node data --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) tag: Vec<String>,
    pub(crate) attributes: Vec<Vec<(String, String)>>,
    pub(crate) intrinsic: Vec<Size>,
    pub(crate) text: Vec<String>,
    pub(crate) len: u32,

    // -- Document settings --
    pub(crate) device_pixel_ratio: f64,
    pub(crate) native_scrollbar: f64,
    pub(crate) fill_classes: Vec<&'static str>,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pending_attributes: Vec<(u32, String)>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a document holding only the `body` root.
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            tag: Vec::new(),
            attributes: Vec::new(),
            intrinsic: Vec::new(),
            text: Vec::new(),
            len: 0,
            device_pixel_ratio: 1.0,
            native_scrollbar: 0.0,
            fill_classes: alloc::vec![style::PADDING, style::VIEWPORT],
            dirty: DirtyTracker::new(),
            pending_attributes: Vec::new(),
        };
        store.alloc(NodeKind::Element, "body");
        store
    }

    /// Returns the document root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // -- Allocation API --

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        NodeId(self.alloc(NodeKind::Element, tag))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        let idx = self.alloc(NodeKind::Text, "#text");
        self.text[idx as usize] = String::from(data);
        NodeId(idx)
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.kind[id.0 as usize]
    }

    /// Returns the tag name of an element (`#text` for text nodes).
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        self.validate(id);
        &self.tag[id.0 as usize]
    }

    // -- Topology API --

    /// Moves `child` to the end of `parent`'s child list.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or `parent` is a text node.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Moves `child` into `parent` before `reference`, or last when
    /// `reference` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale, `parent` is a text node, `reference` is
    /// not a child of `parent`, or the move would create a cycle.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        self.validate(parent);
        self.validate(child);
        let p = parent.0;
        let c = child.0;
        assert!(
            self.kind[p as usize] == NodeKind::Element,
            "text nodes cannot have children"
        );
        assert!(
            !self.ancestors(parent).any(|a| a == child),
            "cannot insert a node into its own subtree"
        );

        // Inserting before itself means "stay in place": anchor on the next
        // sibling before unlinking.
        let mut anchor = match reference {
            Some(r) => {
                self.validate(r);
                assert!(self.parent[r.0 as usize] == p, "reference is not a child of parent");
                r.0
            }
            None => INVALID,
        };
        if anchor == c {
            anchor = self.next_sibling[c as usize];
        }

        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.mark(old_p, CHILD_LIST);
            self.dirty.mark(old_p, LAYOUT);
        }

        self.parent[c as usize] = p;
        if anchor == INVALID {
            self.prev_sibling[c as usize] = INVALID;
            self.next_sibling[c as usize] = INVALID;
            if self.first_child[p as usize] == INVALID {
                self.first_child[p as usize] = c;
            } else {
                // Walk to last child.
                let mut last = self.first_child[p as usize];
                while self.next_sibling[last as usize] != INVALID {
                    last = self.next_sibling[last as usize];
                }
                self.next_sibling[last as usize] = c;
                self.prev_sibling[c as usize] = last;
            }
        } else {
            self.next_sibling[c as usize] = anchor;
            self.prev_sibling[c as usize] = self.prev_sibling[anchor as usize];
            if self.prev_sibling[anchor as usize] != INVALID {
                self.next_sibling[self.prev_sibling[anchor as usize] as usize] = c;
            } else {
                // `anchor` was the first child.
                self.first_child[p as usize] = c;
            }
            self.prev_sibling[anchor as usize] = c;
        }

        self.dirty.mark(p, CHILD_LIST);
        self.dirty.mark_with(c, LAYOUT, &EagerPolicy);
        self.dirty.mark(p, LAYOUT);
    }

    /// Detaches `child` from its parent. Does nothing if it is detached.
    pub fn remove(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.0;
        if self.parent[c as usize] == INVALID {
            return;
        }
        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.mark(p, CHILD_LIST);
        self.dirty.mark(p, LAYOUT);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.0 as usize];
        (p != INVALID).then_some(NodeId(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.0 as usize])
    }

    /// Returns an iterator over `id` and its ancestors, innermost first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.0)
    }

    /// Returns `true` if the node's ancestor chain reaches the root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == self.root())
    }

    // -- Attribute API --

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.validate(id);
        self.attributes[id.0 as usize]
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, recording a mutation even if the value is unchanged.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        self.validate(id);
        let attrs = &mut self.attributes[id.0 as usize];
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                v.clear();
                v.push_str(value);
            }
            None => attrs.push((String::from(name), String::from(value))),
        }
        self.mark_attribute(id.0, name);
    }

    /// Removes an attribute. Absent attributes record nothing.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.validate(id);
        let attrs = &mut self.attributes[id.0 as usize];
        let before = attrs.len();
        attrs.retain(|(n, _)| n != name);
        if attrs.len() != before {
            self.mark_attribute(id.0, name);
        }
    }

    /// Returns the element's classes in order.
    #[must_use]
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|c| c.split_ascii_whitespace().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the element's class list contains `class`.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    /// Adds a class. Present classes record nothing.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut list: Vec<String> = self.classes(id).into_iter().map(String::from).collect();
        list.push(String::from(class));
        self.set_attribute(id, "class", &list.join(" "));
    }

    /// Removes a class. Absent classes record nothing.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let list: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(String::from)
            .collect();
        self.set_attribute(id, "class", &list.join(" "));
    }

    // -- Inline style API --

    /// Returns the inline declarations of an element in order.
    #[must_use]
    pub fn declarations(&self, id: NodeId) -> Vec<(String, String)> {
        self.attribute(id, "style").map(parse_declarations).unwrap_or_default()
    }

    /// Returns an inline style property.
    #[must_use]
    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.declarations(id)
            .into_iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Sets an inline style property.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let mut decls = self.declarations(id);
        match decls.iter_mut().find(|(p, _)| p == property) {
            Some((_, v)) => *v = String::from(value),
            None => decls.push((String::from(property), String::from(value))),
        }
        self.set_attribute(id, "style", &serialize_declarations(&decls));
    }

    /// Removes an inline style property. Absent properties record nothing.
    ///
    /// Removing the last property leaves an empty `style` attribute behind.
    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        let mut decls = self.declarations(id);
        let before = decls.len();
        decls.retain(|(p, _)| p != property);
        if decls.len() != before {
            self.set_attribute(id, "style", &serialize_declarations(&decls));
        }
    }

    // -- Content API --

    /// Returns a text node's data.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        self.validate(id);
        &self.text[id.0 as usize]
    }

    /// Replaces a text node's data.
    pub fn set_text(&mut self, id: NodeId, data: &str) {
        self.validate(id);
        assert!(
            self.kind[id.0 as usize] == NodeKind::Text,
            "only text nodes carry character data"
        );
        self.text[id.0 as usize] = String::from(data);
        self.dirty.mark(id.0, CHARACTER_DATA);
        self.dirty.mark(id.0, LAYOUT);
    }

    /// Returns the node's intrinsic content size.
    #[must_use]
    pub fn intrinsic_size(&self, id: NodeId) -> Size {
        self.validate(id);
        self.intrinsic[id.0 as usize]
    }

    /// Sets the node's intrinsic content size.
    ///
    /// For elements this is a lower bound on the content extent, standing in
    /// for replaced content such as images.
    pub fn set_intrinsic_size(&mut self, id: NodeId, size: Size) {
        self.validate(id);
        self.intrinsic[id.0 as usize] = size;
        self.dirty.mark(id.0, LAYOUT);
    }

    // -- Document settings --

    /// Returns the device pixel ratio.
    #[inline]
    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Sets the device pixel ratio.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
        self.dirty.mark(0, LAYOUT);
    }

    /// Returns the gutter width native scrollbars take on `overflow: scroll`.
    #[inline]
    #[must_use]
    pub fn native_scrollbar_size(&self) -> f64 {
        self.native_scrollbar
    }

    /// Sets the native scrollbar gutter width (0 for overlay scrollbars).
    pub fn set_native_scrollbar_size(&mut self, size: f64) {
        self.native_scrollbar = size.max(0.0);
        self.dirty.mark(0, LAYOUT);
    }

    // -- Internal helpers --

    fn alloc(&mut self, kind: NodeKind, tag: &str) -> u32 {
        let idx = self.len;
        self.len += 1;
        self.parent.push(INVALID);
        self.first_child.push(INVALID);
        self.next_sibling.push(INVALID);
        self.prev_sibling.push(INVALID);
        self.kind.push(kind);
        self.tag.push(String::from(tag));
        self.attributes.push(Vec::new());
        self.intrinsic.push(Size::ZERO);
        self.text.push(String::new());
        idx
    }

    /// Panics if the handle does not belong to this store.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(id.0 < self.len, "stale node: {id:?} (store holds {})", self.len);
    }

    fn mark_attribute(&mut self, idx: u32, name: &str) {
        if !self.pending_attributes.iter().any(|(i, n)| *i == idx && n == name) {
            self.pending_attributes.push((idx, String::from(name)));
        }
        self.dirty.mark(idx, ATTRIBUTES);
        self.dirty.mark_with(idx, LAYOUT, &EagerPolicy);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            (!property.is_empty()).then(|| (String::from(property), String::from(value.trim())))
        })
        .collect()
}

fn serialize_declarations(decls: &[(String, String)]) -> String {
    let parts: Vec<String> = decls
        .iter()
        .map(|(p, v)| alloc::format!("{p}: {v};"))
        .collect();
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn append_and_insert_order_children() {
        let mut store = MemoryStore::new();
        let parent = store.create_element("div");
        let a = store.create_element("a");
        let b = store.create_element("b");
        let c = store.create_element("c");
        store.append_child(parent, a);
        store.append_child(parent, c);
        store.insert_before(parent, b, Some(c));

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c], "b lands between a and c");
        assert_eq!(store.parent(b), Some(parent), "parent link set");
    }

    #[test]
    fn moving_a_node_detaches_it_first() {
        let mut store = MemoryStore::new();
        let root = store.root();
        let from = store.create_element("div");
        let to = store.create_element("div");
        let child = store.create_element("span");
        store.append_child(root, from);
        store.append_child(root, to);
        store.append_child(from, child);
        store.append_child(to, child);
        assert_eq!(store.children(from).count(), 0, "old parent lost the child");
        assert_eq!(store.parent(child), Some(to), "new parent owns it");
        assert!(store.is_connected(child), "still attached to the document");
    }

    #[test]
    fn insert_before_self_keeps_position() {
        let mut store = MemoryStore::new();
        let parent = store.create_element("div");
        let a = store.create_element("a");
        let b = store.create_element("b");
        store.append_child(parent, a);
        store.append_child(parent, b);
        store.insert_before(parent, a, Some(a));
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b], "order unchanged");
    }

    #[test]
    fn class_list_edits_round_trip_through_attribute() {
        let mut store = MemoryStore::new();
        let el = store.create_element("div");
        store.set_attribute(el, "class", "a b");
        store.add_class(el, "c");
        store.add_class(el, "a");
        store.remove_class(el, "b");
        assert_eq!(store.attribute(el, "class"), Some("a c"), "class attribute rewritten");
        assert!(store.has_class(el, "c"), "added class present");
    }

    #[test]
    fn inline_styles_serialize_in_order() {
        let mut store = MemoryStore::new();
        let el = store.create_element("div");
        store.set_style(el, "width", "10px");
        store.set_style(el, "height", "5px");
        store.set_style(el, "width", "12px");
        assert_eq!(
            store.attribute(el, "style"),
            Some("width: 12px; height: 5px;"),
            "replaced values keep their slot"
        );
        store.remove_style(el, "width");
        store.remove_style(el, "height");
        assert_eq!(store.attribute(el, "style"), Some(""), "empty style attribute remains");
        assert_eq!(store.style(el, "width"), None, "property gone");
    }

    #[test]
    fn detached_nodes_are_not_connected() {
        let mut store = MemoryStore::new();
        let el = store.create_element("div");
        assert!(!store.is_connected(el), "fresh element is detached");
        assert!(store.is_connected(store.root()), "root is connected");
    }

    #[test]
    #[should_panic(expected = "stale node")]
    fn foreign_handle_panics() {
        let store = MemoryStore::new();
        let _ = store.parent(NodeId(42));
    }

    #[test]
    #[should_panic(expected = "own subtree")]
    fn cycles_are_rejected() {
        let mut store = MemoryStore::new();
        let outer = store.create_element("div");
        let inner = store.create_element("div");
        store.append_child(outer, inner);
        store.append_child(inner, outer);
    }
}
