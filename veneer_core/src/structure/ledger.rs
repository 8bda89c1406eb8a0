// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Undo ledger for classes, attributes, and inline styles.
//!
//! Every write the engine makes to a node it does not own goes through here.
//! Writes are diffed against the document, so repeating a write is free and
//! produces no mutation. The first write to a key records the value it
//! replaced; [`Ledger::restore`] puts those values back.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::dom::Dom;
#[cfg(feature = "trace-rich")]
use crate::trace::{DomWrite, WriteField};

#[derive(Clone, Copy)]
enum WriteKind {
    Class,
    Attribute,
    Style,
}

struct NodeRecord<N> {
    node: N,
    /// Classes that were absent before the engine added them.
    classes: Vec<String>,
    /// Attributes with the value they had before the first write.
    attributes: Vec<(String, Option<String>)>,
    /// Inline style properties with their value before the first write.
    styles: Vec<(String, Option<String>)>,
}

/// Per-node record of engine writes.
pub(crate) struct Ledger<N> {
    records: Vec<NodeRecord<N>>,
    writes: u64,
    #[cfg(feature = "trace-rich")]
    log: Vec<DomWrite>,
}

impl<N> Default for Ledger<N> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            writes: 0,
            #[cfg(feature = "trace-rich")]
            log: Vec::new(),
        }
    }
}

impl<N: Clone + PartialEq> Ledger<N> {
    /// Returns the number of DOM writes made through the ledger.
    pub(crate) fn writes(&self) -> u64 {
        self.writes
    }

    /// Adds `class` if absent. Returns `true` if the document changed.
    pub(crate) fn add_class<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, class: &str) -> bool {
        if dom.has_class(node, class) {
            return false;
        }
        let record = self.record(node);
        if !record.classes.iter().any(|c| c == class) {
            record.classes.push(String::from(class));
        }
        self.note(WriteKind::Class, true);
        dom.add_class(node, class);
        true
    }

    /// Adds or removes a class the engine manages.
    ///
    /// Removal only touches classes the engine added; a class the node
    /// already carried is left alone.
    pub(crate) fn set_class<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, class: &str, on: bool) -> bool {
        if on {
            return self.add_class(dom, node, class);
        }
        let owned = self
            .find(node)
            .is_some_and(|r| r.classes.iter().any(|c| c == class));
        if !owned || !dom.has_class(node, class) {
            return false;
        }
        self.note(WriteKind::Class, false);
        dom.remove_class(node, class);
        true
    }

    /// Sets an attribute if it differs. Returns `true` if the document changed.
    pub(crate) fn set_attribute<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, name: &str, value: &str) -> bool {
        let current = dom.attribute(node, name);
        if current.as_deref() == Some(value) {
            return false;
        }
        let record = self.record(node);
        if !record.attributes.iter().any(|(n, _)| n == name) {
            record.attributes.push((String::from(name), current));
        }
        self.note(WriteKind::Attribute, true);
        dom.set_attribute(node, name, value);
        true
    }

    /// Removes an attribute if present. Returns `true` if the document changed.
    pub(crate) fn remove_attribute<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, name: &str) -> bool {
        let Some(current) = dom.attribute(node, name) else {
            return false;
        };
        let record = self.record(node);
        if !record.attributes.iter().any(|(n, _)| n == name) {
            record.attributes.push((String::from(name), Some(current)));
        }
        self.note(WriteKind::Attribute, false);
        dom.remove_attribute(node, name);
        true
    }

    /// Sets an inline style property if it differs.
    pub(crate) fn set_style<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, property: &str, value: &str) -> bool {
        let current = dom.style(node, property);
        if current.as_deref() == Some(value) {
            return false;
        }
        let had_style = dom.attribute(node, "style");
        let record = self.record(node);
        if !record.attributes.iter().any(|(n, _)| n == "style") {
            record.attributes.push((String::from("style"), had_style));
        }
        if !record.styles.iter().any(|(p, _)| p == property) {
            record.styles.push((String::from(property), current));
        }
        self.note(WriteKind::Style, true);
        dom.set_style(node, property, value);
        true
    }

    /// Removes an inline style property if present.
    pub(crate) fn remove_style<D: Dom<Node = N>>(&mut self, dom: &D, node: &N, property: &str) -> bool {
        let Some(current) = dom.style(node, property) else {
            return false;
        };
        let had_style = dom.attribute(node, "style");
        let record = self.record(node);
        if !record.attributes.iter().any(|(n, _)| n == "style") {
            record.attributes.push((String::from("style"), had_style));
        }
        if !record.styles.iter().any(|(p, _)| p == property) {
            record.styles.push((String::from(property), Some(current)));
        }
        self.note(WriteKind::Style, false);
        dom.remove_style(node, property);
        true
    }

    /// Undoes every write to `node` and forgets it.
    pub(crate) fn restore_node<D: Dom<Node = N>>(&mut self, dom: &D, node: &N) {
        if let Some(pos) = self.records.iter().position(|r| r.node == *node) {
            let record = self.records.remove(pos);
            Self::undo(dom, record);
        }
    }

    /// Forgets `node` without touching the document.
    pub(crate) fn forget(&mut self, node: &N) {
        self.records.retain(|r| r.node != *node);
    }

    /// Undoes every recorded write.
    pub(crate) fn restore<D: Dom<Node = N>>(&mut self, dom: &D) {
        for record in core::mem::take(&mut self.records).into_iter().rev() {
            Self::undo(dom, record);
        }
    }

    fn undo<D: Dom<Node = N>>(dom: &D, record: NodeRecord<N>) {
        let node = &record.node;
        for class in &record.classes {
            dom.remove_class(node, class);
        }
        for (property, previous) in &record.styles {
            match previous {
                Some(value) => dom.set_style(node, property, value),
                None => dom.remove_style(node, property),
            }
        }
        for (name, previous) in &record.attributes {
            match (name.as_str(), previous) {
                // Property-level restore already happened; only drop an
                // attribute the engine created.
                ("style", Some(_)) => {}
                ("style", None) => {
                    if dom.attribute(node, "style").is_some_and(|s| s.trim().is_empty()) {
                        dom.remove_attribute(node, "style");
                    }
                }
                (_, Some(value)) => dom.set_attribute(node, name, value),
                (_, None) => dom.remove_attribute(node, name),
            }
        }
        if !record.classes.is_empty()
            && !record.attributes.iter().any(|(n, _)| n == "class")
            && dom.attribute(node, "class").is_some_and(|c| c.trim().is_empty())
        {
            dom.remove_attribute(node, "class");
        }
    }

    /// Drains the per-write log collected since the last call.
    #[cfg(feature = "trace-rich")]
    pub(crate) fn take_log(&mut self) -> Vec<DomWrite> {
        core::mem::take(&mut self.log)
    }

    fn note(&mut self, field: WriteKind, set: bool) {
        self.writes += 1;
        #[cfg(feature = "trace-rich")]
        self.log.push(DomWrite {
            field: match field {
                WriteKind::Class => WriteField::Class,
                WriteKind::Attribute => WriteField::Attribute,
                WriteKind::Style => WriteField::Style,
            },
            set,
        });
        #[cfg(not(feature = "trace-rich"))]
        _ = (field, set);
    }

    fn find(&self, node: &N) -> Option<&NodeRecord<N>> {
        self.records.iter().find(|r| r.node == *node)
    }

    fn record(&mut self, node: &N) -> &mut NodeRecord<N> {
        let pos = match self.records.iter().position(|r| r.node == *node) {
            Some(pos) => pos,
            None => {
                self.records.push(NodeRecord {
                    node: node.clone(),
                    classes: Vec::new(),
                    attributes: Vec::new(),
                    styles: Vec::new(),
                });
                self.records.len() - 1
            }
        };
        &mut self.records[pos]
    }
}

impl<N> fmt::Debug for Ledger<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("nodes", &self.records.len())
            .field("writes", &self.writes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn restore_returns_attributes_to_their_prior_state() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        dom.set_attribute(&el, "class", "user");
        dom.set_attribute(&el, "style", "color: red;");
        dom.set_attribute(&el, "tabindex", "3");

        let mut ledger = Ledger::default();
        ledger.add_class(&dom, &el, "engine");
        ledger.set_style(&dom, &el, "color", "blue");
        ledger.set_style(&dom, &el, "top", "1px");
        ledger.set_attribute(&dom, &el, "tabindex", "-1");
        ledger.set_attribute(&dom, &el, "data-x", "1");
        ledger.restore(&dom);

        assert_eq!(dom.attribute(&el, "class").as_deref(), Some("user"), "user class kept");
        assert_eq!(dom.attribute(&el, "style").as_deref(), Some("color: red;"), "style restored");
        assert_eq!(dom.attribute(&el, "tabindex").as_deref(), Some("3"), "attribute restored");
        assert_eq!(dom.attribute(&el, "data-x"), None, "created attribute removed");
    }

    #[test]
    fn attributes_created_from_nothing_are_removed() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        let mut ledger = Ledger::default();
        ledger.add_class(&dom, &el, "engine");
        ledger.set_style(&dom, &el, "overflow-y", "scroll");
        ledger.restore(&dom);
        assert_eq!(dom.attribute(&el, "class"), None, "class attribute gone");
        assert_eq!(dom.attribute(&el, "style"), None, "style attribute gone");
    }

    #[test]
    fn writes_are_diffed() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        let mut ledger = Ledger::default();
        assert!(ledger.set_style(&dom, &el, "top", "0px"), "first write lands");
        assert!(!ledger.set_style(&dom, &el, "top", "0px"), "repeat is skipped");
        assert!(ledger.set_class(&dom, &el, "on", true), "class added");
        assert!(!ledger.set_class(&dom, &el, "on", true), "already present");
        assert_eq!(ledger.writes(), 2, "only real writes counted");
    }

    #[test]
    fn pre_existing_classes_survive_toggle_off() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        dom.add_class(&el, "mine");
        let mut ledger = Ledger::default();
        assert!(!ledger.set_class(&dom, &el, "mine", false), "not owned by the ledger");
        assert!(dom.has_class(&el, "mine"), "user class untouched");
    }
}
