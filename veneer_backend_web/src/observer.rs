// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native observer glue.
//!
//! Each native wraps one browser observer and a `Closure` that converts its
//! entries into [`Signal`]s for a [`SignalSink`]. The sink holds its registry
//! weakly, so a callback that fires after the runtime is gone does nothing.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{
    Element, IntersectionObserver, IntersectionObserverEntry, MutationObserver,
    MutationObserverInit, MutationRecord, Node, ResizeObserver, ResizeObserverEntry,
};

use veneer_core::observe::{Mutation, NativeKind, NativeObserver, Signal, SignalSink};

type EntriesClosure = Closure<dyn FnMut(Array)>;

/// Creates the native for `kind`, or `None` if the browser refuses it.
pub(crate) fn native(
    kind: NativeKind,
    sink: SignalSink<Node>,
) -> Option<Box<dyn NativeObserver<Node>>> {
    let native: Box<dyn NativeObserver<Node>> = match kind {
        NativeKind::Resize => Box::new(ResizeNative::new(sink)?),
        NativeKind::Intersection => Box::new(IntersectionNative::new(sink)?),
        NativeKind::Attributes | NativeKind::Tree => Box::new(MutationNative::new(kind, sink)?),
    };
    Some(native)
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

/// `ResizeObserver`: every entry pokes the registry, which measures the
/// border box itself so the baseline and the reports agree.
struct ResizeNative {
    observer: ResizeObserver,
    _callback: EntriesClosure,
}

impl ResizeNative {
    fn new(sink: SignalSink<Node>) -> Option<Self> {
        let callback = Closure::wrap(Box::new(move |entries: Array| {
            for entry in entries.iter() {
                let entry: ResizeObserverEntry = entry.unchecked_into();
                sink.signal(&entry.target().into(), Signal::Poke);
            }
        }) as Box<dyn FnMut(Array)>);
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        Some(Self {
            observer,
            _callback: callback,
        })
    }
}

impl NativeObserver<Node> for ResizeNative {
    fn observe(&mut self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            self.observer.observe(element);
        }
    }

    fn unobserve(&mut self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            self.observer.unobserve(element);
        }
    }
}

impl Drop for ResizeNative {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

// ---------------------------------------------------------------------------
// Intersection
// ---------------------------------------------------------------------------

/// `IntersectionObserver` used as a size fallback: any visibility change of
/// an observed node may be a resize, so it pokes.
struct IntersectionNative {
    observer: IntersectionObserver,
    _callback: EntriesClosure,
}

impl IntersectionNative {
    fn new(sink: SignalSink<Node>) -> Option<Self> {
        let callback = Closure::wrap(Box::new(move |entries: Array| {
            for entry in entries.iter() {
                let entry: IntersectionObserverEntry = entry.unchecked_into();
                sink.signal(&entry.target().into(), Signal::Poke);
            }
        }) as Box<dyn FnMut(Array)>);
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        Some(Self {
            observer,
            _callback: callback,
        })
    }
}

impl NativeObserver<Node> for IntersectionNative {
    fn observe(&mut self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            self.observer.observe(element);
        }
    }

    fn unobserve(&mut self, node: &Node) {
        if let Some(element) = node.dyn_ref::<Element>() {
            self.observer.unobserve(element);
        }
    }
}

impl Drop for IntersectionNative {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// `MutationObserver` for either the attributes of observed nodes or the
/// subtrees below them.
///
/// There is no per-node `unobserve`, so removing a node disconnects and
/// re-observes the rest. Records are attributed to the observed root that
/// contains their target.
struct MutationNative {
    kind: NativeKind,
    observer: MutationObserver,
    roots: Rc<RefCell<Vec<Node>>>,
    _callback: EntriesClosure,
}

impl MutationNative {
    fn new(kind: NativeKind, sink: SignalSink<Node>) -> Option<Self> {
        let roots: Rc<RefCell<Vec<Node>>> = Rc::default();
        let callback_roots = Rc::clone(&roots);
        let callback = Closure::wrap(Box::new(move |records: Array| {
            // Collected first: watchers may observe or unobserve re-entrantly.
            let signals = signals(kind, &records, &callback_roots.borrow());
            for (node, signal) in signals {
                sink.signal(&node, signal);
            }
        }) as Box<dyn FnMut(Array)>);
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        Some(Self {
            kind,
            observer,
            roots,
            _callback: callback,
        })
    }

    fn init(&self) -> MutationObserverInit {
        let init = MutationObserverInit::new();
        if self.kind == NativeKind::Attributes {
            init.set_attributes(true);
            init.set_attribute_old_value(true);
        } else {
            init.set_child_list(true);
            init.set_character_data(true);
            init.set_subtree(true);
        }
        init
    }

    fn attach(&self, node: &Node) {
        if let Err(err) = self.observer.observe_with_options(node, &self.init()) {
            tracing::warn!(kind = ?self.kind, ?err, "MutationObserver.observe failed");
        }
    }
}

impl NativeObserver<Node> for MutationNative {
    fn observe(&mut self, node: &Node) {
        self.roots.borrow_mut().push(node.clone());
        self.attach(node);
    }

    fn unobserve(&mut self, node: &Node) {
        self.roots.borrow_mut().retain(|n| n != node);
        self.observer.disconnect();
        for root in self.roots.borrow().iter() {
            self.attach(root);
        }
    }

    fn take_records(&mut self) -> Vec<(Node, Signal)> {
        signals(self.kind, &self.observer.take_records(), &self.roots.borrow())
    }
}

impl Drop for MutationNative {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

fn signals(kind: NativeKind, records: &Array, roots: &[Node]) -> Vec<(Node, Signal)> {
    let mut signals = Vec::new();
    for record in records.iter() {
        let record: MutationRecord = record.unchecked_into();
        let Some(target) = record.target() else {
            continue;
        };
        let Some(mutation) = mutation_of(&record.type_(), record.attribute_name()) else {
            continue;
        };
        for root in routes(kind, &target, roots, |root, node| root.contains(Some(node))) {
            signals.push((root.clone(), Signal::Mutated(mutation.clone())));
        }
    }
    signals
}

/// Picks the observed roots a record on `target` belongs to.
///
/// Attribute records belong to their exact target. Subtree records belong to
/// every observed root containing the target, so nested instances each see
/// their own payload.
fn routes<'a, N: PartialEq>(
    kind: NativeKind,
    target: &'a N,
    roots: &'a [N],
    contains: impl Fn(&N, &N) -> bool + 'a,
) -> impl Iterator<Item = &'a N> + 'a {
    roots.iter().filter(move |root| match kind {
        NativeKind::Attributes => *root == target,
        _ => contains(*root, target),
    })
}

/// Maps a `MutationRecord.type` to a [`Mutation`].
fn mutation_of(kind: &str, attribute: Option<String>) -> Option<Mutation> {
    match kind {
        "attributes" => attribute.map(Mutation::Attribute),
        "childList" => Some(Mutation::ChildList),
        "characterData" => Some(Mutation::CharacterData),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `child -> parent` links for a small tree: 1 > 2 > 3 > 4, 1 > 5.
    fn parent(node: u32) -> Option<u32> {
        match node {
            2 | 5 => Some(1),
            3 => Some(2),
            4 => Some(3),
            _ => None,
        }
    }

    fn contains(root: &u32, node: &u32) -> bool {
        let mut at = Some(*node);
        while let Some(n) = at {
            if n == *root {
                return true;
            }
            at = parent(n);
        }
        false
    }

    fn routed(kind: NativeKind, target: u32, roots: &[u32]) -> Vec<u32> {
        routes(kind, &target, roots, contains).copied().collect()
    }

    #[test]
    fn attribute_records_go_to_their_exact_root() {
        let roots = [1, 3];
        assert_eq!(routed(NativeKind::Attributes, 3, &roots), [3], "inner host only");
        assert_eq!(routed(NativeKind::Attributes, 1, &roots), [1], "outer host only");
        assert!(routed(NativeKind::Attributes, 2, &roots).is_empty(), "unobserved node");
    }

    #[test]
    fn subtree_records_go_to_every_containing_root() {
        let roots = [1, 3];
        assert_eq!(routed(NativeKind::Tree, 4, &roots), [1, 3], "both ancestors hear it");
        assert_eq!(routed(NativeKind::Tree, 5, &roots), [1], "outside the inner root");
        assert_eq!(routed(NativeKind::Tree, 3, &roots), [1, 3], "a root contains itself");
    }

    #[test]
    fn record_types_map_to_mutations() {
        assert_eq!(
            mutation_of("attributes", Some(String::from("class"))),
            Some(Mutation::Attribute(String::from("class"))),
            "attribute records carry the name"
        );
        assert_eq!(mutation_of("attributes", None), None, "nameless attribute record");
        assert_eq!(mutation_of("childList", None), Some(Mutation::ChildList), "child list");
        assert_eq!(
            mutation_of("characterData", None),
            Some(Mutation::CharacterData),
            "text"
        );
        assert_eq!(mutation_of("bogus", None), None, "unknown record type");
    }
}
