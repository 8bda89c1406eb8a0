// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared document handle and its observers.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, Ref, RefCell, RefMut};
use core::fmt;

use kurbo::{Insets, Size};

use super::evaluate::DomChanges;
use super::id::NodeId;
use super::store::MemoryStore;
use crate::dom::Dom;
use crate::geometry::ElementMetrics;
use crate::observe::{Mutation, NativeKind, NativeObserver, Signal, SignalSink};

struct ObserverSlot {
    id: u32,
    kind: NativeKind,
    sink: SignalSink<NodeId>,
    /// Observed nodes with the size last reported for each.
    targets: Vec<(NodeId, Size)>,
    /// Records collected but not yet delivered.
    pending: Vec<(NodeId, Signal)>,
}

struct Inner {
    store: RefCell<MemoryStore>,
    observers: RefCell<Vec<ObserverSlot>>,
    next_observer: Cell<u32>,
    sync_resize: Cell<bool>,
}

/// A shared handle to a [`MemoryStore`] implementing [`Dom`].
///
/// Observers created with [`observer`](Self::observer) queue records the way
/// browser observers do: nothing is delivered until [`deliver`](Self::deliver)
/// (the platform calls it at frame boundaries) or until the owner calls
/// [`NativeObserver::take_records`]. With [`set_sync_resize`](Self::set_sync_resize)
/// resize and intersection records are instead delivered inside the write
/// that caused them, the harshest ordering a native could produce.
#[derive(Clone)]
pub struct MemoryDom {
    inner: Rc<Inner>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                store: RefCell::new(MemoryStore::new()),
                observers: RefCell::new(Vec::new()),
                next_observer: Cell::new(0),
                sync_resize: Cell::new(false),
            }),
        }
    }

    /// Borrows the underlying store.
    #[must_use]
    pub fn store(&self) -> Ref<'_, MemoryStore> {
        self.inner.store.borrow()
    }

    /// Runs `f` with mutable access to the store, then honors sync delivery.
    pub fn edit<R>(&self, f: impl FnOnce(&mut MemoryStore) -> R) -> R {
        let result = {
            let mut store: RefMut<'_, MemoryStore> = self.inner.store.borrow_mut();
            f(&mut store)
        };
        self.after_write();
        result
    }

    /// Returns the `body` root.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.store().root()
    }

    /// Creates a detached `div` whose content has the given intrinsic size.
    pub fn create_block(&self, size: Size) -> NodeId {
        self.edit(|s| {
            let el = s.create_element("div");
            s.set_intrinsic_size(el, size);
            el
        })
    }

    /// Creates a detached text node.
    pub fn create_text(&self, data: &str) -> NodeId {
        self.edit(|s| s.create_text(data))
    }

    /// Replaces a text node's data.
    pub fn set_text(&self, node: NodeId, data: &str) {
        self.edit(|s| s.set_text(node, data));
    }

    /// Sets a node's intrinsic content size.
    pub fn set_intrinsic_size(&self, node: NodeId, size: Size) {
        self.edit(|s| s.set_intrinsic_size(node, size));
    }

    /// Sets the device pixel ratio.
    pub fn set_device_pixel_ratio(&self, ratio: f64) {
        self.edit(|s| s.set_device_pixel_ratio(ratio));
    }

    /// Sets the native scrollbar gutter width.
    pub fn set_native_scrollbar_size(&self, size: f64) {
        self.edit(|s| s.set_native_scrollbar_size(size));
    }

    /// Delivers resize records synchronously inside each write.
    pub fn set_sync_resize(&self, sync: bool) {
        self.inner.sync_resize.set(sync);
    }

    /// Creates an observer of the given kind reporting through `sink`.
    pub fn observer(&self, kind: NativeKind, sink: SignalSink<NodeId>) -> MemoryObserver {
        let id = self.inner.next_observer.get();
        self.inner.next_observer.set(id + 1);
        self.inner.observers.borrow_mut().push(ObserverSlot {
            id,
            kind,
            sink,
            targets: Vec::new(),
            pending: Vec::new(),
        });
        MemoryObserver {
            dom: self.clone(),
            id,
        }
    }

    /// Returns the number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Delivers every queued record. Returns the number delivered.
    pub fn deliver(&self) -> usize {
        self.deliver_where(|_| true)
    }

    fn after_write(&self) {
        if self.inner.sync_resize.get() {
            self.deliver_where(|kind| matches!(kind, NativeKind::Resize | NativeKind::Intersection));
        }
    }

    fn deliver_where(&self, wanted: impl Fn(NativeKind) -> bool) -> usize {
        self.collect();
        let batches: Vec<(SignalSink<NodeId>, Vec<(NodeId, Signal)>)> = {
            let mut observers = self.inner.observers.borrow_mut();
            observers
                .iter_mut()
                .filter(|slot| wanted(slot.kind) && !slot.pending.is_empty())
                .map(|slot| (slot.sink.clone(), core::mem::take(&mut slot.pending)))
                .collect()
        };
        let mut delivered = 0;
        for (sink, records) in batches {
            for (node, signal) in records {
                delivered += 1;
                sink.signal(&node, signal);
            }
        }
        delivered
    }

    /// Drains store changes into per-observer record queues.
    fn collect(&self) {
        let Ok(mut store) = self.inner.store.try_borrow_mut() else {
            return;
        };
        let changes = store.evaluate();
        if changes.is_empty() {
            return;
        }
        let mut observers = self.inner.observers.borrow_mut();
        for slot in observers.iter_mut() {
            queue_records(&store, &changes, slot);
        }
    }

    fn take_records(&self, id: u32) -> Vec<(NodeId, Signal)> {
        self.collect();
        let mut observers = self.inner.observers.borrow_mut();
        observers
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| core::mem::take(&mut slot.pending))
            .unwrap_or_default()
    }

    fn with_slot(&self, id: u32, f: impl FnOnce(&mut ObserverSlot)) {
        // Pending changes belong to the old target set.
        self.collect();
        let mut observers = self.inner.observers.borrow_mut();
        if let Some(slot) = observers.iter_mut().find(|slot| slot.id == id) {
            f(slot);
        }
    }
}

fn queue_records(store: &MemoryStore, changes: &DomChanges, slot: &mut ObserverSlot) {
    match slot.kind {
        NativeKind::Resize | NativeKind::Intersection => {
            if changes.layout.is_empty() {
                return;
            }
            for (node, last) in &mut slot.targets {
                let size = store.box_size(*node);
                if size == *last {
                    continue;
                }
                *last = size;
                let signal = if slot.kind == NativeKind::Resize {
                    Signal::Size(size)
                } else {
                    Signal::Poke
                };
                slot.pending.push((*node, signal));
            }
        }
        NativeKind::Attributes => {
            for (idx, name) in &changes.attributes {
                if let Some((node, _)) = slot.targets.iter().find(|(n, _)| n.0 == *idx) {
                    slot.pending
                        .push((*node, Signal::Mutated(Mutation::Attribute(name.clone()))));
                }
            }
        }
        NativeKind::Tree => {
            let within = |idx: u32| {
                slot.targets
                    .iter()
                    .filter(|(target, _)| store.ancestors(NodeId(idx)).any(|a| a == *target))
                    .map(|(target, _)| *target)
                    .collect::<Vec<_>>()
            };
            let mut records = Vec::new();
            for idx in &changes.child_list {
                for target in within(*idx) {
                    records.push((target, Signal::Mutated(Mutation::ChildList)));
                }
            }
            for idx in &changes.character_data {
                for target in within(*idx) {
                    records.push((target, Signal::Mutated(Mutation::CharacterData)));
                }
            }
            slot.pending.extend(records);
        }
    }
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.inner.store.borrow().len)
            .field("observers", &self.inner.observers.borrow().len())
            .field("sync_resize", &self.inner.sync_resize.get())
            .finish()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> NodeId {
        self.edit(|s| s.create_element(tag))
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.store().parent(*node)
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.store().children(*node).collect()
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.store().is_connected(*node)
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.edit(|s| s.append_child(*parent, *child));
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) {
        self.edit(|s| s.insert_before(*parent, *child, reference.copied()));
    }

    fn remove(&self, node: &NodeId) {
        self.edit(|s| s.remove(*node));
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.store().has_class(*node, class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        self.edit(|s| s.add_class(*node, class));
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.edit(|s| s.remove_class(*node, class));
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.store().attribute(*node, name).map(String::from)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.edit(|s| s.set_attribute(*node, name, value));
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        self.edit(|s| s.remove_attribute(*node, name));
    }

    fn style(&self, node: &NodeId, property: &str) -> Option<String> {
        self.store().style(*node, property)
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.edit(|s| s.set_style(*node, property, value));
    }

    fn remove_style(&self, node: &NodeId, property: &str) {
        self.edit(|s| s.remove_style(*node, property));
    }

    fn computed_style(&self, node: &NodeId, property: &str) -> String {
        self.store().computed_style(*node, property)
    }

    fn metrics(&self, node: &NodeId) -> ElementMetrics {
        self.store().metrics(*node)
    }

    fn padding(&self, node: &NodeId) -> Insets {
        self.store().padding(*node)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.store().device_pixel_ratio()
    }
}

/// A [`NativeObserver`] backed by a [`MemoryDom`] observer slot.
pub struct MemoryObserver {
    dom: MemoryDom,
    id: u32,
}

impl NativeObserver<NodeId> for MemoryObserver {
    fn observe(&mut self, node: &NodeId) {
        let size = self.dom.store().box_size(*node);
        self.dom.with_slot(self.id, |slot| {
            if !slot.targets.iter().any(|(n, _)| n == node) {
                slot.targets.push((*node, size));
            }
        });
    }

    fn unobserve(&mut self, node: &NodeId) {
        self.dom.with_slot(self.id, |slot| {
            slot.targets.retain(|(n, _)| n != node);
            slot.pending.retain(|(n, _)| n != node);
        });
    }

    fn take_records(&mut self) -> Vec<(NodeId, Signal)> {
        self.dom.take_records(self.id)
    }
}

impl Drop for MemoryObserver {
    fn drop(&mut self) {
        if let Ok(mut observers) = self.dom.inner.observers.try_borrow_mut() {
            observers.retain(|slot| slot.id != self.id);
        }
    }
}

impl fmt::Debug for MemoryObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryObserver").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;

    use super::*;
    use crate::observe::{Change, Registry};

    fn registry(dom: &MemoryDom, kind: NativeKind) -> Rc<Registry<NodeId>> {
        let observed = dom.clone();
        let measured = dom.clone();
        Registry::new(
            kind,
            matches!(kind, NativeKind::Resize | NativeKind::Intersection)
                .then(|| Box::new(move |n: &NodeId| measured.store().box_size(*n)) as _),
            move |sink| Some(Box::new(observed.observer(kind, sink)) as Box<dyn NativeObserver<NodeId>>),
        )
    }

    fn recorder() -> (Rc<RefCell<Vec<Change>>>, impl Fn(&Change) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        (log, move |c: &Change| l.borrow_mut().push(c.clone()))
    }

    #[test]
    fn attribute_records_wait_for_delivery() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        dom.append_child(&dom.body(), &el);
        let attrs = registry(&dom, NativeKind::Attributes);
        let (log, watcher) = recorder();
        let _sub = attrs.subscribe(&el, watcher);

        dom.set_attribute(&el, "title", "x");
        assert!(log.borrow().is_empty(), "records are queued");
        assert_eq!(dom.deliver(), 1, "one record delivered");
        assert_eq!(
            *log.borrow(),
            [Change::Mutated(Mutation::Attribute(String::from("title")))],
            "attribute name reported"
        );
    }

    #[test]
    fn take_records_drains_without_delivery() {
        let dom = MemoryDom::new();
        let el = dom.create_element("div");
        let attrs = registry(&dom, NativeKind::Attributes);
        let (log, watcher) = recorder();
        let _sub = attrs.subscribe(&el, watcher);
        dom.add_class(&el, "a");
        attrs.take_records();
        assert_eq!(log.borrow().len(), 1, "taken records dispatched synchronously");
        assert_eq!(dom.deliver(), 0, "nothing left to deliver");
    }

    #[test]
    fn tree_records_reach_observed_ancestors_only() {
        let dom = MemoryDom::new();
        let body = dom.body();
        let observed = dom.create_element("div");
        let sibling = dom.create_element("div");
        let deep = dom.create_element("div");
        dom.append_child(&body, &observed);
        dom.append_child(&body, &sibling);
        dom.append_child(&observed, &deep);
        let tree = registry(&dom, NativeKind::Tree);
        let (log, watcher) = recorder();
        let _sub = tree.subscribe(&observed, watcher);
        dom.deliver();

        let text = dom.create_text("a");
        dom.append_child(&deep, &text);
        dom.append_child(&sibling, &dom.create_element("span"));
        dom.deliver();
        assert_eq!(*log.borrow(), [Change::Mutated(Mutation::ChildList)], "only the subtree counts");
        dom.set_text(&text, "b");
        dom.deliver();
        assert_eq!(log.borrow().len(), 2, "character data reported");
    }

    #[test]
    fn resize_records_carry_new_sizes() {
        let dom = MemoryDom::new();
        let el = dom.create_block(Size::new(10.0, 10.0));
        dom.append_child(&dom.body(), &el);
        let sizes = registry(&dom, NativeKind::Resize);
        let (log, watcher) = recorder();
        let _sub = sizes.subscribe(&el, watcher);

        dom.set_style(&el, "color", "red");
        dom.deliver();
        assert!(log.borrow().is_empty(), "size-neutral style write is silent");
        dom.set_intrinsic_size(el, Size::new(10.0, 40.0));
        dom.deliver();
        assert_eq!(*log.borrow(), [Change::Size(Size::new(10.0, 40.0))], "new size reported");
    }

    #[test]
    fn sync_resize_delivers_inside_the_write() {
        let dom = MemoryDom::new();
        dom.set_sync_resize(true);
        let el = dom.create_block(Size::new(10.0, 10.0));
        let sizes = registry(&dom, NativeKind::Intersection);
        let (log, watcher) = recorder();
        let _sub = sizes.subscribe(&el, watcher);
        dom.set_style(&el, "height", "25px");
        assert_eq!(*log.borrow(), [Change::Size(Size::new(10.0, 25.0))], "delivered synchronously");
    }

    #[test]
    fn dropping_the_registry_removes_the_observer() {
        let dom = MemoryDom::new();
        let attrs = registry(&dom, NativeKind::Attributes);
        assert_eq!(dom.observer_count(), 1, "observer slot created");
        drop(attrs);
        assert_eq!(dom.observer_count(), 0, "slot released with the native");
    }
}
