// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared, reference-counted watcher registry.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Size;

use super::{Change, NativeKind, NativeObserver, Signal};

/// Measures a node's border-box size.
pub type Measure<N> = Box<dyn Fn(&N) -> Size>;

type Watcher = Rc<dyn Fn(&Change)>;

struct Entry<N> {
    node: N,
    /// Last size reported for this node (or measured at first subscribe).
    last_size: Option<Size>,
    watchers: Vec<(u64, Watcher)>,
}

/// Multiplexes one native observer across many logical watchers.
///
/// Entries are keyed by node and hold a watcher list; the native is told to
/// observe a node when its first watcher subscribes and to stop when the last
/// one leaves, at which point the entry is removed. Size registries (those
/// created with a [`Measure`]) record a baseline size at first subscribe and
/// only forward sizes that differ from the last one forwarded.
pub struct Registry<N: 'static> {
    kind: NativeKind,
    native: RefCell<Option<Box<dyn NativeObserver<N>>>>,
    measure: Option<Measure<N>>,
    entries: RefCell<Vec<Entry<N>>>,
    next_watcher: Cell<u64>,
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> Registry<N> {
    /// Creates a registry whose native is built by `native`.
    ///
    /// The factory receives the sink the native must report through. If it
    /// returns `None`, the registry is a no-op: subscriptions succeed and are
    /// never notified.
    pub fn new(
        kind: NativeKind,
        measure: Option<Measure<N>>,
        native: impl FnOnce(SignalSink<N>) -> Option<Box<dyn NativeObserver<N>>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak| {
            let native = native(SignalSink {
                registry: weak.clone(),
            });
            Self {
                kind,
                native: RefCell::new(native),
                measure,
                entries: RefCell::new(Vec::new()),
                next_watcher: Cell::new(0),
            }
        })
    }

    /// Creates a registry that never observes anything.
    #[must_use]
    pub fn noop(kind: NativeKind) -> Rc<Self> {
        Self::new(kind, None, |_| None)
    }

    /// Returns the native kind this registry wraps.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NativeKind {
        self.kind
    }

    /// Returns `true` if there is no native behind this registry.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.native.borrow().is_none()
    }

    /// Returns the number of nodes currently observed.
    #[must_use]
    pub fn observed_len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns the number of watchers attached to `node`.
    #[must_use]
    pub fn watcher_count(&self, node: &N) -> usize {
        self.entries
            .borrow()
            .iter()
            .find(|e| e.node == *node)
            .map_or(0, |e| e.watchers.len())
    }

    /// Attaches `on_change` to `node`.
    ///
    /// The returned handle detaches it on [`unsubscribe`](Subscription::unsubscribe)
    /// or drop.
    pub fn subscribe(
        self: &Rc<Self>,
        node: &N,
        on_change: impl Fn(&Change) + 'static,
    ) -> Subscription {
        if self.is_noop() {
            return Subscription::inert();
        }
        let id = self.next_watcher.get();
        self.next_watcher.set(id + 1);

        let first = {
            let mut entries = self.entries.borrow_mut();
            if let Some(entry) = entries.iter_mut().find(|e| e.node == *node) {
                entry.watchers.push((id, Rc::new(on_change)));
                false
            } else {
                let last_size = self.measure.as_ref().map(|m| m(node));
                entries.push(Entry {
                    node: node.clone(),
                    last_size,
                    watchers: alloc::vec![(id, Rc::new(on_change) as Watcher)],
                });
                true
            }
        };
        if first {
            tracing::trace!(kind = ?self.kind, ?node, "observing node");
            if let Some(native) = self.native.borrow_mut().as_mut() {
                native.observe(node);
            }
        }

        let registry: Weak<dyn Release> = Rc::downgrade(self);
        Subscription {
            registry: Some(registry),
            id,
        }
    }

    /// Routes a native signal to the node's watchers.
    ///
    /// Unknown nodes are ignored. Watchers run after all internal borrows are
    /// released, so they may subscribe or unsubscribe re-entrantly.
    pub fn dispatch(&self, node: &N, signal: Signal) {
        let routed = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.iter_mut().find(|e| e.node == *node) else {
                return;
            };
            let change = match signal {
                Signal::Size(size) => Self::dedupe(entry, size),
                Signal::Poke => match &self.measure {
                    Some(measure) => Self::dedupe(entry, measure(node)),
                    None => None,
                },
                Signal::Mutated(mutation) => Some(Change::Mutated(mutation)),
            };
            change.map(|change| {
                let watchers: Vec<Watcher> =
                    entry.watchers.iter().map(|(_, w)| Rc::clone(w)).collect();
                (change, watchers)
            })
        };
        if let Some((change, watchers)) = routed {
            for watcher in watchers {
                watcher(&change);
            }
        }
    }

    /// Delivers records the native has queued, synchronously.
    pub fn take_records(&self) {
        let records = match self.native.try_borrow_mut() {
            Ok(mut native) => native.as_mut().map(|n| n.take_records()).unwrap_or_default(),
            Err(_) => return,
        };
        for (node, signal) in records {
            self.dispatch(&node, signal);
        }
    }

    fn dedupe(entry: &mut Entry<N>, size: Size) -> Option<Change> {
        if entry.last_size == Some(size) {
            return None;
        }
        entry.last_size = Some(size);
        Some(Change::Size(size))
    }
}

impl<N: 'static> fmt::Debug for Registry<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("noop", &self.native.borrow().is_none())
            .field("observed", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Type-erased watcher removal, so [`Subscription`] is not generic.
trait Release {
    fn release(&self, id: u64);
}

impl<N: PartialEq + fmt::Debug + 'static> Release for Registry<N> {
    fn release(&self, id: u64) {
        let emptied = {
            let mut entries = self.entries.borrow_mut();
            let Some(pos) = entries
                .iter()
                .position(|e| e.watchers.iter().any(|(w, _)| *w == id))
            else {
                return;
            };
            entries[pos].watchers.retain(|(w, _)| *w != id);
            if entries[pos].watchers.is_empty() {
                Some(entries.remove(pos).node)
            } else {
                None
            }
        };
        let Some(node) = emptied else {
            return;
        };
        tracing::trace!(kind = ?self.kind, ?node, "last watcher left");
        match self.native.try_borrow_mut() {
            Ok(mut native) => {
                if let Some(native) = native.as_mut() {
                    native.unobserve(&node);
                }
            }
            Err(_) => {
                tracing::warn!(kind = ?self.kind, ?node, "native busy; node stays observed");
            }
        }
    }
}

/// The channel a [`NativeObserver`] reports through.
///
/// Holds the registry weakly: signals after the registry is gone are dropped.
pub struct SignalSink<N: 'static> {
    registry: Weak<Registry<N>>,
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> SignalSink<N> {
    /// Forwards a signal for `node`.
    pub fn signal(&self, node: &N, signal: Signal) {
        if let Some(registry) = self.registry.upgrade() {
            registry.dispatch(node, signal);
        }
    }

    /// Returns `true` while the registry is alive.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.registry.strong_count() > 0
    }
}

impl<N: 'static> Clone for SignalSink<N> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<N: 'static> fmt::Debug for SignalSink<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSink")
            .field("live", &(self.registry.strong_count() > 0))
            .finish()
    }
}

/// A watcher's attachment to a [`Registry`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Option<Weak<dyn Release>>,
    id: u64,
}

impl Subscription {
    /// A subscription that is attached to nothing.
    pub fn inert() -> Self {
        Self {
            registry: None,
            id: 0,
        }
    }

    /// Returns `true` if the subscription is attached to a live registry.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|r| r.strong_count() > 0)
    }

    /// Detaches the watcher.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|w| w.upgrade()) {
            registry.release(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    use crate::observe::Mutation;

    #[derive(Default)]
    struct Log {
        observed: Vec<u32>,
        unobserved: Vec<u32>,
        queued: Vec<(u32, Signal)>,
    }

    struct FakeNative(Rc<RefCell<Log>>);

    impl NativeObserver<u32> for FakeNative {
        fn observe(&mut self, node: &u32) {
            self.0.borrow_mut().observed.push(*node);
        }
        fn unobserve(&mut self, node: &u32) {
            self.0.borrow_mut().unobserved.push(*node);
        }
        fn take_records(&mut self) -> Vec<(u32, Signal)> {
            core::mem::take(&mut self.0.borrow_mut().queued)
        }
    }

    fn fake(kind: NativeKind, measure: Option<Measure<u32>>) -> (Rc<Registry<u32>>, Rc<RefCell<Log>>, Rc<RefCell<Option<SignalSink<u32>>>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let sink_slot = Rc::new(RefCell::new(None));
        let (l, s) = (Rc::clone(&log), Rc::clone(&sink_slot));
        let registry = Registry::new(kind, measure, move |sink| {
            *s.borrow_mut() = Some(sink);
            Some(Box::new(FakeNative(l)) as Box<dyn NativeObserver<u32>>)
        });
        (registry, log, sink_slot)
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&Change) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move |_: &Change| h.set(h.get() + 1))
    }

    #[test]
    fn native_observes_once_per_node_and_releases_with_last_watcher() {
        let (registry, log, _) = fake(NativeKind::Attributes, None);
        let a = registry.subscribe(&7, |_| {});
        let b = registry.subscribe(&7, |_| {});
        assert_eq!(log.borrow().observed, vec![7], "second watcher shares the native");
        assert_eq!(registry.watcher_count(&7), 2, "two watchers on one entry");

        a.unsubscribe();
        assert!(log.borrow().unobserved.is_empty(), "one watcher still attached");
        drop(b);
        assert_eq!(log.borrow().unobserved, vec![7], "last watcher tears down the native");
        assert_eq!(registry.observed_len(), 0, "empty entries are removed");
    }

    #[test]
    fn size_signals_are_deduped_against_baseline() {
        let measured = Rc::new(Cell::new(Size::new(100.0, 50.0)));
        let m = Rc::clone(&measured);
        let (registry, _, sink) = fake(NativeKind::Resize, Some(Box::new(move |_| m.get())));
        let (hits, watcher) = counter();
        let _sub = registry.subscribe(&1, watcher);
        let sink = sink.borrow().clone().unwrap();

        sink.signal(&1, Signal::Size(Size::new(100.0, 50.0)));
        assert_eq!(hits.get(), 0, "baseline size is not a change");
        sink.signal(&1, Signal::Size(Size::new(100.0, 60.0)));
        sink.signal(&1, Signal::Size(Size::new(100.0, 60.0)));
        assert_eq!(hits.get(), 1, "repeated size is reported once");

        measured.set(Size::new(80.0, 60.0));
        sink.signal(&1, Signal::Poke);
        assert_eq!(hits.get(), 2, "poke measures and reports the new size");
        sink.signal(&1, Signal::Poke);
        assert_eq!(hits.get(), 2, "poke without a size change is dropped");
    }

    #[test]
    fn mutations_reach_every_watcher() {
        let (registry, _, sink) = fake(NativeKind::Attributes, None);
        let (first, w1) = counter();
        let (second, w2) = counter();
        let _a = registry.subscribe(&3, w1);
        let _b = registry.subscribe(&3, w2);
        let sink = sink.borrow().clone().unwrap();
        sink.signal(&3, Signal::Mutated(Mutation::Attribute(String::from("class"))));
        sink.signal(&4, Signal::Mutated(Mutation::ChildList));
        assert_eq!((first.get(), second.get()), (1, 1), "unknown nodes are ignored");
    }

    #[test]
    fn watcher_may_unsubscribe_itself_during_dispatch() {
        let (registry, log, sink) = fake(NativeKind::Tree, None);
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let s = Rc::clone(&slot);
        let sub = registry.subscribe(&9, move |_| {
            if let Some(sub) = s.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);
        sink.borrow().clone().unwrap().signal(&9, Signal::Mutated(Mutation::ChildList));
        assert_eq!(log.borrow().unobserved, vec![9], "re-entrant unsubscribe releases the node");
    }

    #[test]
    fn take_records_dispatches_queued_signals() {
        let (registry, log, _) = fake(NativeKind::Attributes, None);
        let (hits, watcher) = counter();
        let _sub = registry.subscribe(&2, watcher);
        log.borrow_mut()
            .queued
            .push((2, Signal::Mutated(Mutation::Attribute(String::from("style")))));
        registry.take_records();
        assert_eq!(hits.get(), 1, "queued record delivered synchronously");
    }

    #[test]
    fn noop_registry_hands_out_inert_subscriptions() {
        let registry = Registry::<u32>::noop(NativeKind::Resize);
        let sub = registry.subscribe(&1, |_| {});
        assert!(registry.is_noop(), "no native behind it");
        assert!(!sub.is_active(), "inert subscription");
        assert_eq!(registry.observed_len(), 0, "nothing recorded");
    }

    #[test]
    fn subscriptions_outliving_the_registry_are_harmless() {
        let (registry, _, sink) = fake(NativeKind::Attributes, None);
        let sub = registry.subscribe(&5, |_| {});
        let sink = sink.borrow().clone().unwrap();
        drop(registry);
        assert!(!sub.is_active(), "registry is gone");
        assert!(!sink.is_live(), "sink sees the registry is gone");
        sink.signal(&5, Signal::Mutated(Mutation::ChildList));
        drop(sub);
    }
}
