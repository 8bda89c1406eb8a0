// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The public instance facade.
//!
//! An [`Instance`] is a cheap `Rc` handle to one wrapped target. It owns the
//! [`Structure`], the observation [`Subscription`]s, and a [`Reconciler`].
//! Observer callbacks hold only a `Weak` reference, so an instance that is
//! dropped without [`destroy`](Instance::destroy) releases its natives but
//! leaves the DOM as it is.

mod cycle;
mod state;

pub use cycle::CycleError;
pub use state::{Event, State, UpdateChanges};

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use understory_dirty::Channel;

use crate::channel;
use crate::environment::Environment;
use crate::observe::{Change, Mutation, Subscription};
use crate::options::{OptionChanges, Options, PartialOptions};
use crate::reconcile::{Reconciler, TriggerOutcome};
use crate::runtime::{CreateError, NodeOf, Observers, Platform};
use crate::structure::{Elements, ElementsConfig, Structure};
use crate::trace::{EchoDroppedEvent, TraceSink, Tracer, TriggerEvent};

use state::{Measured, QueuedEvent};

/// An event listener.
pub type Listener<P> = Box<dyn FnMut(&Instance<P>, &Event<'_>)>;

/// Identifies a listener for [`Instance::off`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Subscriptions<N> {
    host_size: Option<Subscription>,
    host_attributes: Option<Subscription>,
    content_tree: Option<(N, Subscription)>,
    content_size: Vec<(N, Subscription)>,
}

impl<N> Default for Subscriptions<N> {
    fn default() -> Self {
        Self {
            host_size: None,
            host_attributes: None,
            content_tree: None,
            content_size: Vec::new(),
        }
    }
}

struct Listeners<P: Platform> {
    entries: Vec<(ListenerId, Listener<P>)>,
    next: u64,
    /// Set while listeners are out being called.
    dispatching: bool,
    removed: Vec<ListenerId>,
    /// Events raised while dispatching, delivered once the current one is.
    queued: Vec<QueuedEvent>,
}

pub(crate) struct Inner<P: Platform> {
    platform: Rc<P>,
    env: Rc<Environment>,
    observers: Rc<Observers<NodeOf<P>>>,
    reconciler: Reconciler,
    target: NodeOf<P>,
    options: RefCell<Options>,
    pending_options: Cell<OptionChanges>,
    pending_elements: RefCell<Option<ElementsConfig<NodeOf<P>>>>,
    structure: RefCell<Option<Structure<NodeOf<P>>>>,
    elements: RefCell<Elements<NodeOf<P>>>,
    measured: RefCell<Measured>,
    subscriptions: RefCell<Subscriptions<NodeOf<P>>>,
    listeners: RefCell<Listeners<P>>,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
    echoes: Cell<u32>,
    destroyed: Cell<bool>,
}

/// A wrapped target.
pub struct Instance<P: Platform> {
    inner: Rc<Inner<P>>,
}

impl<P: Platform> Clone for Instance<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: Platform> PartialEq for Instance<P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P: Platform> Instance<P> {
    pub(crate) fn create(
        platform: Rc<P>,
        env: Rc<Environment>,
        observers: Rc<Observers<NodeOf<P>>>,
        target: &NodeOf<P>,
        options: Options,
        elements: &ElementsConfig<NodeOf<P>>,
        listeners: Vec<Listener<P>>,
        canceled: bool,
    ) -> Result<Self, CreateError> {
        let dom = platform.dom();
        let structure = if canceled {
            None
        } else {
            Some(Structure::build(dom, target, elements)?)
        };
        let snapshot = structure.as_ref().map_or_else(
            || placeholder_elements(target),
            Structure::elements,
        );
        let reconciler = Reconciler::new(platform.ticker());
        let entries = listeners
            .into_iter()
            .enumerate()
            .map(|(i, l)| (ListenerId(i as u64), l))
            .collect::<Vec<_>>();
        let next = entries.len() as u64;

        let inner = Rc::new(Inner {
            platform,
            env,
            observers,
            reconciler,
            target: target.clone(),
            options: RefCell::new(options),
            pending_options: Cell::new(OptionChanges::default()),
            pending_elements: RefCell::new(None),
            structure: RefCell::new(structure),
            elements: RefCell::new(snapshot),
            measured: RefCell::new(Measured::default()),
            subscriptions: RefCell::new(Subscriptions::default()),
            listeners: RefCell::new(Listeners {
                entries,
                next,
                dispatching: false,
                removed: Vec::new(),
                queued: Vec::new(),
            }),
            sink: RefCell::new(None),
            echoes: Cell::new(0),
            destroyed: Cell::new(false),
        });
        let instance = Self { inner };

        if canceled {
            tracing::debug!(target = ?instance.inner.target, "instance creation canceled");
            instance.inner.destroyed.set(true);
            instance.inner.reconciler.shutdown();
            instance.emit(&Event::Destroyed { canceled: true });
            instance.inner.listeners.borrow_mut().entries.clear();
            return Err(CreateError::Canceled);
        }

        let weak = Rc::downgrade(&instance.inner);
        instance.inner.reconciler.set_on_tick(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.run(false);
            }
        }));
        instance.subscribe_host();
        instance.sync_content_subscriptions();

        instance.run(true);
        instance.emit(&Event::Initialized);
        tracing::debug!(target = ?instance.inner.target, "instance initialized");
        Ok(instance)
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> Options {
        self.inner.options.borrow().clone()
    }

    /// Merges `partial` into the options and returns the result.
    ///
    /// Changes that affect what a cycle computes schedule an update.
    pub fn set_options(&self, partial: &PartialOptions) -> Options {
        let (changes, options) = {
            let mut options = self.inner.options.borrow_mut();
            let changes = options.apply(partial);
            (changes, options.clone())
        };
        if changes.any() && !self.is_destroyed() {
            let mut pending = self.inner.pending_options.get();
            pending.merge(&changes);
            self.inner.pending_options.set(pending);
            if changes.needs_cycle() {
                self.trigger(channel::OPTIONS);
            }
        }
        options
    }

    /// Requests a role reconfiguration, applied at the next cycle.
    pub fn set_elements(&self, elements: ElementsConfig<NodeOf<P>>) {
        if self.is_destroyed() {
            return;
        }
        *self.inner.pending_elements.borrow_mut() = Some(elements);
        self.trigger(channel::OPTIONS);
    }

    /// Returns the last computed state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.measured.borrow().state(self.is_destroyed())
    }

    /// Returns the structure's elements.
    ///
    /// After destroy this is the last structure the instance had.
    #[must_use]
    pub fn elements(&self) -> Elements<NodeOf<P>> {
        self.inner.elements.borrow().clone()
    }

    /// Returns the target element.
    #[must_use]
    pub fn target(&self) -> &NodeOf<P> {
        &self.inner.target
    }

    /// Runs an update cycle now.
    ///
    /// A pending scheduled run is folded into this one. With `force`, the
    /// cycle emits `Updated` even if nothing changed. Returns `true` if
    /// `Updated` was emitted; called from inside a running cycle it returns
    /// `false` and requests a follow-up run instead.
    pub fn update(&self, force: bool) -> bool {
        if self.is_destroyed() {
            return false;
        }
        if self.inner.reconciler.is_running() {
            self.inner.reconciler.request_follow_up();
            return false;
        }
        self.run(force)
    }

    /// Tears the instance down and restores the target.
    ///
    /// Unsubscribes every observer and cancels a pending tick synchronously.
    /// Calling it again, or from inside a listener, is fine.
    pub fn destroy(&self) {
        if self.inner.destroyed.replace(true) {
            return;
        }
        self.inner.reconciler.shutdown();
        let subscriptions = core::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
        if let Some(structure) = self.inner.structure.borrow_mut().take() {
            structure.destroy(self.inner.platform.dom());
        }
        tracing::debug!(target = ?self.inner.target, "instance destroyed");
        self.emit(&Event::Destroyed { canceled: false });
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.entries.clear();
        listeners.removed.clear();
        drop(listeners);
        if let Ok(mut sink) = self.inner.sink.try_borrow_mut() {
            *sink = None;
        }
    }

    /// Returns `true` after [`destroy`](Self::destroy).
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// Adds an event listener.
    pub fn on(&self, listener: impl FnMut(&Self, &Event<'_>) + 'static) -> ListenerId {
        let mut listeners = self.inner.listeners.borrow_mut();
        let id = ListenerId(listeners.next);
        listeners.next += 1;
        listeners.entries.push((id, Box::new(listener)));
        id
    }

    /// Removes an event listener. Returns `false` if it was not attached.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        if listeners.dispatching {
            listeners.removed.push(id);
            return true;
        }
        let before = listeners.entries.len();
        listeners.entries.retain(|(l, _)| *l != id);
        listeners.entries.len() != before
    }

    /// Installs (or removes) a trace sink for cycle instrumentation.
    pub fn set_trace_sink(&self, sink: Option<Box<dyn TraceSink>>) {
        match self.inner.sink.try_borrow_mut() {
            Ok(mut slot) => *slot = sink,
            Err(_) => tracing::warn!("trace sink replaced while in use; ignored"),
        }
    }

    /// Returns the reconciler, for inspection.
    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.inner.reconciler
    }

    fn trigger(&self, channel: Channel) -> TriggerOutcome {
        Inner::trigger(&self.inner, channel)
    }

    /// Calls every listener with `event`.
    ///
    /// Listeners are moved out while they run, so they may add or remove
    /// listeners, update, or destroy. An event raised from inside a listener
    /// is queued and delivered, in order, after the current one.
    fn emit(&self, event: &Event<'_>) {
        let mut entries = {
            let mut listeners = self.inner.listeners.borrow_mut();
            if listeners.dispatching {
                listeners.queued.push(QueuedEvent::from(event));
                return;
            }
            listeners.dispatching = true;
            core::mem::take(&mut listeners.entries)
        };
        self.dispatch(&mut entries, event);
        loop {
            let next = {
                let mut listeners = self.inner.listeners.borrow_mut();
                if listeners.queued.is_empty() {
                    None
                } else {
                    Some(listeners.queued.remove(0))
                }
            };
            let Some(queued) = next else {
                break;
            };
            self.dispatch(&mut entries, &queued.as_event());
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        listeners.dispatching = false;
        if !self.is_destroyed() {
            listeners.entries = entries;
        }
    }

    /// Calls `entries` with `event`, then folds in listeners added or
    /// removed meanwhile.
    fn dispatch(&self, entries: &mut Vec<(ListenerId, Listener<P>)>, event: &Event<'_>) {
        for (_, listener) in entries.iter_mut() {
            listener(self, event);
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        let removed = core::mem::take(&mut listeners.removed);
        // Listeners added during dispatch come after the existing ones.
        entries.append(&mut listeners.entries);
        entries.retain(|(id, _)| !removed.contains(id));
    }

    fn subscribe_host(&self) {
        let observers = &self.inner.observers;
        let target = &self.inner.target;

        let weak = Rc::downgrade(&self.inner);
        let host_size = observers.size.subscribe(target, move |change| {
            if matches!(change, Change::Size(_)) {
                Inner::signal(&weak, channel::HOST_SIZE);
            }
        });

        let weak = Rc::downgrade(&self.inner);
        let host_attributes = observers.attributes.subscribe(target, move |change| {
            let Change::Mutated(Mutation::Attribute(name)) = change else {
                return;
            };
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Options mid-update count as watching everything.
            let watched = match inner.options.try_borrow() {
                Ok(options) => options.watches_attribute(name),
                Err(_) => true,
            };
            if watched {
                Inner::trigger(&inner, channel::HOST_ATTRIBUTES);
            }
        });

        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        subscriptions.host_size = Some(host_size);
        subscriptions.host_attributes = Some(host_attributes);
    }

    /// Points the content watchers at the current innermost role.
    ///
    /// The tree watcher observes the innermost role's subtree. Sizes are
    /// observed on the content element when present, else on each payload
    /// node, since the viewport's own size is fixed by the host.
    fn sync_content_subscriptions(&self) {
        let Some((innermost, sized)) = self.inner.structure.borrow().as_ref().map(|s| {
            let innermost = s.innermost().clone();
            let sized = match s.content() {
                Some(content) => alloc::vec![content.clone()],
                None => self.inner.platform.dom().children(&innermost),
            };
            (innermost, sized)
        }) else {
            return;
        };
        let observers = &self.inner.observers;
        let mut subscriptions = self.inner.subscriptions.borrow_mut();

        if subscriptions.content_tree.as_ref().map(|(n, _)| n) != Some(&innermost) {
            let weak = Rc::downgrade(&self.inner);
            let subscription = observers.tree.subscribe(&innermost, move |change| {
                if matches!(
                    change,
                    Change::Mutated(Mutation::ChildList | Mutation::CharacterData)
                ) {
                    Inner::signal(&weak, channel::CONTENT_TREE);
                }
            });
            subscriptions.content_tree = Some((innermost, subscription));
        }

        subscriptions.content_size.retain(|(n, _)| sized.contains(n));
        for node in sized {
            if subscriptions.content_size.iter().any(|(n, _)| *n == node) {
                continue;
            }
            let weak = Rc::downgrade(&self.inner);
            let subscription = observers.size.subscribe(&node, move |change| {
                if matches!(change, Change::Size(_)) {
                    Inner::signal(&weak, channel::CONTENT_SIZE);
                }
            });
            subscriptions.content_size.push((node, subscription));
        }
    }

    fn with_tracer(&self, f: impl FnOnce(&mut Tracer<'_>)) {
        Inner::with_tracer(&self.inner, f);
    }
}

impl<P: Platform> Inner<P> {
    fn signal(weak: &Weak<Self>, channel: Channel) {
        if let Some(inner) = weak.upgrade() {
            Self::trigger(&inner, channel);
        }
    }

    fn trigger(inner: &Rc<Self>, channel: Channel) -> TriggerOutcome {
        let outcome = inner.reconciler.trigger(channel);
        if outcome == TriggerOutcome::Suppressed {
            inner.echoes.set(inner.echoes.get() + 1);
        }
        Self::with_tracer(inner, |tracer| {
            let timestamp = inner.platform.now();
            tracer.trigger(&TriggerEvent {
                channel,
                outcome,
                timestamp,
            });
            if outcome == TriggerOutcome::Suppressed {
                tracer.echo_dropped(&EchoDroppedEvent {
                    cycle: inner.reconciler.cycles(),
                    channel,
                    timestamp,
                });
            }
        });
        outcome
    }

    fn with_tracer(inner: &Rc<Self>, f: impl FnOnce(&mut Tracer<'_>)) {
        let Ok(mut slot) = inner.sink.try_borrow_mut() else {
            return;
        };
        if let Some(sink) = slot.as_mut() {
            let mut tracer = Tracer::new(&mut **sink);
            f(&mut tracer);
        }
    }
}

fn placeholder_elements<N: Clone>(target: &N) -> Elements<N> {
    Elements {
        host: target.clone(),
        padding: None,
        viewport: target.clone(),
        content: None,
        scrollbar_horizontal: None,
        scrollbar_vertical: None,
    }
}

impl<P: Platform> fmt::Debug for Instance<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("target", &self.inner.target)
            .field("reconciler", &self.inner.reconciler)
            .field("destroyed", &self.inner.destroyed.get())
            .finish_non_exhaustive()
    }
}
