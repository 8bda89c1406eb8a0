// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform seam and the per-document runtime.
//!
//! A [`Platform`] bundles what the engine needs from a host environment: a
//! [`Dom`], capability detection, native observer construction, a frame
//! [`Ticker`], and a clock. The web backend implements it over `web_sys`;
//! [`MemoryPlatform`](crate::memory::MemoryPlatform) implements it headlessly.
//!
//! A [`Runtime`] owns the observation registries shared by every instance it
//! creates. Strategies are selected once, when the first instance needs them,
//! and cached for the runtime's lifetime.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::dom::Dom;
use crate::environment::Environment;
use crate::instance::{Instance, Listener};
use crate::observe::{
    Capabilities, MutationStrategy, NativeKind, NativeObserver, PollingObserver, Registry,
    SignalSink, SizeStrategy, Strategies,
};
use crate::options::PartialOptions;
use crate::structure::{BuildError, ElementsConfig};
use crate::tick::Ticker;
use crate::time::HostTime;

/// The node handle type of a platform's DOM.
pub type NodeOf<P> = <<P as Platform>::Dom as Dom>::Node;

/// Everything the engine needs from a host environment.
pub trait Platform: 'static {
    /// The document implementation.
    type Dom: Dom + Clone + 'static;

    /// Returns the document.
    fn dom(&self) -> &Self::Dom;

    /// Reports which observation primitives exist.
    fn capabilities(&self) -> Capabilities;

    /// Creates a native observer of `kind` reporting through `sink`.
    ///
    /// Returns `None` if the primitive is unavailable; the registry then
    /// falls back or becomes a no-op.
    fn native_observer(
        &self,
        kind: NativeKind,
        sink: SignalSink<NodeOf<Self>>,
    ) -> Option<Box<dyn NativeObserver<NodeOf<Self>>>>;

    /// Returns a new, independent ticker.
    ///
    /// Every call must return a distinct ticker: a pending request on one
    /// never replaces a request on another.
    fn ticker(&self) -> Rc<dyn Ticker>;

    /// Returns the current host time.
    fn now(&self) -> HostTime;
}

/// Why an instance could not be created.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    /// The structure could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Creation was canceled by an initialization cancel condition.
    #[error("instance creation canceled: native scrollbars are already overlaid")]
    Canceled,
}

/// The shared registries for one runtime.
pub(crate) struct Observers<N: 'static> {
    pub(crate) strategies: Strategies,
    pub(crate) size: Rc<Registry<N>>,
    pub(crate) attributes: Rc<Registry<N>>,
    pub(crate) tree: Rc<Registry<N>>,
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> Observers<N> {
    /// Delivers every registry's queued records synchronously.
    pub(crate) fn take_records(&self) {
        self.size.take_records();
        self.attributes.take_records();
        self.tree.take_records();
    }
}

impl<N: 'static> fmt::Debug for Observers<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("strategies", &self.strategies)
            .field("size", &self.size)
            .field("attributes", &self.attributes)
            .field("tree", &self.tree)
            .finish()
    }
}

/// Per-instance creation parameters.
pub struct InstanceInit<P: Platform> {
    /// Merged over the environment's default options.
    pub options: PartialOptions,
    /// Role configuration; `None` uses the environment's element defaults.
    pub elements: Option<ElementsConfig<NodeOf<P>>>,
    /// Listeners attached before the first cycle, so they see `Initialized`.
    pub listeners: Vec<Listener<P>>,
}

impl<P: Platform> Default for InstanceInit<P> {
    fn default() -> Self {
        Self {
            options: PartialOptions::default(),
            elements: None,
            listeners: Vec::new(),
        }
    }
}

impl<P: Platform> InstanceInit<P> {
    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: PartialOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the role configuration.
    #[must_use]
    pub fn with_elements(mut self, elements: ElementsConfig<NodeOf<P>>) -> Self {
        self.elements = Some(elements);
        self
    }

    /// Adds a listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Listener<P>) -> Self {
        self.listeners.push(listener);
        self
    }
}

impl<P: Platform> fmt::Debug for InstanceInit<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceInit")
            .field("options", &self.options)
            .field("elements", &self.elements)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Creates instances on one platform and shares their observers.
pub struct Runtime<P: Platform> {
    platform: Rc<P>,
    env: Rc<Environment>,
    observers: RefCell<Option<Rc<Observers<NodeOf<P>>>>>,
}

impl<P: Platform> Runtime<P> {
    /// Creates a runtime over `platform` reading defaults from `env`.
    pub fn new(platform: P, env: Rc<Environment>) -> Self {
        Self {
            platform: Rc::new(platform),
            env,
            observers: RefCell::new(None),
        }
    }

    /// Returns the platform.
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the environment.
    #[must_use]
    pub fn environment(&self) -> &Rc<Environment> {
        &self.env
    }

    /// Returns the selected strategies, if an instance has selected them.
    #[must_use]
    pub fn strategies(&self) -> Option<Strategies> {
        self.observers.borrow().as_ref().map(|o| o.strategies)
    }

    /// Wraps `target` and runs the first update cycle.
    ///
    /// # Errors
    ///
    /// [`CreateError::Canceled`] if an initialization cancel condition holds,
    /// or [`CreateError::Build`] if the structure cannot be built.
    pub fn create(&self, target: &NodeOf<P>, init: InstanceInit<P>) -> Result<Instance<P>, CreateError> {
        let initialization = self.env.default_initialization();
        let options = self.env.default_options().merged(&init.options);
        let elements = init
            .elements
            .unwrap_or_else(|| ElementsConfig::from_defaults(&initialization.elements));
        let canceled = initialization.cancel.native_scrollbars_overlaid
            && self
                .platform
                .capabilities()
                .with_overrides(&self.env.capability_overrides())
                .native_scrollbars_overlaid();

        Instance::create(
            Rc::clone(&self.platform),
            Rc::clone(&self.env),
            self.observers(),
            target,
            options,
            &elements,
            init.listeners,
            canceled,
        )
    }

    /// Returns the shared registries, selecting strategies on first use.
    pub(crate) fn observers(&self) -> Rc<Observers<NodeOf<P>>> {
        if let Some(observers) = self.observers.borrow().as_ref() {
            return Rc::clone(observers);
        }
        let strategies = Strategies::select(self.platform.capabilities(), &self.env.capability_overrides());
        tracing::debug!(size = ?strategies.size, mutation = ?strategies.mutation, "observation strategies selected");

        let dom = self.platform.dom().clone();
        let measure = Box::new(move |node: &NodeOf<P>| dom.metrics(node).offset);
        let platform = Rc::clone(&self.platform);
        let size = Registry::new(NativeKind::Resize, Some(measure), |sink| match strategies.size {
            SizeStrategy::Resize => platform.native_observer(NativeKind::Resize, sink),
            SizeStrategy::Intersection => platform.native_observer(NativeKind::Intersection, sink),
            SizeStrategy::Polling => Some(Box::new(PollingObserver::new(platform.ticker(), sink))),
            SizeStrategy::Noop => None,
        });
        let mutation = |kind| match strategies.mutation {
            MutationStrategy::Native => {
                let platform = Rc::clone(&self.platform);
                Registry::new(kind, None, move |sink| platform.native_observer(kind, sink))
            }
            MutationStrategy::Noop => Registry::noop(kind),
        };
        let observers = Rc::new(Observers {
            strategies,
            size,
            attributes: mutation(NativeKind::Attributes),
            tree: mutation(NativeKind::Tree),
        });
        *self.observers.borrow_mut() = Some(Rc::clone(&observers));
        observers
    }
}

impl<P: Platform + fmt::Debug> fmt::Debug for Runtime<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("platform", &self.platform)
            .field("env", &self.env)
            .field("observers", &self.observers.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryPlatform;
    use crate::observe::CapabilityOverrides;

    #[test]
    fn strategies_are_selected_once() {
        let env = Rc::new(Environment::new());
        let runtime = Runtime::new(MemoryPlatform::new(), Rc::clone(&env));
        assert_eq!(runtime.strategies(), None, "nothing selected before first use");
        let first = runtime.observers();
        assert_eq!(first.strategies.size, SizeStrategy::Resize, "best strategy wins");

        env.set_capability_overrides(CapabilityOverrides {
            resize_observer: Some(false),
            ..CapabilityOverrides::default()
        });
        let second = runtime.observers();
        assert!(Rc::ptr_eq(&first, &second), "registries are shared");
        assert_eq!(second.strategies.size, SizeStrategy::Resize, "cached, not re-probed");
    }

    #[test]
    fn overrides_drive_the_fallback() {
        let env = Rc::new(Environment::new());
        env.set_capability_overrides(CapabilityOverrides {
            resize_observer: Some(false),
            intersection_observer: Some(false),
            mutation_observer: Some(false),
            ..CapabilityOverrides::default()
        });
        let runtime = Runtime::new(MemoryPlatform::new(), env);
        let observers = runtime.observers();
        assert_eq!(observers.strategies.size, SizeStrategy::Polling, "polling fallback");
        assert!(!observers.size.is_noop(), "polling backs the size registry");
        assert!(observers.attributes.is_noop(), "no mutation observer");
        assert!(observers.tree.is_noop(), "no mutation observer");
    }

    #[test]
    fn missing_primitives_yield_noop_registries() {
        let runtime = Runtime::new(
            MemoryPlatform::with_capabilities(Capabilities::NONE),
            Rc::new(Environment::new()),
        );
        let observers = runtime.observers();
        assert_eq!(observers.strategies.size, SizeStrategy::Noop, "nothing available");
        assert!(observers.size.is_noop(), "noop size registry");
    }
}
