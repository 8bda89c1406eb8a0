// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observation adapters.
//!
//! Native observers (resize, intersection, mutation) are expensive and
//! behave differently per browser. This module normalizes them behind one
//! contract: a [`Registry`] per observer kind, shared by every instance,
//! keyed by observed node and reference-counted by watcher.
//!
//! ```text
//!   NativeObserver ──Signal──► SignalSink ──► Registry::dispatch
//!                                                 │ dedupe sizes, measure pokes
//!                                                 ▼
//!                                   Change ──► watcher closures
//! ```
//!
//! Natives push raw [`Signal`]s; watchers only ever see a [`Change`], either
//! a `{width, height}` size or a generic mutation. Which native backs the
//! size registry is picked once from [`Capabilities`] using the ranked
//! [`SizeStrategy`] fallback; a missing primitive yields a no-op registry,
//! never an error.

mod polling;
mod registry;
mod strategy;

pub use polling::PollingObserver;
pub use registry::{Measure, Registry, SignalSink, Subscription};
pub use strategy::{Capabilities, CapabilityOverrides, MutationStrategy, SizeStrategy, Strategies};

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Size;

/// A normalized mutation record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// An attribute on the observed node changed.
    Attribute(String),
    /// Children were added or removed somewhere in the observed subtree.
    ChildList,
    /// Text changed somewhere in the observed subtree.
    CharacterData,
}

/// What a watcher receives.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    /// The observed node's border-box size changed.
    Size(Size),
    /// The observed node or subtree mutated.
    Mutated(Mutation),
}

/// What a native observer reports.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// The native measured the node.
    Size(Size),
    /// The node may have resized; the registry measures it.
    Poke,
    /// The node or subtree mutated.
    Mutated(Mutation),
}

/// The native primitive a registry wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// `ResizeObserver`-like: reports sizes.
    Resize,
    /// `IntersectionObserver`-based size polyfill: reports pokes.
    Intersection,
    /// Attribute mutations on the observed node itself.
    Attributes,
    /// Child list and character data mutations in the observed subtree.
    Tree,
}

/// A platform observer multiplexed by a [`Registry`].
///
/// Implementations report through the [`SignalSink`] they were created with.
/// They are only told about the first watcher of a node and the removal of
/// its last one.
pub trait NativeObserver<N> {
    /// Starts observing `node`.
    fn observe(&mut self, node: &N);

    /// Stops observing `node`.
    fn unobserve(&mut self, node: &N);

    /// Returns records the platform has queued but not yet delivered.
    ///
    /// Mutation observers can hand over pending records synchronously; the
    /// reconciler uses this to drain the echo of its own writes.
    fn take_records(&mut self) -> Vec<(N, Signal)> {
        Vec::new()
    }
}
