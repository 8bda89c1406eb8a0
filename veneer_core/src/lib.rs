// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structure, observation, and update engine for DOM-overlay scrollbars.
//!
//! `veneer_core` wraps a target element in a generated structure (host,
//! padding, viewport, content, scrollbars), observes that structure for size,
//! attribute, and subtree changes, computes the viewport's overflow state, and
//! reconciles the structure's classes and styles with it. It is `no_std`
//! compatible (with `alloc`) and talks to the document only through the
//! [`Dom`](dom::Dom) trait, so the same engine runs in a browser and headless.
//!
//! # Architecture
//!
//! ```text
//!   native observers (resize / intersection / mutation / polling)
//!       │
//!       ▼
//!   Registry ──► Subscription callbacks ──► Reconciler::trigger(channel)
//!                                               │ coalesced into one tick
//!                                               ▼
//!   structure ─► padding ─► measure ─► compute ─► write ─► flush ─► emit
//!                                                   │
//!                 own writes echo back, suppressed ◄┘
//! ```
//!
//! **[`structure`]**: builds and tears down the wrapped skeleton. Every
//! class, attribute, and style the engine writes goes through a per-structure
//! ledger, so destroy restores the target exactly.
//!
//! **[`observe`]**: per-kind observation registries with one shared native
//! observer each, and capability-driven strategy selection with polling and
//! no-op fallbacks.
//!
//! **[`overflow`]**: the pure overflow computation.
//!
//! **[`reconcile`]**: the `Idle → Scheduled → Running → SuppressingEcho`
//! state machine, with triggers expressed as `understory_dirty` channels.
//!
//! **[`instance`]**: the public facade that ties one target to all of the
//! above and runs the update cycle.
//!
//! **[`runtime`]**: the [`Platform`](runtime::Platform) seam and the
//! [`Runtime`](runtime::Runtime) that shares observers between instances.
//!
//! **[`memory`]**: a headless document and platform for tests and tools.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and cycle event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use kurbo::Size;
//! use veneer_core::environment::Environment;
//! use veneer_core::memory::MemoryPlatform;
//! use veneer_core::runtime::{InstanceInit, Platform, Runtime};
//!
//! let runtime = Runtime::new(MemoryPlatform::new(), Rc::new(Environment::new()));
//! let dom = runtime.platform().dom().clone();
//! let target = dom.create_block(Size::ZERO);
//! dom.edit(|s| {
//!     let body = s.root();
//!     s.append_child(body, target);
//!     s.set_style(target, "width", "200px");
//!     s.set_style(target, "height", "100px");
//! });
//! let payload = dom.create_block(Size::new(200.0, 400.0));
//! dom.edit(|s| s.append_child(target, payload));
//!
//! let instance = runtime.create(&target, InstanceInit::default()).unwrap();
//! assert_eq!(instance.state().overflow.amount.y, 300.0);
//! instance.destroy();
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-cycle DOM
//!   write events.
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for
//!   options and overflow state.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod channel;
pub mod dom;
pub mod environment;
pub mod geometry;
pub mod instance;
pub mod memory;
pub mod observe;
pub mod options;
pub mod overflow;
pub mod reconcile;
pub mod runtime;
pub mod structure;
pub mod style;
pub mod tick;
pub mod time;
pub mod trace;

pub use instance::{Event, Instance, State, UpdateChanges};
pub use options::{Options, PartialOptions};
pub use runtime::{CreateError, InstanceInit, Platform, Runtime};
pub use style::STYLESHEET;
