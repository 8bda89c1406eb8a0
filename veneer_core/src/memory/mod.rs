// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless document model.
//!
//! A [`MemoryStore`] is a struct-of-arrays node tree with attributes, inline
//! styles, text, and a minimal box layout. [`MemoryDom`] shares one store
//! behind `Rc<RefCell<_>>`, implements [`Dom`](crate::dom::Dom), and hosts
//! observers that turn store mutations into [`Signal`](crate::observe::Signal)s.
//! [`MemoryPlatform`] adds a [`FrameQueue`](crate::tick::FrameQueue), making
//! the whole engine drivable frame by frame without a browser.
//!
//! # Dirty tracking
//!
//! Store mutations mark per-node channels:
//!
//! - **ATTRIBUTES**: an attribute was set or removed; the name is kept in a
//!   side list.
//! - **CHILD_LIST**: a node's children changed.
//! - **CHARACTER_DATA**: a text node's data changed.
//! - **LAYOUT**: an input to box sizes changed.
//!
//! [`MemoryStore::evaluate`] drains all four into [`DomChanges`].

mod document;
mod evaluate;
mod id;
mod layout;
mod platform;
mod store;
mod traverse;

pub use document::{MemoryDom, MemoryObserver};
pub use evaluate::DomChanges;
pub use id::{INVALID, NodeId};
pub use platform::MemoryPlatform;
pub use store::{ATTRIBUTES, CHARACTER_DATA, CHILD_LIST, LAYOUT, MemoryStore, NodeKind};
pub use traverse::{Ancestors, Children};
