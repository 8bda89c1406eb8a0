// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation draining.
//!
//! Each store mutation marks a dirty channel on the slot it touched.
//! [`MemoryStore::evaluate`] drains the channels in a fixed order and returns
//! the raw slot indices, which [`MemoryDom`](super::MemoryDom) then matches
//! against observer targets.

use alloc::string::String;
use alloc::vec::Vec;

use super::store::{self, MemoryStore};

/// The mutations recorded since the previous [`MemoryStore::evaluate`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DomChanges {
    /// Attribute changes as `(node, attribute name)`, in mutation order.
    pub attributes: Vec<(u32, String)>,
    /// Nodes whose child list changed.
    pub child_list: Vec<u32>,
    /// Text nodes whose data changed.
    pub character_data: Vec<u32>,
    /// Nodes whose layout inputs changed.
    pub layout: Vec<u32>,
}

impl DomChanges {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.child_list.is_empty()
            && self.character_data.is_empty()
            && self.layout.is_empty()
    }
}

impl MemoryStore {
    /// Drains every dirty channel and returns what changed.
    pub fn evaluate(&mut self) -> DomChanges {
        let mut changes = DomChanges::default();

        // Drain ATTRIBUTES; names come from the pending list.
        let attributed: Vec<u32> = self
            .dirty
            .drain(store::ATTRIBUTES)
            .deterministic()
            .run()
            .collect();
        changes.attributes = core::mem::take(&mut self.pending_attributes)
            .into_iter()
            .filter(|(idx, _)| attributed.contains(idx))
            .collect();

        changes.child_list = self
            .dirty
            .drain(store::CHILD_LIST)
            .deterministic()
            .run()
            .collect();

        changes.character_data = self
            .dirty
            .drain(store::CHARACTER_DATA)
            .deterministic()
            .run()
            .collect();

        changes.layout = self
            .dirty
            .drain(store::LAYOUT)
            .deterministic()
            .run()
            .collect();

        changes
    }
}
