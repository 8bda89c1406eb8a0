// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::MemoryStore;

/// An iterator over the direct children of a node.
///
/// Created by [`MemoryStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a MemoryStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a MemoryStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.next_sibling[idx as usize];
        Some(NodeId(idx))
    }
}

/// An iterator from a node up through its ancestors, starting with the node.
///
/// Created by [`MemoryStore::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    store: &'a MemoryStore,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(store: &'a MemoryStore, start: u32) -> Self {
        Self {
            store,
            current: start,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.parent[idx as usize];
        Some(NodeId(idx))
    }
}
