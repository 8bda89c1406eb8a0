// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update trigger channels.
//!
//! Every source that can schedule an update cycle is an
//! [`understory_dirty::Channel`]. The reconciler keeps two
//! [`ChannelSet`]s over these: the *pending* set (what triggered the next
//! run) and the *suppressed* set (what the running cycle is about to perturb
//! itself and must not re-schedule on).
//!
//! # Observation channels
//!
//! - [`HOST_SIZE`] and [`CONTENT_SIZE`] come from the size adapter.
//! - [`HOST_ATTRIBUTES`] comes from the attribute adapter on the host.
//! - [`CONTENT_TREE`] comes from the subtree adapter on the innermost role.
//!
//! # Caller channels
//!
//! [`OPTIONS`] and [`MANUAL`] are raised by the instance facade and are never
//! suppressed, since nothing the reconciler writes can produce them.

use understory_dirty::{Channel, ChannelSet};

/// The host's border-box size changed.
pub const HOST_SIZE: Channel = Channel::new(0);

/// The content element's size changed.
pub const CONTENT_SIZE: Channel = Channel::new(1);

/// A watched attribute on the host changed.
pub const HOST_ATTRIBUTES: Channel = Channel::new(2);

/// Children or character data changed below the innermost role.
pub const CONTENT_TREE: Channel = Channel::new(3);

/// Options or element configuration changed.
pub const OPTIONS: Channel = Channel::new(4);

/// The caller asked for an update outside a cycle.
pub const MANUAL: Channel = Channel::new(5);

/// Channels a cycle's own style and class writes can echo on.
#[must_use]
pub fn style_echo() -> ChannelSet {
    HOST_SIZE.into_set() | CONTENT_SIZE.into_set() | HOST_ATTRIBUTES.into_set()
}

/// Channels a structure reconfiguration can echo on.
#[must_use]
pub fn structure_echo() -> ChannelSet {
    style_echo() | CONTENT_TREE.into_set()
}

/// Returns a short name for logging and trace output.
#[must_use]
pub fn name(channel: Channel) -> &'static str {
    match channel.index() {
        0 => "host-size",
        1 => "content-size",
        2 => "host-attributes",
        3 => "content-tree",
        4 => "options",
        5 => "manual",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_sets_exclude_caller_channels() {
        let style = style_echo();
        assert!(style.contains(HOST_SIZE), "style writes echo on host size");
        assert!(!style.contains(CONTENT_TREE), "style writes never touch the tree");
        assert!(structure_echo().contains(CONTENT_TREE), "structure writes do");
        for set in [style, structure_echo()] {
            assert!(!set.contains(OPTIONS), "options are never suppressed");
            assert!(!set.contains(MANUAL), "manual updates are never suppressed");
        }
    }

    #[test]
    fn names_are_distinct() {
        let all = [HOST_SIZE, CONTENT_SIZE, HOST_ATTRIBUTES, CONTENT_TREE, OPTIONS, MANUAL];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(name(*a), name(*b), "channel names must not collide");
            }
        }
    }
}
