// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reported state, change flags, and events.

use alloc::string::String;

use kurbo::{Insets, Size};

use crate::geometry::Xy;
use crate::options::OptionChanges;
use crate::overflow::OverflowState;

/// What [`Instance::state`](super::Instance::state) reports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    /// Overflow amount, style, and flags.
    pub overflow: OverflowState,
    /// The host's computed padding.
    pub padding: Insets,
    /// Whether padding is absolute.
    pub padding_absolute: bool,
    /// The viewport's client size.
    pub viewport_padding_box: Size,
    /// The viewport's scroll size.
    pub content_size: Size,
    /// Whether the host's direction is right-to-left.
    pub direction_rtl: bool,
    /// Whether the instance was destroyed.
    pub destroyed: bool,
}

/// Which facets one cycle changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateChanges {
    /// The host's border-box size.
    pub size: bool,
    /// The host's padding.
    pub padding: bool,
    /// The host's direction.
    pub direction: bool,
    /// The host went from zero to non-zero size.
    pub appear: bool,
    /// Per-axis overflow amount.
    pub overflow_amount: Xy<bool>,
    /// Per-axis overflow style.
    pub overflow_style: Xy<bool>,
    /// Per-axis overflow flag.
    pub has_overflow: Xy<bool>,
    /// A watched host attribute changed.
    pub host_mutation: bool,
    /// The payload's tree or text changed.
    pub content_mutation: bool,
    /// The structure was reconfigured.
    pub structure: bool,
    /// Options changed since the last cycle.
    pub options: OptionChanges,
}

impl UpdateChanges {
    /// Returns `true` if any measured facet changed.
    #[must_use]
    pub fn geometry_changed(&self) -> bool {
        self.size
            || self.padding
            || self.direction
            || self.appear
            || self.overflow_amount.any()
            || self.overflow_style.any()
            || self.has_overflow.any()
    }

    /// Returns `true` if anything changed.
    #[must_use]
    pub fn any(&self) -> bool {
        self.geometry_changed()
            || self.host_mutation
            || self.content_mutation
            || self.structure
            || self.options.any()
    }
}

/// Instance lifecycle events.
#[derive(Clone, Copy, Debug)]
pub enum Event<'a> {
    /// The instance finished its first cycle.
    Initialized,
    /// A cycle completed with changes, or was forced.
    Updated {
        /// What changed.
        changes: &'a UpdateChanges,
        /// Whether the cycle was forced.
        force: bool,
    },
    /// The instance was torn down.
    Destroyed {
        /// `true` if creation was canceled rather than a built instance
        /// destroyed.
        canceled: bool,
    },
}

/// An owned [`Event`], held while another event is being dispatched.
#[derive(Clone, Debug)]
pub(crate) enum QueuedEvent {
    Initialized,
    Updated { changes: UpdateChanges, force: bool },
    Destroyed { canceled: bool },
}

impl QueuedEvent {
    pub(crate) fn as_event(&self) -> Event<'_> {
        match self {
            Self::Initialized => Event::Initialized,
            Self::Updated { changes, force } => Event::Updated {
                changes,
                force: *force,
            },
            Self::Destroyed { canceled } => Event::Destroyed {
                canceled: *canceled,
            },
        }
    }
}

impl From<&Event<'_>> for QueuedEvent {
    fn from(event: &Event<'_>) -> Self {
        match *event {
            Event::Initialized => Self::Initialized,
            Event::Updated { changes, force } => Self::Updated {
                changes: changes.clone(),
                force,
            },
            Event::Destroyed { canceled } => Self::Destroyed { canceled },
        }
    }
}

/// Everything one cycle measured, kept for diffing against the next.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Measured {
    pub(crate) host_size: Size,
    pub(crate) padding: Insets,
    pub(crate) padding_absolute: bool,
    pub(crate) client: Size,
    pub(crate) scroll: Size,
    pub(crate) rtl: bool,
    pub(crate) overflow: OverflowState,
    pub(crate) theme: Option<String>,
}

impl Measured {
    /// Diffs two measurements.
    pub(crate) fn changes(&self, next: &Self) -> UpdateChanges {
        let prev = &self.overflow;
        let now = &next.overflow;
        UpdateChanges {
            size: self.host_size != next.host_size,
            padding: self.padding != next.padding || self.padding_absolute != next.padding_absolute,
            direction: self.rtl != next.rtl,
            appear: self.host_size.is_zero_area() && !next.host_size.is_zero_area(),
            overflow_amount: prev.amount.zip(now.amount, |a, b| a != b),
            overflow_style: prev.style.zip(now.style, |a, b| a != b),
            has_overflow: prev.has_overflow.zip(now.has_overflow, |a, b| a != b),
            ..UpdateChanges::default()
        }
    }

    pub(crate) fn state(&self, destroyed: bool) -> State {
        State {
            overflow: self.overflow,
            padding: self.padding,
            padding_absolute: self.padding_absolute,
            viewport_padding_box: self.client,
            content_size: self.scroll,
            direction_rtl: self.rtl,
            destroyed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appear_needs_a_zero_to_nonzero_transition() {
        let hidden = Measured::default();
        let shown = Measured {
            host_size: Size::new(100.0, 50.0),
            ..Measured::default()
        };
        assert!(hidden.changes(&shown).appear, "zero to non-zero appears");
        assert!(!shown.changes(&shown).appear, "no transition, no appear");
        assert!(!shown.changes(&hidden).appear, "disappearing is not appearing");
        assert!(hidden.changes(&shown).size, "size changed too");
    }

    #[test]
    fn identical_measurements_have_no_changes() {
        let m = Measured {
            host_size: Size::new(10.0, 10.0),
            rtl: true,
            ..Measured::default()
        };
        assert!(!m.changes(&m).any(), "nothing changed");
        let flipped = Measured { rtl: false, ..m.clone() };
        let changes = m.changes(&flipped);
        assert!(changes.direction && changes.geometry_changed(), "direction is geometry");
    }
}
