// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability-ranked observer selection.

use crate::geometry::Xy;

/// What the platform can do, as detected by the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capabilities {
    /// `ResizeObserver` is available.
    pub resize_observer: bool,
    /// `IntersectionObserver` is available.
    pub intersection_observer: bool,
    /// `MutationObserver` is available.
    pub mutation_observer: bool,
    /// `requestAnimationFrame` is available.
    pub animation_frame: bool,
    /// Size of the platform's native scrollbars in CSS pixels.
    pub native_scrollbar_size: Xy<f64>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            resize_observer: true,
            intersection_observer: true,
            mutation_observer: true,
            animation_frame: true,
            native_scrollbar_size: Xy::splat(0.0),
        }
    }
}

impl Capabilities {
    /// A platform with no observation primitives at all.
    pub const NONE: Self = Self {
        resize_observer: false,
        intersection_observer: false,
        mutation_observer: false,
        animation_frame: false,
        native_scrollbar_size: Xy::splat(0.0),
    };

    /// Returns `true` if native scrollbars take no layout space.
    #[must_use]
    pub fn native_scrollbars_overlaid(&self) -> bool {
        self.native_scrollbar_size.x <= 0.0 && self.native_scrollbar_size.y <= 0.0
    }

    /// Returns these capabilities with `overrides` applied.
    #[must_use]
    pub fn with_overrides(mut self, overrides: &CapabilityOverrides) -> Self {
        if let Some(v) = overrides.resize_observer {
            self.resize_observer = v;
        }
        if let Some(v) = overrides.intersection_observer {
            self.intersection_observer = v;
        }
        if let Some(v) = overrides.mutation_observer {
            self.mutation_observer = v;
        }
        if let Some(v) = overrides.animation_frame {
            self.animation_frame = v;
        }
        if let Some(v) = overrides.native_scrollbar_size {
            self.native_scrollbar_size = v;
        }
        self
    }
}

/// Per-capability forcing, set through the environment.
///
/// `None` leaves the detected value alone. Overriding a capability to `true`
/// on a platform that lacks it makes the backend fall through to a no-op
/// native, never an error.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct CapabilityOverrides {
    /// Forces `ResizeObserver` availability.
    pub resize_observer: Option<bool>,
    /// Forces `IntersectionObserver` availability.
    pub intersection_observer: Option<bool>,
    /// Forces `MutationObserver` availability.
    pub mutation_observer: Option<bool>,
    /// Forces `requestAnimationFrame` availability.
    pub animation_frame: Option<bool>,
    /// Forces the native scrollbar size.
    pub native_scrollbar_size: Option<Xy<f64>>,
}

/// How element sizes are observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeStrategy {
    /// Native resize observation.
    Resize,
    /// Intersection-observer polyfill.
    Intersection,
    /// Animation-frame polling.
    Polling,
    /// Nothing available; sizes are only read on explicit updates.
    Noop,
}

impl SizeStrategy {
    /// Candidates in preference order.
    pub const RANKED: [Self; 3] = [Self::Resize, Self::Intersection, Self::Polling];

    /// Picks the first ranked strategy the capabilities allow.
    #[must_use]
    pub fn select(caps: &Capabilities) -> Self {
        Self::RANKED
            .into_iter()
            .find(|s| s.is_available(caps))
            .unwrap_or(Self::Noop)
    }

    fn is_available(self, caps: &Capabilities) -> bool {
        match self {
            Self::Resize => caps.resize_observer,
            Self::Intersection => caps.intersection_observer,
            Self::Polling => caps.animation_frame,
            Self::Noop => true,
        }
    }
}

/// How attribute and subtree mutations are observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationStrategy {
    /// Native mutation observation.
    Native,
    /// Nothing available.
    Noop,
}

impl MutationStrategy {
    /// Picks the mutation strategy the capabilities allow.
    #[must_use]
    pub fn select(caps: &Capabilities) -> Self {
        if caps.mutation_observer {
            Self::Native
        } else {
            Self::Noop
        }
    }
}

/// The strategies chosen for a runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Strategies {
    /// Size observation.
    pub size: SizeStrategy,
    /// Mutation observation.
    pub mutation: MutationStrategy,
}

impl Strategies {
    /// Selects both strategies from detected capabilities and overrides.
    #[must_use]
    pub fn select(detected: Capabilities, overrides: &CapabilityOverrides) -> Self {
        let caps = detected.with_overrides(overrides);
        Self {
            size: SizeStrategy::select(&caps),
            mutation: MutationStrategy::select(&caps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_fallback_picks_best_available() {
        let mut caps = Capabilities::default();
        assert_eq!(SizeStrategy::select(&caps), SizeStrategy::Resize, "resize first");
        caps.resize_observer = false;
        assert_eq!(SizeStrategy::select(&caps), SizeStrategy::Intersection, "then intersection");
        caps.intersection_observer = false;
        assert_eq!(SizeStrategy::select(&caps), SizeStrategy::Polling, "then polling");
        assert_eq!(SizeStrategy::select(&Capabilities::NONE), SizeStrategy::Noop, "never fails");
    }

    #[test]
    fn overrides_force_capabilities_both_ways() {
        let overrides = CapabilityOverrides {
            resize_observer: Some(false),
            mutation_observer: Some(false),
            ..CapabilityOverrides::default()
        };
        let picked = Strategies::select(Capabilities::default(), &overrides);
        assert_eq!(picked.size, SizeStrategy::Intersection, "resize forced off");
        assert_eq!(picked.mutation, MutationStrategy::Noop, "mutation forced off");

        let forced_on = CapabilityOverrides {
            animation_frame: Some(true),
            ..CapabilityOverrides::default()
        };
        let picked = Strategies::select(Capabilities::NONE, &forced_on);
        assert_eq!(picked.size, SizeStrategy::Polling, "polling forced on");
    }

    #[test]
    fn overlaid_scrollbars_follow_size_override() {
        let caps = Capabilities::default();
        assert!(caps.native_scrollbars_overlaid(), "default platform has overlay scrollbars");
        let classic = caps.with_overrides(&CapabilityOverrides {
            native_scrollbar_size: Some(Xy::new(15.0, 15.0)),
            ..CapabilityOverrides::default()
        });
        assert!(!classic.native_scrollbars_overlaid(), "classic scrollbars take space");
    }
}
