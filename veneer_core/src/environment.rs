// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Process-wide defaults shared by every instance of a runtime.
//!
//! The environment is an explicit object, not a hidden global: a
//! [`Runtime`](crate::runtime::Runtime) holds an `Rc<Environment>` and reads
//! it when an instance is created. Tests can [`snapshot`](Environment::snapshot)
//! it, change it, and [`restore`](Environment::restore) it.

use core::cell::{Ref, RefCell};

use crate::observe::CapabilityOverrides;
use crate::options::{Options, PartialOptions};
use crate::overflow::OverflowEpsilon;

/// Default role choices for the generated structure.
///
/// The viewport is always generated. Scrollbars are generated or skipped as a
/// pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ElementDefaults {
    /// Generate a padding element.
    pub padding: bool,
    /// Generate a content element.
    pub content: bool,
    /// Generate scrollbar elements.
    pub scrollbars: bool,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            padding: true,
            content: false,
            scrollbars: true,
        }
    }
}

/// Conditions under which instance creation is canceled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Cancel {
    /// Cancel when the platform's native scrollbars take no layout space.
    pub native_scrollbars_overlaid: bool,
}

/// Initialization defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Initialization {
    /// Role defaults.
    pub elements: ElementDefaults,
    /// Cancel conditions.
    pub cancel: Cancel,
}

/// Everything the environment holds, as a plain value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentSnapshot {
    /// Options every instance starts from.
    pub default_options: Options,
    /// Initialization every instance starts from.
    pub default_initialization: Initialization,
    /// Capability forcing applied before strategy selection.
    pub capability_overrides: CapabilityOverrides,
    /// Overflow noise thresholds.
    pub epsilon: OverflowEpsilon,
}

/// Bulk setup for [`Environment::init`]; `None` fields are left alone.
#[derive(Clone, Debug, Default)]
pub struct EnvironmentInit {
    /// Merged into the default options.
    pub options: Option<PartialOptions>,
    /// Replaces the default initialization.
    pub initialization: Option<Initialization>,
    /// Replaces the capability overrides.
    pub capability_overrides: Option<CapabilityOverrides>,
    /// Replaces the epsilon policy.
    pub epsilon: Option<OverflowEpsilon>,
}

/// Shared defaults with interior mutability.
#[derive(Debug, Default)]
pub struct Environment {
    state: RefCell<EnvironmentSnapshot>,
}

impl Environment {
    /// Creates an environment with built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies several settings at once.
    pub fn init(&self, init: EnvironmentInit) {
        let mut state = self.state.borrow_mut();
        if let Some(partial) = &init.options {
            state.default_options.apply(partial);
        }
        if let Some(initialization) = init.initialization {
            state.default_initialization = initialization;
        }
        if let Some(overrides) = init.capability_overrides {
            state.capability_overrides = overrides;
        }
        if let Some(epsilon) = init.epsilon {
            state.epsilon = epsilon;
        }
        tracing::debug!(?state, "environment initialized");
    }

    /// Restores built-in defaults.
    pub fn reset(&self) {
        *self.state.borrow_mut() = EnvironmentSnapshot::default();
    }

    /// Returns a copy of the current settings.
    #[must_use]
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        self.state.borrow().clone()
    }

    /// Replaces every setting with `snapshot`.
    pub fn restore(&self, snapshot: EnvironmentSnapshot) {
        *self.state.borrow_mut() = snapshot;
    }

    /// Returns the default options.
    #[must_use]
    pub fn default_options(&self) -> Ref<'_, Options> {
        Ref::map(self.state.borrow(), |s| &s.default_options)
    }

    /// Merges `partial` into the default options and returns the result.
    pub fn set_default_options(&self, partial: &PartialOptions) -> Options {
        let mut state = self.state.borrow_mut();
        state.default_options.apply(partial);
        state.default_options.clone()
    }

    /// Returns the default initialization.
    #[must_use]
    pub fn default_initialization(&self) -> Initialization {
        self.state.borrow().default_initialization
    }

    /// Replaces the default initialization.
    pub fn set_default_initialization(&self, initialization: Initialization) {
        self.state.borrow_mut().default_initialization = initialization;
    }

    /// Returns the capability overrides.
    #[must_use]
    pub fn capability_overrides(&self) -> CapabilityOverrides {
        self.state.borrow().capability_overrides
    }

    /// Replaces the capability overrides.
    ///
    /// Only runtimes that have not yet selected their strategies see the
    /// change.
    pub fn set_capability_overrides(&self, overrides: CapabilityOverrides) {
        self.state.borrow_mut().capability_overrides = overrides;
    }

    /// Returns the epsilon policy.
    #[must_use]
    pub fn epsilon(&self) -> OverflowEpsilon {
        self.state.borrow().epsilon
    }

    /// Replaces the epsilon policy.
    pub fn set_epsilon(&self, epsilon: OverflowEpsilon) {
        self.state.borrow_mut().epsilon = epsilon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overflow::OverflowBehavior;

    #[test]
    fn snapshot_and_restore_round_trip() {
        let env = Environment::new();
        let saved = env.snapshot();
        env.set_default_options(&PartialOptions::padding_absolute(true));
        env.set_epsilon(OverflowEpsilon {
            integral: 0.5,
            fractional: 2.0,
        });
        assert!(env.default_options().padding_absolute, "default changed");

        env.restore(saved.clone());
        assert_eq!(env.snapshot(), saved, "restore brings everything back");
    }

    #[test]
    fn init_applies_only_given_fields() {
        let env = Environment::new();
        env.init(EnvironmentInit {
            options: Some(PartialOptions::overflow(OverflowBehavior::Hidden, OverflowBehavior::Scroll)),
            initialization: Some(Initialization {
                cancel: Cancel {
                    native_scrollbars_overlaid: true,
                },
                ..Initialization::default()
            }),
            ..EnvironmentInit::default()
        });
        assert_eq!(env.default_options().overflow.x, OverflowBehavior::Hidden, "options merged");
        assert!(
            env.default_initialization().cancel.native_scrollbars_overlaid,
            "initialization replaced"
        );
        assert_eq!(env.epsilon(), OverflowEpsilon::default(), "epsilon untouched");

        env.reset();
        assert_eq!(env.snapshot(), EnvironmentSnapshot::default(), "reset to built-ins");
    }
}
