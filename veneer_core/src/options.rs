// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instance options.
//!
//! [`Options`] is the complete snapshot a cycle reads. Callers change it with
//! a [`PartialOptions`] in which every field is optional;
//! [`Options::apply`] merges one in and reports which keys actually changed
//! as [`OptionChanges`].

use alloc::string::String;
use alloc::vec::Vec;

use crate::geometry::Xy;
use crate::overflow::OverflowBehavior;

/// When scrollbars are shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ScrollbarsVisibility {
    /// Always shown.
    Visible,
    /// Never shown.
    Hidden,
    /// Shown on axes that overflow.
    #[default]
    Auto,
}

/// When scrollbars hide themselves. Consumed by the interaction layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ScrollbarsAutoHide {
    /// Never hide.
    #[default]
    Never,
    /// Hide when not scrolling.
    Scroll,
    /// Hide when the pointer leaves the host.
    Leave,
    /// Hide when the pointer stops moving.
    Move,
}

/// Scrollbar options.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ScrollbarsOptions {
    /// Class toggled onto both scrollbar elements.
    pub theme: String,
    /// When scrollbars are shown.
    pub visibility: ScrollbarsVisibility,
    /// When scrollbars hide.
    pub auto_hide: ScrollbarsAutoHide,
    /// Delay before hiding, in milliseconds.
    pub auto_hide_delay: u32,
    /// Whether handles can be dragged.
    pub drag_scroll: bool,
    /// Whether clicking a track scrolls.
    pub click_scroll: bool,
}

impl Default for ScrollbarsOptions {
    fn default() -> Self {
        Self {
            theme: String::from("veneer-theme-dark"),
            visibility: ScrollbarsVisibility::Auto,
            auto_hide: ScrollbarsAutoHide::Never,
            auto_hide_delay: 1300,
            drag_scroll: true,
            click_scroll: false,
        }
    }
}

/// Update trigger options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct UpdateOptions {
    /// Host attributes that trigger an update besides `class`, `style`, and `dir`.
    pub attributes: Vec<String>,
}

/// The complete option set of an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Options {
    /// Keep the host padding outside the scrolling area.
    pub padding_absolute: bool,
    /// Per-axis overflow behavior.
    pub overflow: Xy<OverflowBehavior>,
    /// Update triggers.
    pub update: UpdateOptions,
    /// Scrollbar options.
    pub scrollbars: ScrollbarsOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            padding_absolute: false,
            overflow: Xy::splat(OverflowBehavior::Scroll),
            update: UpdateOptions::default(),
            scrollbars: ScrollbarsOptions::default(),
        }
    }
}

/// Partial per-axis overflow behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartialOverflow {
    /// Horizontal behavior.
    pub x: Option<OverflowBehavior>,
    /// Vertical behavior.
    pub y: Option<OverflowBehavior>,
}

/// Partial update trigger options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PartialUpdate {
    /// Replaces the watched attribute list.
    pub attributes: Option<Vec<String>>,
}

/// Partial scrollbar options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[expect(missing_docs, reason = "fields mirror ScrollbarsOptions")]
pub struct PartialScrollbars {
    pub theme: Option<String>,
    pub visibility: Option<ScrollbarsVisibility>,
    pub auto_hide: Option<ScrollbarsAutoHide>,
    pub auto_hide_delay: Option<u32>,
    pub drag_scroll: Option<bool>,
    pub click_scroll: Option<bool>,
}

/// A set of option overrides; `None` leaves a key unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PartialOptions {
    /// See [`Options::padding_absolute`].
    pub padding_absolute: Option<bool>,
    /// See [`Options::overflow`].
    pub overflow: PartialOverflow,
    /// See [`Options::update`].
    pub update: PartialUpdate,
    /// See [`Options::scrollbars`].
    pub scrollbars: PartialScrollbars,
}

impl PartialOptions {
    /// Overrides for both overflow axes.
    #[must_use]
    pub fn overflow(x: OverflowBehavior, y: OverflowBehavior) -> Self {
        Self {
            overflow: PartialOverflow {
                x: Some(x),
                y: Some(y),
            },
            ..Self::default()
        }
    }

    /// Override for the padding mode.
    #[must_use]
    pub fn padding_absolute(value: bool) -> Self {
        Self {
            padding_absolute: Some(value),
            ..Self::default()
        }
    }
}

/// Which option keys a merge changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[expect(missing_docs, reason = "one flag per option key")]
pub struct OptionChanges {
    pub padding_absolute: bool,
    pub overflow: Xy<bool>,
    pub update_attributes: bool,
    pub scrollbars_theme: bool,
    pub scrollbars_visibility: bool,
    pub scrollbars_auto_hide: bool,
    pub scrollbars_auto_hide_delay: bool,
    pub scrollbars_drag_scroll: bool,
    pub scrollbars_click_scroll: bool,
}

impl OptionChanges {
    /// Returns `true` if any key changed.
    #[must_use]
    pub fn any(&self) -> bool {
        self.padding_absolute
            || self.overflow.any()
            || self.update_attributes
            || self.scrollbars_theme
            || self.scrollbars_visibility
            || self.scrollbars_auto_hide
            || self.scrollbars_auto_hide_delay
            || self.scrollbars_drag_scroll
            || self.scrollbars_click_scroll
    }

    /// Accumulates another set of changes into this one.
    pub fn merge(&mut self, other: &Self) {
        self.padding_absolute |= other.padding_absolute;
        self.overflow.x |= other.overflow.x;
        self.overflow.y |= other.overflow.y;
        self.update_attributes |= other.update_attributes;
        self.scrollbars_theme |= other.scrollbars_theme;
        self.scrollbars_visibility |= other.scrollbars_visibility;
        self.scrollbars_auto_hide |= other.scrollbars_auto_hide;
        self.scrollbars_auto_hide_delay |= other.scrollbars_auto_hide_delay;
        self.scrollbars_drag_scroll |= other.scrollbars_drag_scroll;
        self.scrollbars_click_scroll |= other.scrollbars_click_scroll;
    }

    /// Returns `true` if a changed key affects what a cycle computes or writes.
    #[must_use]
    pub fn needs_cycle(&self) -> bool {
        self.padding_absolute
            || self.overflow.any()
            || self.scrollbars_theme
            || self.scrollbars_visibility
    }
}

/// Writes `value` into `slot` if present and different; returns whether it did.
fn assign<T: PartialEq + Clone>(slot: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(v) if v != slot => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

impl Options {
    /// Merges `partial` into these options.
    pub fn apply(&mut self, partial: &PartialOptions) -> OptionChanges {
        let sb = &partial.scrollbars;
        OptionChanges {
            padding_absolute: assign(&mut self.padding_absolute, partial.padding_absolute.as_ref()),
            overflow: Xy::new(
                assign(&mut self.overflow.x, partial.overflow.x.as_ref()),
                assign(&mut self.overflow.y, partial.overflow.y.as_ref()),
            ),
            update_attributes: assign(&mut self.update.attributes, partial.update.attributes.as_ref()),
            scrollbars_theme: assign(&mut self.scrollbars.theme, sb.theme.as_ref()),
            scrollbars_visibility: assign(&mut self.scrollbars.visibility, sb.visibility.as_ref()),
            scrollbars_auto_hide: assign(&mut self.scrollbars.auto_hide, sb.auto_hide.as_ref()),
            scrollbars_auto_hide_delay: assign(
                &mut self.scrollbars.auto_hide_delay,
                sb.auto_hide_delay.as_ref(),
            ),
            scrollbars_drag_scroll: assign(&mut self.scrollbars.drag_scroll, sb.drag_scroll.as_ref()),
            scrollbars_click_scroll: assign(
                &mut self.scrollbars.click_scroll,
                sb.click_scroll.as_ref(),
            ),
        }
    }

    /// Returns a copy with `partial` merged in.
    #[must_use]
    pub fn merged(&self, partial: &PartialOptions) -> Self {
        let mut next = self.clone();
        next.apply(partial);
        next
    }

    /// Returns `true` if a host attribute change should trigger an update.
    #[must_use]
    pub fn watches_attribute(&self, name: &str) -> bool {
        matches!(name, "class" | "style" | "dir") || self.update.attributes.iter().any(|a| a == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OverflowBehavior as B;

    #[test]
    fn apply_reports_only_real_changes() {
        let mut options = Options::default();
        let changes = options.apply(&PartialOptions::overflow(B::Scroll, B::Hidden));
        assert_eq!(changes.overflow, Xy::new(false, true), "x was already scroll");
        assert!(!changes.padding_absolute, "untouched key");
        assert_eq!(options.overflow, Xy::new(B::Scroll, B::Hidden), "value stored");

        let again = options.apply(&PartialOptions::overflow(B::Scroll, B::Hidden));
        assert!(!again.any(), "re-applying the same values changes nothing");
    }

    #[test]
    fn nested_scrollbar_keys_merge_independently() {
        let mut options = Options::default();
        let partial = PartialOptions {
            scrollbars: PartialScrollbars {
                click_scroll: Some(true),
                auto_hide_delay: Some(1300),
                ..PartialScrollbars::default()
            },
            ..PartialOptions::default()
        };
        let changes = options.apply(&partial);
        assert!(changes.scrollbars_click_scroll, "click scroll flipped");
        assert!(!changes.scrollbars_auto_hide_delay, "same delay is no change");
        assert!(!changes.needs_cycle(), "click scroll is consumed elsewhere");
        assert_eq!(options.scrollbars.theme, "veneer-theme-dark", "theme kept");
    }

    #[test]
    fn merged_changes_accumulate() {
        let mut total = OptionChanges::default();
        total.merge(&OptionChanges {
            padding_absolute: true,
            ..OptionChanges::default()
        });
        total.merge(&OptionChanges {
            overflow: Xy::new(true, false),
            ..OptionChanges::default()
        });
        assert!(total.padding_absolute && total.overflow.x, "both flags kept");
        assert!(total.needs_cycle(), "geometry-affecting keys need a cycle");
    }

    #[test]
    fn attribute_filter_includes_configured_names() {
        let mut options = Options::default();
        assert!(options.watches_attribute("dir"), "direction always watched");
        assert!(!options.watches_attribute("title"), "unrelated attribute ignored");
        options.update.attributes.push(String::from("title"));
        assert!(options.watches_attribute("title"), "configured attribute watched");
    }
}
