// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overflow amounts and style resolution.
//!
//! A cycle reads the viewport's client and scroll sizes, turns them into a
//! per-axis [`overflow_amount`], and resolves the configured
//! [`OverflowBehavior`]s into concrete [`OverflowStyle`]s that are written to
//! the viewport. Everything here is pure.
//!
//! # Resolution
//!
//! Browsers compute `overflow: visible` next to a clipping axis as `auto`, so
//! a `visible` axis can only be kept when the other axis is `visible` too:
//!
//! | behavior          | other axis overflows  | otherwise  |
//! |-------------------|-----------------------|------------|
//! | `visible`         | `hidden`              | `visible`  |
//! | `visible-hidden`  | `hidden`              | `visible`  |
//! | `visible-scroll`  | `scroll`¹             | `visible`  |
//! | `hidden`          | `hidden`              | `hidden`   |
//! | `scroll`          | `scroll`¹             | `scroll`¹  |
//!
//! ¹ `hidden` when the axis itself has no overflow.
//!
//! When one axis ends up `visible`, the other is promoted to `visible` as
//! well; that axis cannot be overflowing, otherwise the first would not be
//! visible.

use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use kurbo::Size;

use crate::geometry::{Axis, Xy};

/// The configured overflow behavior of one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OverflowBehavior {
    /// Content paints outside; clipped when the other axis must scroll.
    Visible,
    /// Content is clipped.
    Hidden,
    /// Content scrolls.
    #[default]
    Scroll,
    /// Visible, falling back to hidden.
    VisibleHidden,
    /// Visible, falling back to scroll.
    VisibleScroll,
}

impl OverflowBehavior {
    /// Returns `true` for `visible` and both `visible-*` variants.
    #[inline]
    #[must_use]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Visible | Self::VisibleHidden | Self::VisibleScroll)
    }

    /// Returns the option string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Scroll => "scroll",
            Self::VisibleHidden => "visible-hidden",
            Self::VisibleScroll => "visible-scroll",
        }
    }

    /// Resolves this axis given whether it and the other axis overflow.
    fn resolve(self, overflows: bool, other_overflows: bool) -> OverflowStyle {
        let scroll_or_hidden = if overflows {
            OverflowStyle::Scroll
        } else {
            OverflowStyle::Hidden
        };
        match self {
            Self::Hidden => OverflowStyle::Hidden,
            Self::Scroll => scroll_or_hidden,
            Self::Visible | Self::VisibleHidden if other_overflows => OverflowStyle::Hidden,
            Self::VisibleScroll if other_overflows => scroll_or_hidden,
            Self::Visible | Self::VisibleHidden | Self::VisibleScroll => OverflowStyle::Visible,
        }
    }
}

impl fmt::Display for OverflowBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unrecognized overflow behavior string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown overflow behavior `{value}`")]
pub struct ParseOverflowError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for OverflowBehavior {
    type Err = ParseOverflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            "scroll" => Ok(Self::Scroll),
            "visible-hidden" => Ok(Self::VisibleHidden),
            "visible-scroll" => Ok(Self::VisibleScroll),
            other => Err(ParseOverflowError {
                value: String::from(other),
            }),
        }
    }
}

/// A resolved overflow style, as written to the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OverflowStyle {
    /// `overflow: visible`.
    Visible,
    /// `overflow: hidden`.
    #[default]
    Hidden,
    /// `overflow: scroll`.
    Scroll,
}

impl OverflowStyle {
    /// Returns the CSS keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Scroll => "scroll",
        }
    }
}

impl fmt::Display for OverflowStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much sub-pixel overflow is treated as noise.
///
/// Fractional device pixel ratios make browsers round scroll sizes
/// inconsistently, so a larger threshold applies there.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OverflowEpsilon {
    /// Threshold at whole-number device pixel ratios.
    pub integral: f64,
    /// Threshold at fractional device pixel ratios.
    pub fractional: f64,
}

impl Default for OverflowEpsilon {
    fn default() -> Self {
        Self {
            integral: 0.0,
            fractional: 1.0,
        }
    }
}

impl OverflowEpsilon {
    /// Returns the threshold for a device pixel ratio.
    #[must_use]
    pub fn threshold(&self, device_pixel_ratio: f64) -> f64 {
        if device_pixel_ratio % 1.0 == 0.0 {
            self.integral
        } else {
            self.fractional
        }
    }
}

/// The raw viewport geometry a cycle measured.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverflowGeometry {
    /// Viewport client size.
    pub client: Size,
    /// Viewport scroll size.
    pub scroll: Size,
    /// Device pixel ratio at measurement time.
    pub device_pixel_ratio: f64,
}

/// The computed overflow of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OverflowState {
    /// Scrollable excess per axis, never negative.
    pub amount: Xy<f64>,
    /// Resolved style per axis.
    pub style: Xy<OverflowStyle>,
    /// Whether each axis overflows (`amount > 0`).
    pub has_overflow: Xy<bool>,
}

/// Returns the per-axis overflow amount, with noise below the epsilon and
/// NaN or negative values reported as zero.
#[must_use]
pub fn overflow_amount(geometry: &OverflowGeometry, epsilon: &OverflowEpsilon) -> Xy<f64> {
    let threshold = epsilon.threshold(geometry.device_pixel_ratio).max(0.0);
    let client: Xy<f64> = geometry.client.into();
    let scroll: Xy<f64> = geometry.scroll.into();
    scroll.zip(client, |s, c| {
        let raw = s - c;
        if raw.is_nan() || raw <= threshold {
            0.0
        } else {
            raw
        }
    })
}

/// Resolves both axes' behaviors into styles.
#[must_use]
pub fn resolve_styles(behavior: Xy<OverflowBehavior>, has_overflow: Xy<bool>) -> Xy<OverflowStyle> {
    if behavior.x.is_visible() && behavior.y.is_visible() {
        return Xy::splat(OverflowStyle::Visible);
    }
    let axis = |a: Axis| {
        behavior
            .get(a)
            .resolve(*has_overflow.get(a), *has_overflow.get(a.other()))
    };
    let styles = Xy::new(axis(Axis::X), axis(Axis::Y));
    if styles.x == OverflowStyle::Visible || styles.y == OverflowStyle::Visible {
        Xy::splat(OverflowStyle::Visible)
    } else {
        styles
    }
}

/// Computes the overflow state from measured geometry.
#[must_use]
pub fn compute_state(
    geometry: &OverflowGeometry,
    behavior: Xy<OverflowBehavior>,
    epsilon: &OverflowEpsilon,
) -> OverflowState {
    let amount = overflow_amount(geometry, epsilon);
    let has_overflow = amount.map(|a| a > 0.0);
    OverflowState {
        amount,
        style: resolve_styles(behavior, has_overflow),
        has_overflow,
    }
}

/// Returns the overflow style for the host and padding elements.
///
/// `visible` only when something overflows and may paint outside.
#[must_use]
pub fn host_overflow(state: &OverflowState) -> OverflowStyle {
    let visible_axis =
        state.style.x == OverflowStyle::Visible || state.style.y == OverflowStyle::Visible;
    if state.has_overflow.any() && visible_axis {
        OverflowStyle::Visible
    } else {
        OverflowStyle::Hidden
    }
}
