// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-axis values and element box metrics.
//!
//! Sizes and insets come from [`kurbo`]; this module adds the [`Xy`] pair used
//! for every per-axis quantity in overflow computation, and [`ElementMetrics`],
//! the three box sizes a [`Dom`](crate::dom::Dom) reports for an element.

use kurbo::Size;

/// One of the two scroll axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

impl Axis {
    /// Returns the other axis.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// A pair of values, one per axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Xy<T> {
    /// Horizontal component.
    pub x: T,
    /// Vertical component.
    pub y: T,
}

impl<T> Xy<T> {
    /// Creates a pair from both components.
    #[inline]
    #[must_use]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    /// Returns the component for `axis`.
    #[inline]
    #[must_use]
    pub fn get(&self, axis: Axis) -> &T {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    /// Applies `f` to both components.
    #[inline]
    #[must_use]
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Xy<U> {
        Xy {
            x: f(self.x),
            y: f(self.y),
        }
    }

    /// Combines two pairs component-wise.
    #[inline]
    #[must_use]
    pub fn zip<U, R>(self, other: Xy<U>, mut f: impl FnMut(T, U) -> R) -> Xy<R> {
        Xy {
            x: f(self.x, other.x),
            y: f(self.y, other.y),
        }
    }
}

impl<T: Copy> Xy<T> {
    /// Creates a pair with the same value on both axes.
    #[inline]
    #[must_use]
    pub const fn splat(v: T) -> Self {
        Self { x: v, y: v }
    }
}

impl Xy<bool> {
    /// Returns `true` if either component is `true`.
    #[inline]
    #[must_use]
    pub const fn any(self) -> bool {
        self.x || self.y
    }
}

impl From<Size> for Xy<f64> {
    fn from(size: Size) -> Self {
        Self::new(size.width, size.height)
    }
}

/// The box sizes of one element, in CSS pixels.
///
/// Mirrors the DOM's `offsetWidth/Height` (border box), `clientWidth/Height`
/// (padding box minus scrollbar gutters), and `scrollWidth/Height` (the
/// scrollable extent, never smaller than the client size).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementMetrics {
    /// Border-box size.
    pub offset: Size,
    /// Padding-box size excluding native scrollbar gutters.
    pub client: Size,
    /// Scrollable extent.
    pub scroll: Size,
}
