// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The document seam.
//!
//! Everything the engine reads from or writes to a document goes through
//! [`Dom`]. The web backend implements it over `web_sys`; [`MemoryDom`]
//! implements it over an in-memory tree with a simple box layout so the
//! structure, overflow, and reconciler logic can be driven headlessly.
//!
//! Node handles are shared references in the DOM sense: cloning a handle does
//! not clone the node, and every method takes `&self` because document
//! handles have interior identity.
//!
//! [`MemoryDom`]: crate::memory::MemoryDom

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Insets;

use crate::geometry::ElementMetrics;

/// Read/write access to a document tree.
pub trait Dom {
    /// Handle to a node. Equality is node identity.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    /// Creates a detached element with the given tag name.
    fn create_element(&self, tag: &str) -> Self::Node;

    /// Returns the parent of `node`, if attached.
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Returns the child nodes of `node` in document order.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Returns `true` if `node` is attached to the document root.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Moves `child` to the end of `parent`'s child list.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Moves `child` into `parent` before `reference`, or to the end when
    /// `reference` is `None`.
    fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);

    /// Detaches `node` from its parent.
    fn remove(&self, node: &Self::Node);

    /// Returns `true` if the element's class list contains `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Adds `class` to the element's class list.
    fn add_class(&self, node: &Self::Node, class: &str);

    /// Removes `class` from the element's class list.
    fn remove_class(&self, node: &Self::Node, class: &str);

    /// Returns the value of an attribute.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Sets an attribute.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    /// Removes an attribute.
    fn remove_attribute(&self, node: &Self::Node, name: &str);

    /// Returns an inline style property, if set.
    fn style(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Sets an inline style property.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Removes an inline style property.
    fn remove_style(&self, node: &Self::Node, property: &str);

    /// Returns a computed style property (empty if unknown).
    fn computed_style(&self, node: &Self::Node, property: &str) -> String;

    /// Returns the element's box sizes.
    fn metrics(&self, node: &Self::Node) -> ElementMetrics;

    /// Returns the element's computed padding.
    fn padding(&self, node: &Self::Node) -> Insets;

    /// Returns the device pixel ratio of the document's view.
    fn device_pixel_ratio(&self) -> f64;

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool {
        let mut cursor = Some(node.clone());
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            cursor = self.parent(&current);
        }
        false
    }

    /// Returns the node after `node` in its parent's child list.
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
        let parent = self.parent(node)?;
        let children = self.children(&parent);
        let pos = children.iter().position(|c| c == node)?;
        children.get(pos + 1).cloned()
    }
}

/// Formats a pixel length the way the engine writes inline styles.
///
/// Whole values print without a fraction (`"12px"`), others with up to three
/// decimals and no trailing zeros, so repeated writes of the same value
/// compare equal as strings.
#[must_use]
pub fn px(value: f64) -> String {
    let mut out = number(value);
    out.push_str("px");
    out
}

/// Formats a unitless number with up to three decimals, like [`px`].
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "style values are far below i64::MAX thousandths"
)]
pub fn number(value: f64) -> String {
    use core::fmt::Write;

    if !value.is_finite() {
        return String::from("0");
    }
    let scaled = value * 1000.0;
    let milli = if scaled >= 0.0 {
        (scaled + 0.5) as i64
    } else {
        (scaled - 0.5) as i64
    };
    let mut out = String::new();
    if milli < 0 {
        out.push('-');
    }
    let magnitude = milli.unsigned_abs();
    let _ = write!(out, "{}", magnitude / 1000);
    let mut frac = magnitude % 1000;
    if frac != 0 {
        let mut digits: usize = 3;
        while frac % 10 == 0 {
            frac /= 10;
            digits -= 1;
        }
        let _ = write!(out, ".{frac:0digits$}");
    }
    out
}

/// Parses a CSS pixel length (`"12px"`, `"-3.5px"`, `"0"`).
///
/// Returns `None` for anything that is not a plain pixel value.
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    value.strip_suffix("px")?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_formats_stably() {
        assert_eq!(px(12.0), "12px", "whole values have no fraction");
        assert_eq!(px(-3.5), "-3.5px", "fractions keep their sign");
        assert_eq!(px(0.1 + 0.2), "0.3px", "float noise is rounded away");
        assert_eq!(px(-0.0), "0px", "negative zero prints as zero");
    }

    #[test]
    fn number_is_unitless() {
        assert_eq!(number(0.5), "0.5", "half");
        assert_eq!(number(2.0 / 3.0), "0.667", "three decimals at most");
        assert_eq!(number(f64::NAN), "0", "non-finite prints as zero");
    }

    #[test]
    fn parse_px_accepts_plain_lengths_only() {
        assert_eq!(parse_px("12px"), Some(12.0), "plain px");
        assert_eq!(parse_px(" -4.25px "), Some(-4.25), "padded negative");
        assert_eq!(parse_px("0"), Some(0.0), "unitless zero");
        assert_eq!(parse_px("50%"), None, "percentages are not pixels");
        assert_eq!(parse_px("auto"), None, "keywords are not pixels");
    }
}
