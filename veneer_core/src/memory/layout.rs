// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deliberately small box layout.
//!
//! Enough CSS to make the structure measurable:
//!
//! - An explicit inline `width`/`height` in px wins.
//! - A *fill* element (one carrying a fill class, by default the padding and
//!   viewport classes) is absolutely positioned: it covers its parent's
//!   padding box, shrunk by inline `top`/`right`/`bottom`/`left` insets.
//! - Anything else takes its natural size: the widest in-flow child by the
//!   summed heights of in-flow children, plus padding. Fill children are out
//!   of flow. The intrinsic size is a lower bound on the content extent.
//! - `display: none` collapses to zero.
//!
//! `client` is the border box minus a native scrollbar gutter on
//! `overflow: scroll` axes, and `scroll` is the larger of `client` and the
//! padded content extent, which is what the DOM's `scroll*` properties
//! report.

use alloc::string::String;

use kurbo::{Insets, Size};

use super::id::{INVALID, NodeId};
use super::store::{MemoryStore, NodeKind};
use crate::dom::{parse_px, px};
use crate::geometry::ElementMetrics;

impl MemoryStore {
    /// Returns the border-box size of a node.
    #[must_use]
    pub fn box_size(&self, id: NodeId) -> Size {
        self.validate(id);
        let idx = id.0;
        if self.kind[idx as usize] == NodeKind::Text {
            return self.intrinsic[idx as usize];
        }
        if self.style(id, "display").as_deref() == Some("none") {
            return Size::ZERO;
        }

        let parent = self.parent[idx as usize];
        let fill = parent != INVALID && self.is_fill(id);
        let inset = |side: &str| self.style(id, side).as_deref().and_then(parse_px).unwrap_or(0.0);
        let natural = || {
            let pad = self.padding(id);
            let extent = self.extent(id);
            Size::new(extent.width + pad.x_value(), extent.height + pad.y_value())
        };

        let explicit_w = self.style(id, "width").as_deref().and_then(parse_px);
        let explicit_h = self.style(id, "height").as_deref().and_then(parse_px);
        let container = if fill && (explicit_w.is_none() || explicit_h.is_none()) {
            Some(self.box_size(NodeId(parent)))
        } else {
            None
        };

        let width = match (explicit_w, container) {
            (Some(w), _) => w,
            (None, Some(c)) => c.width - inset("left") - inset("right"),
            (None, None) => natural().width,
        };
        let height = match (explicit_h, container) {
            (Some(h), _) => h,
            (None, Some(c)) => c.height - inset("top") - inset("bottom"),
            (None, None) => natural().height,
        };
        Size::new(width.max(0.0), height.max(0.0))
    }

    /// Returns the box sizes the DOM would report for a node.
    #[must_use]
    pub fn metrics(&self, id: NodeId) -> ElementMetrics {
        let offset = self.box_size(id);
        if self.kind[id.0 as usize] == NodeKind::Text {
            return ElementMetrics {
                offset,
                client: offset,
                scroll: offset,
            };
        }
        let gutter = self.native_scrollbar;
        let scrolls = |prop: &str| self.computed_style(id, prop) == "scroll";
        let client = Size::new(
            (offset.width - if scrolls("overflow-y") { gutter } else { 0.0 }).max(0.0),
            (offset.height - if scrolls("overflow-x") { gutter } else { 0.0 }).max(0.0),
        );
        let pad = self.padding(id);
        let extent = self.extent(id);
        let scroll = Size::new(
            client.width.max(extent.width + pad.x_value()),
            client.height.max(extent.height + pad.y_value()),
        );
        ElementMetrics {
            offset,
            client,
            scroll,
        }
    }

    /// Returns the node's padding from inline `padding` and its longhands.
    #[must_use]
    pub fn padding(&self, id: NodeId) -> Insets {
        let mut pad = Insets::ZERO;
        if let Some(shorthand) = self.style(id, "padding") {
            let values: alloc::vec::Vec<f64> = shorthand
                .split_ascii_whitespace()
                .filter_map(parse_px)
                .collect();
            let (top, right, bottom, left) = match values.as_slice() {
                [all] => (*all, *all, *all, *all),
                [v, h] => (*v, *h, *v, *h),
                [t, h, b] => (*t, *h, *b, *h),
                [t, r, b, l, ..] => (*t, *r, *b, *l),
                [] => (0.0, 0.0, 0.0, 0.0),
            };
            pad = Insets::new(left, top, right, bottom);
        }
        let longhand = |side: &str| {
            self.style(id, &alloc::format!("padding-{side}"))
                .as_deref()
                .and_then(parse_px)
        };
        if let Some(v) = longhand("top") {
            pad.y0 = v;
        }
        if let Some(v) = longhand("right") {
            pad.x1 = v;
        }
        if let Some(v) = longhand("bottom") {
            pad.y1 = v;
        }
        if let Some(v) = longhand("left") {
            pad.x0 = v;
        }
        Insets::new(pad.x0.max(0.0), pad.y0.max(0.0), pad.x1.max(0.0), pad.y1.max(0.0))
    }

    /// Returns a computed style property, or an empty string if unmodelled.
    #[must_use]
    pub fn computed_style(&self, id: NodeId, property: &str) -> String {
        self.validate(id);
        let inline = self.style(id, property);
        match property {
            "direction" => self
                .ancestors(id)
                .find_map(|a| {
                    self.style(a, "direction").or_else(|| {
                        self.attribute(a, "dir")
                            .filter(|d| *d == "rtl" || *d == "ltr")
                            .map(String::from)
                    })
                })
                .unwrap_or_else(|| String::from("ltr")),
            "overflow-x" | "overflow-y" => inline.unwrap_or_else(|| {
                let shorthand = self.style(id, "overflow").unwrap_or_default();
                let mut parts = shorthand.split_ascii_whitespace();
                let x = parts.next().unwrap_or("visible");
                let y = parts.next().unwrap_or(x);
                String::from(if property == "overflow-x" { x } else { y })
            }),
            "display" => inline.unwrap_or_else(|| {
                String::from(match self.kind[id.0 as usize] {
                    NodeKind::Element => "block",
                    NodeKind::Text => "inline",
                })
            }),
            "position" => inline.unwrap_or_else(|| {
                String::from(if self.is_fill(id) { "absolute" } else { "static" })
            }),
            "padding-top" => px(self.padding(id).y0),
            "padding-right" => px(self.padding(id).x1),
            "padding-bottom" => px(self.padding(id).y1),
            "padding-left" => px(self.padding(id).x0),
            _ => inline.unwrap_or_default(),
        }
    }

    /// Sets the classes whose elements fill their parent.
    pub fn set_fill_classes(&mut self, classes: &[&'static str]) {
        self.fill_classes = classes.to_vec();
        self.dirty.mark(0, super::store::LAYOUT);
    }

    fn is_fill(&self, id: NodeId) -> bool {
        self.fill_classes.iter().any(|c| self.has_class(id, c))
    }

    /// Size of the in-flow content, excluding the node's own padding.
    fn extent(&self, id: NodeId) -> Size {
        let mut width: f64 = 0.0;
        let mut height: f64 = 0.0;
        for child in self.children(id) {
            if self.kind[child.0 as usize] == NodeKind::Element && self.is_fill(child) {
                continue;
            }
            let size = self.box_size(child);
            width = width.max(size.width);
            height += size.height;
        }
        let intrinsic = self.intrinsic[id.0 as usize];
        Size::new(width.max(intrinsic.width), height.max(intrinsic.height))
    }
}
