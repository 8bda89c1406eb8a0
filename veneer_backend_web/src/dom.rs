// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Dom`] over `web_sys`.
//!
//! Handles are [`web_sys::Node`]s, so text nodes moved into the content
//! element keep their identity. Element-only operations on a non-element
//! node read as empty and write nothing.

use kurbo::{Insets, Size};
use wasm_bindgen::JsCast as _;
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, Node, Window};

use veneer_core::dom::{Dom, parse_px};
use veneer_core::geometry::ElementMetrics;

/// A browser document.
#[derive(Clone)]
pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    /// Wraps a window and its document.
    #[must_use]
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }

    /// Returns the window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn computed(&self, node: &Node) -> Option<CssStyleDeclaration> {
        let element = node.dyn_ref::<Element>()?;
        self.window.get_computed_style(element).ok().flatten()
    }
}

impl core::fmt::Debug for WebDom {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebDom")
            .field("document", &"Document")
            .finish_non_exhaustive()
    }
}

fn inline_style(node: &Node) -> Option<CssStyleDeclaration> {
    node.dyn_ref::<HtmlElement>().map(HtmlElement::style)
}

impl Dom for WebDom {
    type Node = Node;

    fn create_element(&self, tag: &str) -> Node {
        match self.document.create_element(tag) {
            Ok(element) => element.into(),
            Err(err) => {
                tracing::warn!(tag, ?err, "create_element failed; using an empty text node");
                self.document.create_text_node("").into()
            }
        }
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn is_connected(&self, node: &Node) -> bool {
        node.is_connected()
    }

    fn append_child(&self, parent: &Node, child: &Node) {
        if let Err(err) = parent.append_child(child) {
            tracing::warn!(?err, "append_child failed");
        }
    }

    fn insert_before(&self, parent: &Node, child: &Node, reference: Option<&Node>) {
        if let Err(err) = parent.insert_before(child, reference) {
            tracing::warn!(?err, "insert_before failed");
        }
    }

    fn remove(&self, node: &Node) {
        if let Some(parent) = node.parent_node() {
            let _ = parent.remove_child(node);
        }
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .is_some_and(|e| e.class_list().contains(class))
    }

    fn add_class(&self, node: &Node, class: &str) {
        if let Some(element) = node.dyn_ref::<Element>() {
            let _ = element.class_list().add_1(class);
        }
    }

    fn remove_class(&self, node: &Node, class: &str) {
        if let Some(element) = node.dyn_ref::<Element>() {
            let _ = element.class_list().remove_1(class);
            // An emptied list leaves `class=""` behind.
            if element.class_list().length() == 0 {
                let _ = element.remove_attribute("class");
            }
        }
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>()?.get_attribute(name)
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) {
        if let Some(element) = node.dyn_ref::<Element>() {
            let _ = element.set_attribute(name, value);
        }
    }

    fn remove_attribute(&self, node: &Node, name: &str) {
        if let Some(element) = node.dyn_ref::<Element>() {
            let _ = element.remove_attribute(name);
        }
    }

    fn style(&self, node: &Node, property: &str) -> Option<String> {
        let value = inline_style(node)?.get_property_value(property).ok()?;
        (!value.is_empty()).then_some(value)
    }

    fn set_style(&self, node: &Node, property: &str, value: &str) {
        if let Some(style) = inline_style(node) {
            let _ = style.set_property(property, value);
        }
    }

    fn remove_style(&self, node: &Node, property: &str) {
        let Some(style) = inline_style(node) else {
            return;
        };
        let _ = style.remove_property(property);
        // Same as classes: no empty `style=""` left on restored elements.
        if style.length() == 0
            && let Some(element) = node.dyn_ref::<Element>()
        {
            let _ = element.remove_attribute("style");
        }
    }

    fn computed_style(&self, node: &Node, property: &str) -> String {
        self.computed(node)
            .and_then(|style| style.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn metrics(&self, node: &Node) -> ElementMetrics {
        let Some(element) = node.dyn_ref::<Element>() else {
            return ElementMetrics::default();
        };
        let offset = node.dyn_ref::<HtmlElement>().map_or_else(
            || {
                let rect = element.get_bounding_client_rect();
                Size::new(rect.width(), rect.height())
            },
            |html| Size::new(f64::from(html.offset_width()), f64::from(html.offset_height())),
        );
        ElementMetrics {
            offset,
            client: Size::new(
                f64::from(element.client_width()),
                f64::from(element.client_height()),
            ),
            scroll: Size::new(
                f64::from(element.scroll_width()),
                f64::from(element.scroll_height()),
            ),
        }
    }

    fn padding(&self, node: &Node) -> Insets {
        let Some(style) = self.computed(node) else {
            return Insets::ZERO;
        };
        let side = |property: &str| {
            style
                .get_property_value(property)
                .ok()
                .and_then(|v| parse_px(&v))
                .unwrap_or(0.0)
        };
        Insets::new(
            side("padding-left"),
            side("padding-top"),
            side("padding-right"),
            side("padding-bottom"),
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }
}
