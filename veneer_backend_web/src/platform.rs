// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The browser [`Platform`].

use std::cell::OnceCell;
use std::rc::Rc;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use web_sys::{HtmlElement, Node};

use veneer_core::STYLESHEET;
use veneer_core::dom::Dom;
use veneer_core::geometry::Xy;
use veneer_core::observe::{Capabilities, NativeKind, NativeObserver, SignalSink};
use veneer_core::runtime::Platform;
use veneer_core::tick::Ticker;
use veneer_core::time::HostTime;

use crate::dom::WebDom;
use crate::raf::RafTicker;

/// `id` of the injected default stylesheet.
pub const STYLESHEET_ID: &str = "veneer-stylesheet";

/// Why a [`WebPlatform`] could not be created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// There is no global `window` (e.g. in a worker).
    #[error("no global window")]
    NoWindow,
    /// The window has no document.
    #[error("window has no document")]
    NoDocument,
}

impl From<PlatformError> for JsValue {
    fn from(err: PlatformError) -> Self {
        crate::js_error(&err)
    }
}

/// The browser platform: a [`WebDom`], native observers, and
/// `requestAnimationFrame` ticks.
///
/// Capabilities are detected on first use and cached, including the native
/// scrollbar size, which needs a layout pass to measure.
pub struct WebPlatform {
    dom: WebDom,
    caps: OnceCell<Capabilities>,
}

impl WebPlatform {
    /// Creates a platform for the global window's document.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] outside a document context.
    pub fn new() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or(PlatformError::NoWindow)?;
        let document = window.document().ok_or(PlatformError::NoDocument)?;
        Ok(Self::with_dom(WebDom::new(window, document)))
    }

    /// Creates a platform over an existing [`WebDom`].
    #[must_use]
    pub fn with_dom(dom: WebDom) -> Self {
        Self {
            dom,
            caps: OnceCell::new(),
        }
    }

    /// Injects [`STYLESHEET`] into the document head, once per document.
    ///
    /// Returns `true` if a stylesheet was inserted.
    pub fn install_stylesheet(&self) -> bool {
        let document = self.dom.document();
        if document.get_element_by_id(STYLESHEET_ID).is_some() {
            return false;
        }
        let Ok(style) = document.create_element("style") else {
            return false;
        };
        style.set_id(STYLESHEET_ID);
        style.set_text_content(Some(STYLESHEET));
        let Some(parent) = document
            .head()
            .map(Node::from)
            .or_else(|| document.document_element().map(Node::from))
        else {
            return false;
        };
        let inserted = parent.append_child(&style).is_ok();
        if inserted {
            tracing::debug!("default stylesheet installed");
        }
        inserted
    }

    fn detect(&self) -> Capabilities {
        let global: JsValue = self.dom.window().clone().into();
        let has = |name: &str| js_sys::Reflect::has(&global, &JsValue::from_str(name)).unwrap_or(false);
        let caps = Capabilities {
            resize_observer: has("ResizeObserver"),
            intersection_observer: has("IntersectionObserver"),
            mutation_observer: has("MutationObserver"),
            animation_frame: has("requestAnimationFrame"),
            native_scrollbar_size: self.measure_native_scrollbar(),
        };
        tracing::debug!(?caps, "capabilities detected");
        caps
    }

    /// Measures the classic scrollbar gutter with a throwaway scroller.
    ///
    /// Zero on both axes means native scrollbars are overlaid.
    fn measure_native_scrollbar(&self) -> Xy<f64> {
        let document = self.dom.document();
        let Some(body) = document.body() else {
            return Xy::splat(0.0);
        };
        let Ok(probe) = document.create_element("div") else {
            return Xy::splat(0.0);
        };
        let Ok(probe) = probe.dyn_into::<HtmlElement>() else {
            return Xy::splat(0.0);
        };
        let style = probe.style();
        for (property, value) in [
            ("position", "absolute"),
            ("top", "-9999px"),
            ("width", "100px"),
            ("height", "100px"),
            ("overflow", "scroll"),
        ] {
            let _ = style.set_property(property, value);
        }
        let node: Node = probe.clone().into();
        self.dom.append_child(&body.into(), &node);
        let metrics = self.dom.metrics(&node);
        self.dom.remove(&node);
        gutter(metrics.offset.width, metrics.client.width, metrics.offset.height, metrics.client.height)
    }
}

/// Per-axis native scrollbar size from a scroller's offset and client sizes.
///
/// The vertical scrollbar eats width, the horizontal one eats height.
fn gutter(offset_width: f64, client_width: f64, offset_height: f64, client_height: f64) -> Xy<f64> {
    Xy::new(
        (offset_height - client_height).max(0.0),
        (offset_width - client_width).max(0.0),
    )
}

impl core::fmt::Debug for WebPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebPlatform")
            .field("dom", &self.dom)
            .field("caps", &self.caps.get())
            .finish()
    }
}

impl Platform for WebPlatform {
    type Dom = WebDom;

    fn dom(&self) -> &WebDom {
        &self.dom
    }

    fn capabilities(&self) -> Capabilities {
        *self.caps.get_or_init(|| self.detect())
    }

    fn native_observer(
        &self,
        kind: NativeKind,
        sink: SignalSink<Node>,
    ) -> Option<Box<dyn NativeObserver<Node>>> {
        let native = crate::observer::native(kind, sink);
        if native.is_none() {
            tracing::debug!(?kind, "native observer unavailable");
        }
        native
    }

    fn ticker(&self) -> Rc<dyn Ticker> {
        Rc::new(RafTicker::new())
    }

    fn now(&self) -> HostTime {
        crate::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gutter_is_per_axis() {
        let size = gutter(100.0, 83.0, 100.0, 85.0);
        assert_eq!(size.y, 17.0, "vertical scrollbar takes width");
        assert_eq!(size.x, 15.0, "horizontal scrollbar takes height");
    }

    #[test]
    fn overlaid_scrollbars_measure_zero() {
        let size = gutter(100.0, 100.0, 100.0, 100.0);
        assert_eq!(size, Xy::splat(0.0), "no gutter");
        let caps = Capabilities {
            native_scrollbar_size: size,
            ..Capabilities::default()
        };
        assert!(caps.native_scrollbars_overlaid(), "zero gutter means overlaid");
    }
}
