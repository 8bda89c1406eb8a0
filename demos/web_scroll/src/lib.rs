// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: overlay scrollbars on a growing list.
//!
//! Wraps a fixed-size box with `veneer_backend_web`, then appends a row every
//! time the button is clicked. Each `Updated` event rewrites a status line
//! with the current overflow amount, so the reconcile cycle is visible as
//! the list outgrows its box.
//!
//! Build with: `wasm-pack build --target web demos/web_scroll`
//!
//! Then serve `demos/web_scroll/` and open `index.html` in a browser.

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, Node};

use veneer_backend_web::{WebPlatform, parse_options};
use veneer_core::{Event, Instance, InstanceInit, Platform as _};

const BOX_W: f64 = 320.0;
const BOX_H: f64 = 240.0;

/// Options as a page would pass them.
const OPTIONS_JSON: &str = r#"{
    "paddingAbsolute": true,
    "overflow": { "x": "hidden" },
    "scrollbars": { "theme": "veneer-theme-light", "autoHide": "leave" }
}"#;

/// Entry point, called automatically by `wasm_bindgen(start)`.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let runtime = veneer_backend_web::runtime()?;
    let document = runtime.platform().dom().document().clone();
    let body = document.body().ok_or("document has no body")?;

    let status = div(&document, &[("margin", "8px 0"), ("font-family", "monospace")])?;
    let button = div(
        &document,
        &[
            ("display", "inline-block"),
            ("padding", "6px 12px"),
            ("cursor", "pointer"),
            ("background", "#45475a"),
            ("border-radius", "6px"),
        ],
    )?;
    button.set_text_content(Some("Add row"));
    let target = div(
        &document,
        &[
            ("width", &format!("{BOX_W}px")),
            ("height", &format!("{BOX_H}px")),
            ("padding", "12px"),
            ("background", "#313244"),
            ("border-radius", "12px"),
        ],
    )?;
    for _ in 0..4 {
        append_row(&document, &target)?;
    }
    body.append_child(&button)?;
    body.append_child(&status)?;
    body.append_child(&target)?;

    let options = parse_options(&js_sys::JSON::parse(OPTIONS_JSON)?)?;
    let target: Node = target.into();
    let instance = runtime
        .create(
            &target,
            InstanceInit::default()
                .with_options(options)
                .with_listener(Box::new(move |instance: &Instance<WebPlatform>, event: &Event<'_>| {
                    if let Event::Updated { .. } = event {
                        report(&status, instance);
                    }
                })),
        )
        .map_err(|err| veneer_backend_web::js_error(&err))?;

    // Rows go into the content element once the structure exists.
    let elements = instance.elements();
    let content: Node = elements.content.unwrap_or(elements.viewport);
    let rows = Rc::new(Cell::new(4_u32));
    let on_click = Closure::wrap(Box::new(move || {
        rows.set(rows.get() + 1);
        if let Ok(el) = row(&document, rows.get()) {
            let _ = content.append_child(&el);
        }
    }) as Box<dyn FnMut()>);
    button.set_onclick(Some(on_click.as_ref().unchecked_ref()));

    // Keep the instance and the click handler alive; there is no graceful
    // shutdown on the web.
    core::mem::forget(on_click);
    core::mem::forget(instance);
    core::mem::forget(runtime);

    Ok(())
}

fn div(document: &Document, styles: &[(&str, &str)]) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = document.create_element("div")?.unchecked_into();
    let style = el.style();
    for (property, value) in styles {
        style.set_property(property, value)?;
    }
    Ok(el)
}

fn row(document: &Document, index: u32) -> Result<HtmlElement, JsValue> {
    let el = div(document, &[("padding", "10px 0"), ("border-bottom", "1px solid #45475a")])?;
    el.set_text_content(Some(&format!("Row {index}")));
    Ok(el)
}

fn append_row(document: &Document, parent: &HtmlElement) -> Result<(), JsValue> {
    let index = parent.child_element_count() + 1;
    parent.append_child(&row(document, index)?)?;
    Ok(())
}

fn report(status: &HtmlElement, instance: &Instance<WebPlatform>) {
    let state = instance.state();
    let overflow = state.overflow;
    status.set_text_content(Some(&format!(
        "overflow x={} y={} style={:?}/{:?}",
        overflow.amount.x, overflow.amount.y, overflow.style.x, overflow.style.y,
    )));
}
