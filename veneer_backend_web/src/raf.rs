// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` tick source.
//!
//! [`RafTicker`] implements [`Ticker`] with one-shot animation frame
//! requests. Unlike a continuous animation loop it only asks the browser for
//! a frame while a tick is pending, so idle instances cost nothing.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use veneer_core::tick::Ticker;

// Direct global bindings instead of `web_sys::Window` methods, so a request
// does not fetch (and check) the Window object every time.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

type RafClosure = Closure<dyn FnMut(f64)>;

/// A [`Ticker`] backed by `requestAnimationFrame`.
///
/// At most one frame is requested at a time. A request made while a frame is
/// already requested replaces the pending callback without requesting a
/// second frame.
pub struct RafTicker {
    inner: Rc<RafInner>,
}

struct RafInner {
    /// The JS closure registered with `requestAnimationFrame`.
    ///
    /// Created once and re-registered for every request.
    closure: RefCell<Option<RafClosure>>,

    /// The callback to run at the next frame.
    pending: RefCell<Option<Box<dyn FnOnce()>>>,

    /// The ID of the outstanding `requestAnimationFrame` call.
    raf_id: Cell<Option<i32>>,

    /// Frames delivered so far.
    frames: Cell<u64>,
}

impl RafTicker {
    /// Creates an idle ticker.
    #[must_use]
    pub fn new() -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<RafInner>| {
            let weak = weak.clone();
            let closure = Closure::wrap(Box::new(move |_timestamp_ms: f64| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.raf_id.set(None);
                inner.frames.set(inner.frames.get() + 1);
                // Taken before running so the tick may request again.
                let tick = inner.pending.borrow_mut().take();
                if let Some(tick) = tick {
                    tick();
                }
            }) as Box<dyn FnMut(f64)>);
            RafInner {
                closure: RefCell::new(Some(closure)),
                pending: RefCell::new(None),
                raf_id: Cell::new(None),
                frames: Cell::new(0),
            }
        });
        Self { inner }
    }

    /// Returns the number of frames this ticker has delivered.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Default for RafTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for RafTicker {
    fn request(&self, tick: Box<dyn FnOnce()>) {
        *self.inner.pending.borrow_mut() = Some(tick);
        if self.inner.raf_id.get().is_some() {
            return;
        }
        if let Some(closure) = self.inner.closure.borrow().as_ref() {
            let id = request_animation_frame(closure.as_ref().unchecked_ref());
            self.inner.raf_id.set(Some(id));
        }
    }

    fn cancel(&self) {
        self.inner.pending.borrow_mut().take();
        if let Some(id) = self.inner.raf_id.take() {
            cancel_animation_frame(id);
        }
    }

    fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }
}

impl Drop for RafTicker {
    fn drop(&mut self) {
        self.cancel();
        // Drop the JS closure so it doesn't leak.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RafTicker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RafTicker")
            .field("pending", &self.is_pending())
            .field("raf_id", &self.inner.raf_id.get())
            .field("frames", &self.inner.frames.get())
            .finish()
    }
}
