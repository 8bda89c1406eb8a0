// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for veneer update
//! cycles.
//!
//! This crate provides [`TraceSink`](veneer_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export_json`]: writes Chrome Trace Event Format JSON from
//!   recorded bytes.
//!
//! Sinks are owned by the instance they are installed on. Wrap one in
//! `Rc<RefCell<_>>` to keep reading it afterwards:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::Size;
//! use veneer_core::environment::Environment;
//! use veneer_core::memory::MemoryPlatform;
//! use veneer_core::runtime::{InstanceInit, Platform, Runtime};
//! use veneer_debug::recorder::{RecorderSink, decode};
//!
//! let runtime = Runtime::new(MemoryPlatform::new(), Rc::new(Environment::new()));
//! let dom = runtime.platform().dom().clone();
//! let target = dom.create_block(Size::new(100.0, 100.0));
//! dom.edit(|s| {
//!     let body = s.root();
//!     s.append_child(body, target);
//! });
//!
//! let instance = runtime.create(&target, InstanceInit::default()).unwrap();
//! let recorder = Rc::new(RefCell::new(RecorderSink::new()));
//! instance.set_trace_sink(Some(Box::new(Rc::clone(&recorder))));
//! instance.update(true);
//! assert!(decode(recorder.borrow().as_bytes()).count() > 0);
//! ```

pub mod chrome;
pub mod pretty;
pub mod recorder;
