// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless [`Platform`] over a [`MemoryDom`] and a [`FrameQueue`].

use alloc::boxed::Box;
use alloc::rc::Rc;

use super::document::MemoryDom;
use super::id::NodeId;
use crate::observe::{Capabilities, NativeKind, NativeObserver, SignalSink};
use crate::runtime::Platform;
use crate::tick::{FrameQueue, Ticker};
use crate::time::HostTime;

/// Nominal frame length used for [`Platform::now`].
const FRAME_MICROS: u64 = 16_667;

/// A platform whose frames advance only when told to.
///
/// A frame delivers queued observer records, runs the ticks requested before
/// it, and delivers again, mirroring a browser's task, animation-frame, and
/// observer ordering closely enough for the engine's purposes.
#[derive(Clone, Debug)]
pub struct MemoryPlatform {
    dom: MemoryDom,
    queue: FrameQueue,
    caps: Capabilities,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    /// Creates a platform with every observation primitive available.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    /// Creates a platform reporting `caps`.
    ///
    /// Natives for missing primitives are not created, so the runtime falls
    /// back exactly as it would in a browser lacking them.
    #[must_use]
    pub fn with_capabilities(caps: Capabilities) -> Self {
        Self {
            dom: MemoryDom::new(),
            queue: FrameQueue::new(),
            caps,
        }
    }

    /// Returns the frame queue.
    #[must_use]
    pub fn queue(&self) -> &FrameQueue {
        &self.queue
    }

    /// Runs one frame. Returns the number of records and ticks processed.
    pub fn frame(&self) -> usize {
        let mut work = self.dom.deliver();
        work += self.queue.run_frame();
        work += self.dom.deliver();
        work
    }

    /// Runs frames until nothing is left to do. Returns the number of frames.
    ///
    /// Gives up after 64 frames; a test that hits the limit has a feedback
    /// loop.
    pub fn settle(&self) -> usize {
        let mut frames = 0;
        while frames < 64 {
            frames += 1;
            if self.frame() == 0 && self.queue.pending() == 0 {
                break;
            }
        }
        frames
    }
}

impl Platform for MemoryPlatform {
    type Dom = MemoryDom;

    fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn native_observer(
        &self,
        kind: NativeKind,
        sink: SignalSink<NodeId>,
    ) -> Option<Box<dyn NativeObserver<NodeId>>> {
        let available = match kind {
            NativeKind::Resize => self.caps.resize_observer,
            NativeKind::Intersection => self.caps.intersection_observer,
            NativeKind::Attributes | NativeKind::Tree => self.caps.mutation_observer,
        };
        available.then(|| Box::new(self.dom.observer(kind, sink)) as Box<dyn NativeObserver<NodeId>>)
    }

    fn ticker(&self) -> Rc<dyn Ticker> {
        Rc::new(self.queue.ticker())
    }

    fn now(&self) -> HostTime {
        HostTime(self.queue.frames() * FRAME_MICROS)
    }
}
