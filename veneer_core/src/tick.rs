// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-boundary tick sources.
//!
//! Update cycles and polling observers never run inside the callback that
//! requested them; they ask a [`Ticker`] for one callback at the next frame
//! boundary. On the web that is `requestAnimationFrame`. [`FrameQueue`] and
//! [`ManualTicker`] substitute it with explicitly advanced frames, which is
//! what makes coalescing and echo suppression testable without timers.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

/// A one-shot frame callback source.
pub trait Ticker {
    /// Schedules `tick` to run at the next frame boundary.
    ///
    /// A ticker holds at most one request; a new request replaces a pending
    /// one.
    fn request(&self, tick: Box<dyn FnOnce()>);

    /// Drops the pending request, if any.
    fn cancel(&self);

    /// Returns `true` while a request is pending.
    fn is_pending(&self) -> bool;
}

type Pending = (u32, Box<dyn FnOnce()>);

#[derive(Default)]
struct QueueInner {
    next_id: u32,
    pending: Vec<Pending>,
    frames: u64,
}

/// A manually advanced frame clock shared by any number of [`ManualTicker`]s.
#[derive(Clone, Default)]
pub struct FrameQueue {
    inner: Rc<RefCell<QueueInner>>,
}

impl FrameQueue {
    /// Creates an empty queue at frame zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ticker whose requests land in this queue.
    #[must_use]
    pub fn ticker(&self) -> ManualTicker {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        ManualTicker {
            id,
            queue: self.clone(),
        }
    }

    /// Runs every callback that was pending when the frame started.
    ///
    /// Requests made by those callbacks land in the next frame. Returns the
    /// number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let due = {
            let mut inner = self.inner.borrow_mut();
            inner.frames += 1;
            core::mem::take(&mut inner.pending)
        };
        let count = due.len();
        for (_, tick) in due {
            tick();
        }
        count
    }

    /// Returns the number of pending callbacks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Returns the number of frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.borrow().frames
    }

    fn remove(&self, id: u32) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.pending.len();
        inner.pending.retain(|(owner, _)| *owner != id);
        inner.pending.len() != before
    }
}

impl fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameQueue")
            .field("pending", &inner.pending.len())
            .field("frames", &inner.frames)
            .finish_non_exhaustive()
    }
}

/// A [`Ticker`] driven by [`FrameQueue::run_frame`].
pub struct ManualTicker {
    id: u32,
    queue: FrameQueue,
}

impl Ticker for ManualTicker {
    fn request(&self, tick: Box<dyn FnOnce()>) {
        self.queue.remove(self.id);
        self.queue.inner.borrow_mut().pending.push((self.id, tick));
    }

    fn cancel(&self) {
        self.queue.remove(self.id);
    }

    fn is_pending(&self) -> bool {
        self.queue
            .inner
            .borrow()
            .pending
            .iter()
            .any(|(owner, _)| *owner == self.id)
    }
}

impl Drop for ManualTicker {
    fn drop(&mut self) {
        // The queue may be mid-frame; a failed borrow means nothing is pending.
        if let Ok(mut inner) = self.queue.inner.try_borrow_mut() {
            inner.pending.retain(|(owner, _)| *owner != self.id);
        }
    }
}

impl fmt::Debug for ManualTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTicker")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn request_replaces_pending() {
        let queue = FrameQueue::new();
        let ticker = queue.ticker();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = Rc::clone(&hits);
            ticker.request(Box::new(move || hits.set(hits.get() + 1)));
        }
        assert_eq!(queue.pending(), 1, "one ticker holds one request");
        assert_eq!(queue.run_frame(), 1, "one callback ran");
        assert_eq!(hits.get(), 1, "replaced requests never run");
        assert!(!ticker.is_pending(), "request consumed by the frame");
    }

    #[test]
    fn cancel_and_drop_remove_requests() {
        let queue = FrameQueue::new();
        let a = queue.ticker();
        let b = queue.ticker();
        a.request(Box::new(|| {}));
        b.request(Box::new(|| {}));
        a.cancel();
        assert_eq!(queue.pending(), 1, "cancel removes only its own request");
        drop(b);
        assert_eq!(queue.pending(), 0, "drop cancels");
    }

    #[test]
    fn requests_made_during_a_frame_run_next_frame() {
        let queue = FrameQueue::new();
        let ticker = Rc::new(queue.ticker());
        let hits = Rc::new(Cell::new(0));
        let again = Rc::clone(&ticker);
        let counter = Rc::clone(&hits);
        ticker.request(Box::new(move || {
            counter.set(counter.get() + 1);
            let counter = Rc::clone(&counter);
            again.request(Box::new(move || counter.set(counter.get() + 1)));
        }));
        queue.run_frame();
        assert_eq!(hits.get(), 1, "re-request is deferred");
        queue.run_frame();
        assert_eq!(hits.get(), 2, "and runs on the following frame");
        assert_eq!(queue.frames(), 2, "two frames elapsed");
    }
}
