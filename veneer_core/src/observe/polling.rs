// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation-frame polling, the last-resort size observer.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use super::{NativeObserver, Signal, SignalSink};
use crate::tick::Ticker;

struct PollState<N: 'static> {
    targets: RefCell<Vec<N>>,
    ticker: Rc<dyn Ticker>,
    sink: SignalSink<N>,
    running: Cell<bool>,
}

/// Pokes every observed node once per frame.
///
/// The registry measures on each poke and forwards only real size changes,
/// so polling costs one measurement per node per frame and nothing else. The
/// loop runs while at least one node is observed.
pub struct PollingObserver<N: 'static> {
    state: Rc<PollState<N>>,
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> PollingObserver<N> {
    /// Creates a poller that reports through `sink` on `ticker` frames.
    pub fn new(ticker: Rc<dyn Ticker>, sink: SignalSink<N>) -> Self {
        Self {
            state: Rc::new(PollState {
                targets: RefCell::new(Vec::new()),
                ticker,
                sink,
                running: Cell::new(false),
            }),
        }
    }

    /// Returns `true` while the frame loop is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running.get()
    }

    fn start(state: &Rc<PollState<N>>) {
        if state.running.replace(true) {
            return;
        }
        Self::schedule(state);
    }

    fn schedule(state: &Rc<PollState<N>>) {
        let weak = Rc::downgrade(state);
        state.ticker.request(Box::new(move || {
            if let Some(state) = weak.upgrade() {
                Self::tick(&state);
            }
        }));
    }

    fn tick(state: &Rc<PollState<N>>) {
        if !state.running.get() || !state.sink.is_live() {
            state.running.set(false);
            return;
        }
        let targets = state.targets.borrow().clone();
        for node in &targets {
            state.sink.signal(node, Signal::Poke);
        }
        if state.targets.borrow().is_empty() {
            state.running.set(false);
        } else {
            Self::schedule(state);
        }
    }
}

impl<N: Clone + PartialEq + fmt::Debug + 'static> NativeObserver<N> for PollingObserver<N> {
    fn observe(&mut self, node: &N) {
        {
            let mut targets = self.state.targets.borrow_mut();
            if targets.contains(node) {
                return;
            }
            targets.push(node.clone());
        }
        Self::start(&self.state);
    }

    fn unobserve(&mut self, node: &N) {
        let empty = {
            let mut targets = self.state.targets.borrow_mut();
            targets.retain(|t| t != node);
            targets.is_empty()
        };
        if empty && self.state.running.replace(false) {
            self.state.ticker.cancel();
        }
    }
}

impl<N: 'static> Drop for PollingObserver<N> {
    fn drop(&mut self) {
        if self.state.running.replace(false) {
            self.state.ticker.cancel();
        }
    }
}

impl<N: 'static> fmt::Debug for PollingObserver<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingObserver")
            .field("targets", &self.state.targets.borrow().len())
            .field("running", &self.state.running.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{Change, NativeKind, Registry};
    use crate::tick::FrameQueue;
    use kurbo::Size;

    fn polled(
        queue: &FrameQueue,
        size: &Rc<Cell<Size>>,
    ) -> Rc<Registry<u32>> {
        let ticker: Rc<dyn Ticker> = Rc::new(queue.ticker());
        let measured = Rc::clone(size);
        Registry::new(
            NativeKind::Resize,
            Some(Box::new(move |_| measured.get())),
            move |sink| Some(Box::new(PollingObserver::new(ticker, sink)) as Box<dyn NativeObserver<u32>>),
        )
    }

    #[test]
    fn polling_reports_size_changes_on_frames() {
        let queue = FrameQueue::new();
        let size = Rc::new(Cell::new(Size::new(10.0, 10.0)));
        let registry = polled(&queue, &size);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let _sub = registry.subscribe(&1, move |change| {
            if let Change::Size(s) = change {
                log.borrow_mut().push(*s);
            }
        });

        queue.run_frame();
        assert!(seen.borrow().is_empty(), "unchanged size is not reported");
        size.set(Size::new(20.0, 10.0));
        queue.run_frame();
        queue.run_frame();
        assert_eq!(*seen.borrow(), [Size::new(20.0, 10.0)], "one report per change");
    }

    #[test]
    fn polling_stops_when_last_node_leaves() {
        let queue = FrameQueue::new();
        let size = Rc::new(Cell::new(Size::ZERO));
        let registry = polled(&queue, &size);
        let sub = registry.subscribe(&1, |_| {});
        assert_eq!(queue.pending(), 1, "loop scheduled on first observe");
        queue.run_frame();
        assert_eq!(queue.pending(), 1, "loop re-arms while observing");
        drop(sub);
        assert_eq!(queue.pending(), 0, "loop cancelled with the last node");
    }
}
