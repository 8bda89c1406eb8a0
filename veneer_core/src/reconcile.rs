// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The update scheduling state machine.
//!
//! ```text
//!            trigger                 tick / update()
//!   Idle ─────────────► Scheduled ─────────────────► Running
//!    ▲                   ▲   │ trigger: coalesce        │ suppress(channels)
//!    │                   │   ▼                          ▼
//!    │      follow-up    └───────────────────── SuppressingEcho
//!    └──────────────────────── finish_cycle ◄──────────┘
//! ```
//!
//! The [`Reconciler`] only tracks *when* to run and *what* triggered it; the
//! cycle body lives in the instance. Everything here is `Cell` state, so a
//! native observer callback fired synchronously by one of the cycle's own DOM
//! writes can call [`trigger`](Reconciler::trigger) without borrowing any
//! instance state.
//!
//! Triggers while `Scheduled` fold into the pending [`ChannelSet`]. Triggers
//! while `Running` (or on a channel the cycle did not suppress) mark a
//! follow-up, which schedules exactly one more run when the cycle finishes.
//! Triggers on a suppressed channel inside the echo window are dropped.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use understory_dirty::{Channel, ChannelSet};

use crate::channel;
use crate::tick::Ticker;

/// Scheduling phase of one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing pending.
    Idle,
    /// A run is queued for the next tick.
    Scheduled,
    /// A cycle is executing.
    Running,
    /// A cycle is writing and draining the echo of its own writes.
    SuppressingEcho,
}

/// What [`Reconciler::trigger`] did with a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriggerOutcome {
    /// A tick was requested.
    Scheduled,
    /// Folded into an already scheduled run.
    Coalesced,
    /// Arrived mid-cycle; a follow-up run will happen.
    Deferred,
    /// Dropped as the running cycle's own echo.
    Suppressed,
    /// The instance is gone.
    Ignored,
}

/// Cell-based scheduling state for one instance.
pub struct Reconciler {
    phase: Cell<Phase>,
    pending: Cell<ChannelSet>,
    suppressed: Cell<ChannelSet>,
    follow_up: Cell<bool>,
    alive: Cell<bool>,
    cycles: Cell<u64>,
    ticker: Rc<dyn Ticker>,
    on_tick: RefCell<Option<Rc<dyn Fn()>>>,
}

impl Reconciler {
    /// Creates an idle reconciler that schedules through `ticker`.
    #[must_use]
    pub fn new(ticker: Rc<dyn Ticker>) -> Self {
        Self {
            phase: Cell::new(Phase::Idle),
            pending: Cell::new(ChannelSet::empty()),
            suppressed: Cell::new(ChannelSet::empty()),
            follow_up: Cell::new(false),
            alive: Cell::new(true),
            cycles: Cell::new(0),
            ticker,
            on_tick: RefCell::new(None),
        }
    }

    /// Sets the callback run at each scheduled tick.
    pub fn set_on_tick(&self, on_tick: Rc<dyn Fn()>) {
        *self.on_tick.borrow_mut() = Some(on_tick);
    }

    /// Returns the current phase.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Returns the channels waiting for the next run.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> ChannelSet {
        self.pending.get()
    }

    /// Returns the number of cycles started so far.
    #[inline]
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    /// Returns `false` once [`shutdown`](Self::shutdown) ran.
    #[inline]
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Returns `true` while a cycle is executing.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.phase.get(), Phase::Running | Phase::SuppressingEcho)
    }

    /// Returns `true` if a tick is queued.
    #[must_use]
    pub fn is_tick_pending(&self) -> bool {
        self.ticker.is_pending()
    }

    /// Records a trigger on `channel`.
    pub fn trigger(&self, channel: Channel) -> TriggerOutcome {
        if !self.alive.get() {
            return TriggerOutcome::Ignored;
        }
        let outcome = match self.phase.get() {
            Phase::Idle => {
                self.add_pending(channel);
                self.phase.set(Phase::Scheduled);
                self.schedule();
                TriggerOutcome::Scheduled
            }
            Phase::Scheduled => {
                self.add_pending(channel);
                TriggerOutcome::Coalesced
            }
            Phase::SuppressingEcho if self.suppressed.get().contains(channel) => {
                TriggerOutcome::Suppressed
            }
            Phase::Running | Phase::SuppressingEcho => {
                self.add_pending(channel);
                self.follow_up.set(true);
                TriggerOutcome::Deferred
            }
        };
        tracing::trace!(channel = channel::name(channel), ?outcome, "trigger");
        outcome
    }

    /// Enters `Running` and takes the pending channels.
    ///
    /// Cancels a queued tick, so a synchronous run absorbs it. Returns `None`
    /// if a cycle is already running (a follow-up is requested instead) or
    /// the instance is gone.
    pub fn begin_cycle(&self) -> Option<ChannelSet> {
        if !self.alive.get() {
            return None;
        }
        if self.is_running() {
            self.follow_up.set(true);
            return None;
        }
        self.ticker.cancel();
        self.phase.set(Phase::Running);
        self.cycles.set(self.cycles.get() + 1);
        self.follow_up.set(false);
        let channels = self.pending.replace(ChannelSet::empty());
        tracing::trace!(cycle = self.cycles.get(), ?channels, "cycle begin");
        Some(channels)
    }

    /// Opens the echo window for the channels about to be perturbed.
    pub fn suppress(&self, channels: ChannelSet) {
        if self.is_running() {
            self.suppressed.set(self.suppressed.get() | channels);
            self.phase.set(Phase::SuppressingEcho);
        }
    }

    /// Closes the echo window.
    pub fn end_suppression(&self) {
        if self.phase.get() == Phase::SuppressingEcho {
            self.suppressed.set(ChannelSet::empty());
            self.phase.set(Phase::Running);
        }
    }

    /// Leaves `Running`. Returns `true` if a follow-up run was scheduled.
    pub fn finish_cycle(&self) -> bool {
        self.suppressed.set(ChannelSet::empty());
        if !self.alive.get() {
            self.phase.set(Phase::Idle);
            return false;
        }
        let again = self.follow_up.replace(false) || !self.pending.get().is_empty();
        if again {
            self.phase.set(Phase::Scheduled);
            self.schedule();
        } else {
            self.phase.set(Phase::Idle);
        }
        tracing::trace!(cycle = self.cycles.get(), follow_up = again, "cycle end");
        again
    }

    /// Asks for one more run after the current one, or schedules one.
    pub fn request_follow_up(&self) {
        if self.is_running() {
            self.follow_up.set(true);
        } else {
            self.trigger(channel::MANUAL);
        }
    }

    /// Stops scheduling for good: cancels the tick and drops the callback.
    pub fn shutdown(&self) {
        self.alive.set(false);
        self.ticker.cancel();
        self.pending.set(ChannelSet::empty());
        self.suppressed.set(ChannelSet::empty());
        self.follow_up.set(false);
        if !self.is_running() {
            self.phase.set(Phase::Idle);
        }
        // A destroy from inside the tick callback must not free the closure
        // that is currently running.
        if let Ok(mut on_tick) = self.on_tick.try_borrow_mut() {
            *on_tick = None;
        }
    }

    fn add_pending(&self, channel: Channel) {
        let mut pending = self.pending.get();
        pending.insert(channel);
        self.pending.set(pending);
    }

    fn schedule(&self) {
        let Some(on_tick) = self.on_tick.borrow().clone() else {
            return;
        };
        self.ticker.request(Box::new(move || on_tick()));
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("phase", &self.phase.get())
            .field("pending", &self.pending.get())
            .field("suppressed", &self.suppressed.get())
            .field("follow_up", &self.follow_up.get())
            .field("alive", &self.alive.get())
            .field("cycles", &self.cycles.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Weak;

    use super::*;
    use crate::channel::{CONTENT_TREE, HOST_SIZE, OPTIONS};
    use crate::tick::FrameQueue;

    /// A reconciler whose tick runs an empty cycle and counts it.
    fn counting(queue: &FrameQueue) -> (Rc<Reconciler>, Rc<Cell<u32>>) {
        let reconciler = Rc::new(Reconciler::new(Rc::new(queue.ticker())));
        let runs = Rc::new(Cell::new(0));
        let weak: Weak<Reconciler> = Rc::downgrade(&reconciler);
        let counter = Rc::clone(&runs);
        reconciler.set_on_tick(Rc::new(move || {
            if let Some(r) = weak.upgrade() {
                if r.begin_cycle().is_some() {
                    counter.set(counter.get() + 1);
                    r.finish_cycle();
                }
            }
        }));
        (reconciler, runs)
    }

    #[test]
    fn ten_triggers_coalesce_into_one_run() {
        let queue = FrameQueue::new();
        let (reconciler, runs) = counting(&queue);
        assert_eq!(reconciler.trigger(HOST_SIZE), TriggerOutcome::Scheduled, "first schedules");
        for _ in 0..9 {
            assert_eq!(reconciler.trigger(CONTENT_TREE), TriggerOutcome::Coalesced, "rest coalesce");
        }
        assert_eq!(queue.pending(), 1, "one tick queued");
        queue.run_frame();
        queue.run_frame();
        assert_eq!(runs.get(), 1, "exactly one cycle");
        assert_eq!(reconciler.phase(), Phase::Idle, "back to idle");
    }

    #[test]
    fn begin_cycle_takes_pending_channels() {
        let queue = FrameQueue::new();
        let reconciler = Reconciler::new(Rc::new(queue.ticker()));
        reconciler.trigger(HOST_SIZE);
        reconciler.trigger(OPTIONS);
        let channels = reconciler.begin_cycle().unwrap();
        assert!(channels.contains(HOST_SIZE) && channels.contains(OPTIONS), "both channels reported");
        assert!(reconciler.pending().is_empty(), "pending cleared");
        assert!(!reconciler.is_tick_pending(), "synchronous run cancels the tick");
        assert!(!reconciler.finish_cycle(), "nothing left to do");
    }

    #[test]
    fn suppressed_channels_are_dropped_inside_the_window() {
        let queue = FrameQueue::new();
        let reconciler = Reconciler::new(Rc::new(queue.ticker()));
        reconciler.begin_cycle();
        reconciler.suppress(channel::style_echo());
        assert_eq!(reconciler.phase(), Phase::SuppressingEcho, "window open");
        assert_eq!(reconciler.trigger(HOST_SIZE), TriggerOutcome::Suppressed, "echo dropped");
        reconciler.end_suppression();
        assert_eq!(reconciler.phase(), Phase::Running, "window closed");
        assert!(!reconciler.finish_cycle(), "echo does not cause a follow-up");
        assert_eq!(reconciler.phase(), Phase::Idle, "idle after the cycle");
    }

    #[test]
    fn triggers_mid_cycle_schedule_one_follow_up() {
        let queue = FrameQueue::new();
        let (reconciler, runs) = counting(&queue);
        reconciler.begin_cycle();
        reconciler.suppress(channel::style_echo());
        assert_eq!(reconciler.trigger(CONTENT_TREE), TriggerOutcome::Deferred, "unsuppressed channel");
        assert_eq!(reconciler.trigger(OPTIONS), TriggerOutcome::Deferred, "still one follow-up");
        reconciler.end_suppression();
        assert!(reconciler.finish_cycle(), "follow-up scheduled");
        assert_eq!(reconciler.phase(), Phase::Scheduled, "scheduled again");
        queue.run_frame();
        assert_eq!(runs.get(), 1, "one follow-up run");
        assert_eq!(reconciler.cycles(), 2, "two cycles total");
    }

    #[test]
    fn reentrant_begin_requests_a_follow_up() {
        let queue = FrameQueue::new();
        let reconciler = Reconciler::new(Rc::new(queue.ticker()));
        reconciler.begin_cycle();
        assert_eq!(reconciler.begin_cycle(), None, "no nested cycle");
        assert_eq!(reconciler.cycles(), 1, "nested attempt not counted");
    }

    #[test]
    fn shutdown_cancels_the_pending_tick() {
        let queue = FrameQueue::new();
        let (reconciler, runs) = counting(&queue);
        reconciler.trigger(HOST_SIZE);
        assert_eq!(queue.pending(), 1, "tick queued");
        reconciler.shutdown();
        assert_eq!(queue.pending(), 0, "tick cancelled");
        assert_eq!(reconciler.trigger(HOST_SIZE), TriggerOutcome::Ignored, "dead reconciler ignores");
        queue.run_frame();
        assert_eq!(runs.get(), 0, "nothing ran");
    }
}
