// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the update cycle.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! reconciler calls at each stage of a cycle. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`CycleSummaryBuilder`] collects phase timestamps during a cycle and
//! produces a [`CycleSummary`] at the end.
//!
//! This is separate from the `tracing` log output: log lines describe what
//! happened, trace events carry [`HostTime`] stamps for timing analysis.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`DomWrite`] events and the
//!   corresponding `TraceSink` method.

use alloc::rc::Rc;
use core::cell::RefCell;

use understory_dirty::{Channel, ChannelSet};

use crate::reconcile::TriggerOutcome;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the update cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Applying a pending role reconfiguration.
    Structure,
    /// Reading host padding and writing padding styles.
    Padding,
    /// Reading viewport geometry.
    Measure,
    /// Deriving the overflow state.
    Compute,
    /// Writing classes, styles, and attributes.
    Write,
    /// Draining the echo of the cycle's own writes.
    Flush,
    /// Notifying listeners.
    Emit,
}

impl PhaseKind {
    /// Every phase, in cycle order.
    pub const ALL: [Self; 7] = [
        Self::Structure,
        Self::Padding,
        Self::Measure,
        Self::Compute,
        Self::Write,
        Self::Flush,
        Self::Emit,
    ];

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Padding => "padding",
            Self::Measure => "measure",
            Self::Compute => "compute",
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Emit => "emit",
        }
    }
}

/// What kind of DOM write was made.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteField {
    /// A class was added or removed.
    Class,
    /// An attribute was set or removed.
    Attribute,
    /// An inline style property was set or removed.
    Style,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every trigger that reaches the reconciler.
#[derive(Clone, Copy, Debug)]
pub struct TriggerEvent {
    /// Which channel fired.
    pub channel: Channel,
    /// What the reconciler did with it.
    pub outcome: TriggerOutcome,
    /// Host time of the trigger.
    pub timestamp: HostTime,
}

/// Emitted when a cycle starts running.
#[derive(Clone, Copy, Debug)]
pub struct CycleBeginEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Channels that triggered the cycle.
    pub channels: ChannelSet,
    /// Whether this is a forced update.
    pub force: bool,
    /// Host time at the start of the cycle.
    pub timestamp: HostTime,
}

/// Marks the beginning of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when an observation callback is dropped as the cycle's own echo.
#[derive(Clone, Copy, Debug)]
pub struct EchoDroppedEvent {
    /// Cycle counter of the cycle that caused the echo.
    pub cycle: u64,
    /// The suppressed channel.
    pub channel: Channel,
    /// Host time of the dropped callback.
    pub timestamp: HostTime,
}

/// Per-cycle summary produced by [`CycleSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle: u64,
    /// Channels that triggered the cycle.
    pub channels: ChannelSet,
    /// Whether this was a forced update.
    pub force: bool,
    /// Host time at the start of the cycle.
    pub begin: HostTime,
    /// Per-phase durations in microseconds, indexed like [`PhaseKind::ALL`]
    /// (0 if not measured).
    pub phase_micros: [u64; 7],
    /// DOM writes the cycle made.
    pub writes: u64,
    /// Echo callbacks dropped during the cycle.
    pub echoes_dropped: u32,
    /// Whether an `Updated` event was emitted.
    pub emitted: bool,
    /// Whether the cycle ended early (destroyed or failed).
    pub aborted: bool,
}

impl CycleSummary {
    /// Returns the duration of one phase in microseconds.
    #[must_use]
    pub const fn phase(&self, phase: PhaseKind) -> u64 {
        self.phase_micros[phase_index(phase)]
    }
}

/// A DOM write record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DomWrite {
    /// What was written.
    pub field: WriteField,
    /// Whether the write added (or set) rather than removed.
    pub set: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the reconciler.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a trigger reaches the reconciler.
    fn on_trigger(&mut self, e: &TriggerEvent) {
        _ = e;
    }

    /// Called when a cycle starts.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a cycle phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a cycle phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when an echo callback is dropped.
    fn on_echo_dropped(&mut self, e: &EchoDroppedEvent) {
        _ = e;
    }

    /// Called with a per-cycle summary.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }

    /// Called with per-cycle DOM writes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_dom_writes(&mut self, cycle: u64, writes: &[DomWrite]) {
        _ = (cycle, writes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// A shared sink, so the caller can keep reading it after handing a clone to
/// an instance.
impl<S: TraceSink + ?Sized> TraceSink for Rc<RefCell<S>> {
    fn on_trigger(&mut self, e: &TriggerEvent) {
        self.borrow_mut().on_trigger(e);
    }

    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.borrow_mut().on_cycle_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.borrow_mut().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.borrow_mut().on_phase_end(e);
    }

    fn on_echo_dropped(&mut self, e: &EchoDroppedEvent) {
        self.borrow_mut().on_echo_dropped(e);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.borrow_mut().on_cycle_summary(s);
    }

    #[cfg(feature = "trace-rich")]
    fn on_dom_writes(&mut self, cycle: u64, writes: &[DomWrite]) {
        self.borrow_mut().on_dom_writes(cycle, writes);
    }
}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TriggerEvent`].
    #[inline]
    pub fn trigger(&mut self, e: &TriggerEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_trigger(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleBeginEvent`].
    #[inline]
    pub fn cycle_begin(&mut self, e: &CycleBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cycle_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`EchoDroppedEvent`].
    #[inline]
    pub fn echo_dropped(&mut self, e: &EchoDroppedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_echo_dropped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CycleSummary`].
    #[inline]
    pub fn cycle_summary(&mut self, s: &CycleSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_cycle_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits DOM writes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn dom_writes(&mut self, cycle: u64, writes: &[DomWrite]) {
        if let Some(s) = &mut self.sink {
            s.on_dom_writes(cycle, writes);
        }
    }
}

// ---------------------------------------------------------------------------
// CycleSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a cycle and produces a [`CycleSummary`].
#[derive(Debug)]
pub struct CycleSummaryBuilder {
    begin: CycleBeginEvent,
    phase_starts: [Option<HostTime>; 7],
    phase_ends: [Option<HostTime>; 7],
    writes: u64,
    echoes_dropped: u32,
    emitted: bool,
    aborted: bool,
}

impl CycleSummaryBuilder {
    /// Starts building a summary for the given cycle.
    #[must_use]
    pub fn new(begin: &CycleBeginEvent) -> Self {
        Self {
            begin: *begin,
            phase_starts: [None; 7],
            phase_ends: [None; 7],
            writes: 0,
            echoes_dropped: 0,
            emitted: false,
            aborted: false,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Sets the number of DOM writes.
    pub fn set_writes(&mut self, writes: u64) {
        self.writes = writes;
    }

    /// Sets the number of dropped echo callbacks.
    pub fn set_echoes_dropped(&mut self, echoes: u32) {
        self.echoes_dropped = echoes;
    }

    /// Marks the cycle as having emitted `Updated`.
    pub fn set_emitted(&mut self, emitted: bool) {
        self.emitted = emitted;
    }

    /// Marks the cycle as ended early.
    pub fn set_aborted(&mut self, aborted: bool) {
        self.aborted = aborted;
    }

    /// Consumes the builder and produces the final [`CycleSummary`].
    #[must_use]
    pub fn finish(self) -> CycleSummary {
        let mut phase_micros = [0; 7];
        for phase in PhaseKind::ALL {
            phase_micros[phase_index(phase)] = self.phase_duration(phase);
        }
        CycleSummary {
            cycle: self.begin.cycle,
            channels: self.begin.channels,
            force: self.begin.force,
            begin: self.begin.timestamp,
            phase_micros,
            writes: self.writes,
            echoes_dropped: self.echoes_dropped,
            emitted: self.emitted,
            aborted: self.aborted,
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).micros(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Structure => 0,
        PhaseKind::Padding => 1,
        PhaseKind::Measure => 2,
        PhaseKind::Compute => 3,
        PhaseKind::Write => 4,
        PhaseKind::Flush => 5,
        PhaseKind::Emit => 6,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;

    fn sample_begin() -> CycleBeginEvent {
        CycleBeginEvent {
            cycle: 42,
            channels: channel::HOST_SIZE.into_set() | channel::OPTIONS.into_set(),
            force: false,
            timestamp: HostTime(1_000_000),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_cycle_begin(&sample_begin());
        sink.on_trigger(&TriggerEvent {
            channel: channel::MANUAL,
            outcome: TriggerOutcome::Scheduled,
            timestamp: HostTime(0),
        });
        sink.on_cycle_summary(&CycleSummaryBuilder::new(&sample_begin()).finish());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.cycle_begin(&sample_begin());
        tracer.phase_begin(&PhaseBeginEvent {
            cycle: 42,
            phase: PhaseKind::Measure,
            timestamp: HostTime(0),
        });
    }

    #[test]
    fn summary_builder_computes_durations() {
        let mut builder = CycleSummaryBuilder::new(&sample_begin());
        builder.phase_begin(PhaseKind::Padding, HostTime(1_000_000));
        builder.phase_end(PhaseKind::Padding, HostTime(1_000_020));
        builder.phase_begin(PhaseKind::Measure, HostTime(1_000_020));
        builder.phase_end(PhaseKind::Measure, HostTime(1_000_120));
        builder.phase_begin(PhaseKind::Write, HostTime(1_000_120));
        builder.phase_end(PhaseKind::Write, HostTime(1_000_170));
        builder.set_writes(5);
        builder.set_echoes_dropped(1);
        builder.set_emitted(true);

        let summary = builder.finish();
        assert_eq!(summary.phase(PhaseKind::Padding), 20, "padding duration");
        assert_eq!(summary.phase(PhaseKind::Measure), 100, "measure duration");
        assert_eq!(summary.phase(PhaseKind::Write), 50, "write duration");
        assert_eq!(summary.writes, 5, "writes carried through");
        assert_eq!(summary.echoes_dropped, 1, "echo counted");
        assert!(summary.emitted, "emitted flag carried through");
        assert_eq!(summary.cycle, 42, "cycle counter carried through");
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let summary = CycleSummaryBuilder::new(&sample_begin()).finish();
        for phase in PhaseKind::ALL {
            assert_eq!(summary.phase(phase), 0, "unmeasured {} phase", phase.name());
        }
        assert!(!summary.aborted, "not aborted by default");
    }

    #[test]
    fn end_before_begin_saturates() {
        let mut builder = CycleSummaryBuilder::new(&sample_begin());
        builder.phase_begin(PhaseKind::Emit, HostTime(500));
        builder.phase_end(PhaseKind::Emit, HostTime(100));
        assert_eq!(builder.finish().phase(PhaseKind::Emit), 0, "clock skew clamps to zero");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            cycles: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
                self.cycles.push(e.cycle);
            }
        }

        let mut sink = RecordingSink { cycles: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.cycle_begin(&sample_begin());
        drop(tracer);
        assert_eq!(sink.cycles, &[42], "event reached the sink");
    }
}
