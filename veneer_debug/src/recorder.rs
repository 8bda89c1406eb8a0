// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! [`on_dom_writes`](TraceSink::on_dom_writes) stores only the count.

use understory_dirty::{Channel, ChannelSet};
use veneer_core::reconcile::TriggerOutcome;
use veneer_core::time::HostTime;
use veneer_core::trace::{
    CycleBeginEvent, CycleSummary, DomWrite, EchoDroppedEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, TraceSink, TriggerEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TRIGGER: u8 = 1;
const TAG_CYCLE_BEGIN: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_ECHO_DROPPED: u8 = 5;
const TAG_CYCLE_SUMMARY: u8 = 6;
const TAG_DOM_WRITES_COUNT: u8 = 7;

const OUTCOMES: [TriggerOutcome; 5] = [
    TriggerOutcome::Scheduled,
    TriggerOutcome::Coalesced,
    TriggerOutcome::Deferred,
    TriggerOutcome::Suppressed,
    TriggerOutcome::Ignored,
];

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_channels(&mut self, set: ChannelSet) {
        let mask = set
            .into_iter()
            .fold(0_u64, |mask, channel| mask | (1 << channel.index()));
        self.write_u64(mask);
    }

    fn write_outcome(&mut self, outcome: TriggerOutcome) {
        let index = OUTCOMES.iter().position(|o| *o == outcome).unwrap_or(0);
        #[expect(clippy::cast_possible_truncation, reason = "five outcomes")]
        self.write_u8(index as u8);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        let index = PhaseKind::ALL.iter().position(|k| *k == p).unwrap_or(0);
        #[expect(clippy::cast_possible_truncation, reason = "seven phases")]
        self.write_u8(index as u8);
    }
}

impl TraceSink for RecorderSink {
    fn on_trigger(&mut self, e: &TriggerEvent) {
        self.write_u8(TAG_TRIGGER);
        self.write_u8(e.channel.index());
        self.write_outcome(e.outcome);
        self.write_u64(e.timestamp.micros());
    }

    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.write_u8(TAG_CYCLE_BEGIN);
        self.write_u64(e.cycle);
        self.write_channels(e.channels);
        self.write_bool(e.force);
        self.write_u64(e.timestamp.micros());
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.micros());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.micros());
    }

    fn on_echo_dropped(&mut self, e: &EchoDroppedEvent) {
        self.write_u8(TAG_ECHO_DROPPED);
        self.write_u64(e.cycle);
        self.write_u8(e.channel.index());
        self.write_u64(e.timestamp.micros());
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.write_u8(TAG_CYCLE_SUMMARY);
        self.write_u64(s.cycle);
        self.write_channels(s.channels);
        self.write_bool(s.force);
        self.write_u64(s.begin.micros());
        for micros in s.phase_micros {
            self.write_u64(micros);
        }
        self.write_u64(s.writes);
        self.write_u32(s.echoes_dropped);
        self.write_bool(s.emitted);
        self.write_bool(s.aborted);
    }

    fn on_dom_writes(&mut self, cycle: u64, writes: &[DomWrite]) {
        self.write_u8(TAG_DOM_WRITES_COUNT);
        self.write_u64(cycle);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "DOM write count capped at u32::MAX for recording"
        )]
        self.write_u32(writes.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`TriggerEvent`].
    Trigger(TriggerEvent),
    /// A [`CycleBeginEvent`].
    CycleBegin(CycleBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// An [`EchoDroppedEvent`].
    EchoDropped(EchoDroppedEvent),
    /// A [`CycleSummary`].
    CycleSummary(CycleSummary),
    /// DOM write count for a cycle.
    DomWritesCount {
        /// Cycle counter.
        cycle: u64,
        /// Number of DOM writes.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_channel(&mut self) -> Option<Channel> {
        self.read_u8().map(Channel::new)
    }

    fn read_channels(&mut self) -> Option<ChannelSet> {
        let mask = self.read_u64()?;
        let mut set = ChannelSet::empty();
        for index in 0..64_u8 {
            if mask & (1 << index) != 0 {
                set.insert(Channel::new(index));
            }
        }
        Some(set)
    }

    fn read_outcome(&mut self) -> Option<TriggerOutcome> {
        OUTCOMES.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_trigger(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Trigger(TriggerEvent {
            channel: self.read_channel()?,
            outcome: self.read_outcome()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_cycle_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleBegin(CycleBeginEvent {
            cycle: self.read_u64()?,
            channels: self.read_channels()?,
            force: self.read_bool()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_echo_dropped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::EchoDropped(EchoDroppedEvent {
            cycle: self.read_u64()?,
            channel: self.read_channel()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_cycle_summary(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let channels = self.read_channels()?;
        let force = self.read_bool()?;
        let begin = self.read_time()?;
        let mut phase_micros = [0; 7];
        for slot in &mut phase_micros {
            *slot = self.read_u64()?;
        }
        Some(RecordedEvent::CycleSummary(CycleSummary {
            cycle,
            channels,
            force,
            begin,
            phase_micros,
            writes: self.read_u64()?,
            echoes_dropped: self.read_u32()?,
            emitted: self.read_bool()?,
            aborted: self.read_bool()?,
        }))
    }

    fn decode_dom_writes_count(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DomWritesCount { cycle, count })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TRIGGER => self.decode_trigger(),
            TAG_CYCLE_BEGIN => self.decode_cycle_begin(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_ECHO_DROPPED => self.decode_echo_dropped(),
            TAG_CYCLE_SUMMARY => self.decode_cycle_summary(),
            TAG_DOM_WRITES_COUNT => self.decode_dom_writes_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::channel;
    use veneer_core::trace::{CycleSummaryBuilder, WriteField};

    fn sample_begin() -> CycleBeginEvent {
        CycleBeginEvent {
            cycle: 3,
            channels: channel::HOST_SIZE.into_set() | channel::MANUAL.into_set(),
            force: true,
            timestamp: HostTime(1_000_000),
        }
    }

    #[test]
    fn cycle_begin_keeps_its_channel_set() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&sample_begin());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1, "one event");
        match &events[0] {
            RecordedEvent::CycleBegin(e) => {
                assert_eq!(e.cycle, 3, "cycle counter");
                assert_eq!(e.channels, sample_begin().channels, "channel set");
                assert!(e.force, "force flag");
                assert_eq!(e.timestamp, HostTime(1_000_000), "timestamp");
            }
            other => panic!("expected CycleBegin, got {other:?}"),
        }
    }

    #[test]
    fn trigger_outcomes_survive_recording() {
        let mut rec = RecorderSink::new();
        for outcome in OUTCOMES {
            rec.on_trigger(&TriggerEvent {
                channel: channel::CONTENT_TREE,
                outcome,
                timestamp: HostTime(5),
            });
        }
        let decoded: Vec<_> = decode(rec.as_bytes())
            .map(|e| match e {
                RecordedEvent::Trigger(t) => t.outcome,
                other => panic!("expected Trigger, got {other:?}"),
            })
            .collect();
        assert_eq!(decoded, OUTCOMES, "every outcome in order");
    }

    #[test]
    fn cycle_summary_keeps_phase_durations() {
        let mut builder = CycleSummaryBuilder::new(&sample_begin());
        builder.phase_begin(PhaseKind::Measure, HostTime(10));
        builder.phase_end(PhaseKind::Measure, HostTime(35));
        builder.set_writes(4);
        builder.set_echoes_dropped(2);
        builder.set_emitted(true);
        let orig = builder.finish();

        let mut rec = RecorderSink::new();
        rec.on_cycle_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::CycleSummary(s)] => {
                assert_eq!(s.phase(PhaseKind::Measure), 25, "measure duration");
                assert_eq!(s.phase_micros, orig.phase_micros, "all phases");
                assert_eq!(s.writes, 4, "writes");
                assert_eq!(s.echoes_dropped, 2, "echoes");
                assert!(s.emitted && !s.aborted, "flags");
            }
            other => panic!("expected one CycleSummary, got {other:?}"),
        }
    }

    #[test]
    fn dom_writes_are_counted() {
        let mut rec = RecorderSink::new();
        let writes = [
            DomWrite {
                field: WriteField::Class,
                set: true,
            },
            DomWrite {
                field: WriteField::Style,
                set: false,
            },
        ];
        rec.on_dom_writes(9, &writes);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::DomWritesCount { cycle, count }] => {
                assert_eq!(*cycle, 9, "cycle");
                assert_eq!(*count, 2, "count");
            }
            other => panic!("expected one DomWritesCount, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 1,
            phase: PhaseKind::Write,
            timestamp: HostTime(100),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 1,
            phase: PhaseKind::Write,
            timestamp: HostTime(120),
        });
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1, "only the complete record decodes");
        assert!(matches!(events[0], RecordedEvent::PhaseBegin(_)), "phase begin survives");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0, "no events");
    }
}
