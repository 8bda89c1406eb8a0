// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are host microseconds.

use std::io::Write;

use understory_dirty::ChannelSet;
use veneer_core::channel;
use veneer_core::trace::{
    CycleBeginEvent, CycleSummary, DomWrite, EchoDroppedEvent, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, TraceSink, TriggerEvent, WriteField,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Formats a channel set as `a+b+c`.
fn channels(set: ChannelSet) -> String {
    let names: Vec<&str> = set.into_iter().map(channel::name).collect();
    if names.is_empty() {
        String::from("-")
    } else {
        names.join("+")
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_trigger(&mut self, e: &TriggerEvent) {
        let _ = writeln!(
            self.writer,
            "[trigger] {} {:?} at {}µs",
            channel::name(e.channel),
            e.outcome,
            e.timestamp.micros(),
        );
    }

    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] #{} channels={} force={} at {}µs",
            e.cycle,
            channels(e.channels),
            e.force,
            e.timestamp.micros(),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] cycle={} {} at {}µs",
            e.cycle,
            e.phase.name(),
            e.timestamp.micros(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] cycle={} {} at {}µs",
            e.cycle,
            e.phase.name(),
            e.timestamp.micros(),
        );
    }

    fn on_echo_dropped(&mut self, e: &EchoDroppedEvent) {
        let _ = writeln!(
            self.writer,
            "[echo] cycle={} dropped {} at {}µs",
            e.cycle,
            channel::name(e.channel),
            e.timestamp.micros(),
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let mut phases = String::new();
        for phase in PhaseKind::ALL {
            let micros = s.phase(phase);
            if micros > 0 {
                phases.push_str(&format!(" {}={micros}µs", phase.name()));
            }
        }
        let outcome = if s.aborted {
            "aborted"
        } else if s.emitted {
            "emitted"
        } else {
            "quiet"
        };
        let _ = writeln!(
            self.writer,
            "[summary] cycle={} channels={} writes={} echoes={}{phases} {outcome}",
            s.cycle,
            channels(s.channels),
            s.writes,
            s.echoes_dropped,
        );
    }

    fn on_dom_writes(&mut self, cycle: u64, writes: &[DomWrite]) {
        let count = |field| writes.iter().filter(|w| w.field == field).count();
        let _ = writeln!(
            self.writer,
            "[writes] cycle={cycle} class={} attribute={} style={}",
            count(WriteField::Class),
            count(WriteField::Attribute),
            count(WriteField::Style),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veneer_core::reconcile::TriggerOutcome;
    use veneer_core::time::HostTime;
    use veneer_core::trace::CycleSummaryBuilder;

    #[test]
    fn pretty_print_trigger() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_trigger(&TriggerEvent {
            channel: channel::HOST_SIZE,
            outcome: TriggerOutcome::Coalesced,
            timestamp: HostTime(1_500),
        });
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.starts_with("[trigger] host-size Coalesced"), "got: {output}");
        assert!(output.contains("1500µs"), "got: {output}");
    }

    #[test]
    fn summary_lists_measured_phases_only() {
        let begin = CycleBeginEvent {
            cycle: 2,
            channels: channel::OPTIONS.into_set(),
            force: false,
            timestamp: HostTime(0),
        };
        let mut builder = CycleSummaryBuilder::new(&begin);
        builder.phase_begin(PhaseKind::Write, HostTime(10));
        builder.phase_end(PhaseKind::Write, HostTime(14));
        builder.set_writes(3);

        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_cycle_summary(&builder.finish());
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert!(output.contains("channels=options"), "got: {output}");
        assert!(output.contains("write=4µs"), "got: {output}");
        assert!(!output.contains("measure="), "unmeasured phase omitted: {output}");
        assert!(output.trim_end().ends_with("quiet"), "got: {output}");
    }

    #[test]
    fn dom_writes_are_tallied_by_field() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        let write = |field| DomWrite { field, set: true };
        sink.on_dom_writes(
            5,
            &[write(WriteField::Class), write(WriteField::Class), write(WriteField::Style)],
        );
        let output = String::from_utf8(sink.into_writer()).unwrap();
        assert_eq!(
            output, "[writes] cycle=5 class=2 attribute=0 style=1\n",
            "one line per cycle"
        );
    }
}
