// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export_json`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Cycles become duration slices per phase; triggers, echoes, and summaries
//! become instant events.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use veneer_core::channel;
use veneer_core::trace::PhaseKind;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are already microseconds, the format's native unit.
pub fn export_json(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(event).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn event(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::Trigger(e) => json!({
            "ph": "i",
            "name": "Trigger",
            "cat": "Reconciler",
            "ts": e.timestamp.micros(),
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "channel": channel::name(e.channel),
                "outcome": format!("{:?}", e.outcome),
            }
        }),
        RecordedEvent::CycleBegin(e) => json!({
            "ph": "i",
            "name": "CycleBegin",
            "cat": "Cycle",
            "ts": e.timestamp.micros(),
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "cycle": e.cycle,
                "channels": e.channels.into_iter().map(channel::name).collect::<Vec<_>>(),
                "force": e.force,
            }
        }),
        RecordedEvent::PhaseBegin(e) => phase("B", e.cycle, e.phase, e.timestamp.micros()),
        RecordedEvent::PhaseEnd(e) => phase("E", e.cycle, e.phase, e.timestamp.micros()),
        RecordedEvent::EchoDropped(e) => json!({
            "ph": "i",
            "name": "EchoDropped",
            "cat": "Reconciler",
            "ts": e.timestamp.micros(),
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "cycle": e.cycle,
                "channel": channel::name(e.channel),
            }
        }),
        RecordedEvent::CycleSummary(s) => {
            let phases: serde_json::Map<String, Value> = PhaseKind::ALL
                .into_iter()
                .map(|p| (format!("{}_us", p.name()), Value::from(s.phase(p))))
                .collect();
            json!({
                "ph": "i",
                "name": "CycleSummary",
                "cat": "Summary",
                "ts": s.begin.micros(),
                "pid": 0,
                "tid": 0,
                "s": "g",
                "args": {
                    "cycle": s.cycle,
                    "force": s.force,
                    "phases": phases,
                    "writes": s.writes,
                    "echoes_dropped": s.echoes_dropped,
                    "emitted": s.emitted,
                    "aborted": s.aborted,
                }
            })
        }
        RecordedEvent::DomWritesCount { cycle, count } => json!({
            "ph": "i",
            "name": "DomWrites",
            "cat": "Rich",
            "ts": 0,
            "pid": 0,
            "tid": 0,
            "s": "p",
            "args": {
                "cycle": cycle,
                "count": count,
            }
        }),
    }
}

fn phase(ph: &str, cycle: u64, kind: PhaseKind, ts: u64) -> Value {
    json!({
        "ph": ph,
        "name": kind.name(),
        "cat": "Cycle",
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "args": {
            "cycle": cycle,
        }
    })
}
