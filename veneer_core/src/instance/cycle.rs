// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The update cycle.
//!
//! One cycle runs these phases in order, each bracketed by trace events:
//!
//! 1. **Structure**: apply a pending role reconfiguration and follow payload
//!    changes with the content watchers.
//! 2. **Padding**: read the host padding and position the padding target.
//!    This comes first because it changes what the viewport measures.
//! 3. **Measure**: read host and viewport geometry.
//! 4. **Compute**: derive the [`OverflowState`](crate::overflow::OverflowState).
//! 5. **Write**: reconcile classes, styles, and attributes with the state.
//! 6. **Flush**: drain observer records caused by the writes.
//! 7. **Emit**: notify listeners, if anything changed or the run was forced.
//!
//! Writes go through the structure's ledger, which skips writes that would
//! not change the document. A cycle over unchanged geometry therefore writes
//! nothing, and nothing it does can schedule another cycle.

use alloc::string::String;

use kurbo::{Insets, Size};
use understory_dirty::ChannelSet;

use super::state::Measured;
use super::{Event, Instance, UpdateChanges};
use crate::channel;
use crate::dom::{Dom, number, px};
use crate::geometry::{Axis, Xy};
use crate::options::{Options, ScrollbarsVisibility};
use crate::overflow::{OverflowGeometry, OverflowStyle, compute_state, host_overflow};
use crate::runtime::Platform;
use crate::structure::{BuildError, Ledger, ScrollbarElements};
use crate::style;
use crate::trace::{
    CycleBeginEvent, CycleSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
};

/// Why a cycle ended early.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// The instance has no structure to reconcile.
    #[error("instance has no structure")]
    StructureMissing,
    /// A pending role reconfiguration was rejected.
    #[error("reconfiguration failed: {0}")]
    Reconfigure(#[from] BuildError),
}

enum Outcome {
    Emit(UpdateChanges),
    Quiet,
    Aborted,
}

/// Inset property and matching viewport padding property, per side.
const SIDES: [(&str, &str); 4] = [
    ("top", "padding-top"),
    ("right", "padding-right"),
    ("bottom", "padding-bottom"),
    ("left", "padding-left"),
];

/// Insets in [`SIDES`] order.
fn sides(insets: Insets) -> [f64; 4] {
    [insets.y0, insets.x1, insets.y1, insets.x0]
}

impl<P: Platform> Instance<P> {
    /// Runs one cycle. Returns `true` if `Updated` was emitted.
    pub(super) fn run(&self, force: bool) -> bool {
        let inner = &self.inner;
        let Some(channels) = inner.reconciler.begin_cycle() else {
            return false;
        };
        inner.echoes.set(0);
        let begin = CycleBeginEvent {
            cycle: inner.reconciler.cycles(),
            channels,
            force,
            timestamp: inner.platform.now(),
        };
        self.with_tracer(|t| t.cycle_begin(&begin));
        let mut summary = CycleSummaryBuilder::new(&begin);
        let writes_before = self.ledger_writes();

        let outcome = match self.reconcile(channels, force, &mut summary) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(cycle = begin.cycle, %err, "update cycle aborted");
                Outcome::Aborted
            }
        };
        // An aborted phase may have left the echo window open.
        inner.reconciler.end_suppression();

        let emitted = match outcome {
            Outcome::Emit(changes) => {
                self.phase(&mut summary, PhaseKind::Emit, || {
                    self.emit(&Event::Updated {
                        changes: &changes,
                        force,
                    });
                });
                true
            }
            Outcome::Quiet => false,
            Outcome::Aborted => {
                summary.set_aborted(true);
                false
            }
        };

        summary.set_writes(self.ledger_writes().saturating_sub(writes_before));
        summary.set_echoes_dropped(inner.echoes.get());
        summary.set_emitted(emitted);
        let summary = summary.finish();
        #[cfg(feature = "trace-rich")]
        let log = self.take_write_log();
        self.with_tracer(|t| {
            #[cfg(feature = "trace-rich")]
            t.dom_writes(summary.cycle, &log);
            t.cycle_summary(&summary);
        });
        tracing::trace!(
            cycle = summary.cycle,
            writes = summary.writes,
            echoes = summary.echoes_dropped,
            emitted,
            "cycle done"
        );

        inner.reconciler.finish_cycle();
        emitted
    }

    fn reconcile(
        &self,
        channels: ChannelSet,
        force: bool,
        summary: &mut CycleSummaryBuilder,
    ) -> Result<Outcome, CycleError> {
        let structure = self.phase(summary, PhaseKind::Structure, || {
            let changed = self.apply_elements()?;
            // New payload nodes need size watchers.
            if !changed && channels.contains(channel::CONTENT_TREE) {
                self.sync_content_subscriptions();
            }
            Ok::<_, CycleError>(changed)
        })?;
        if self.is_destroyed() {
            return Ok(Outcome::Aborted);
        }
        let options = self.inner.options.borrow().clone();

        let padding = self.phase(summary, PhaseKind::Padding, || self.write_padding(&options))?;
        let mut next = self.phase(summary, PhaseKind::Measure, || self.measure(padding, &options))?;
        next.overflow = self.phase(summary, PhaseKind::Compute, || {
            let geometry = OverflowGeometry {
                client: next.client,
                scroll: next.scroll,
                device_pixel_ratio: self.inner.platform.dom().device_pixel_ratio(),
            };
            compute_state(&geometry, options.overflow, &self.inner.env.epsilon())
        });
        if self.is_destroyed() {
            return Ok(Outcome::Aborted);
        }
        self.phase(summary, PhaseKind::Write, || self.write_state(&mut next, &options))?;
        self.phase(summary, PhaseKind::Flush, || {
            self.inner.observers.take_records();
            self.inner.reconciler.end_suppression();
        });

        let previous = self.inner.measured.replace(next.clone());
        let mut changes = previous.changes(&next);
        changes.structure = structure;
        changes.host_mutation = channels.contains(channel::HOST_ATTRIBUTES);
        changes.content_mutation = channels.contains(channel::CONTENT_TREE);
        changes.options = self.inner.pending_options.take();

        if self.is_destroyed() {
            return Ok(Outcome::Aborted);
        }
        Ok(if force || changes.any() {
            Outcome::Emit(changes)
        } else {
            Outcome::Quiet
        })
    }

    /// Runs `f` as one traced phase.
    fn phase<R>(&self, summary: &mut CycleSummaryBuilder, phase: PhaseKind, f: impl FnOnce() -> R) -> R {
        let cycle = self.inner.reconciler.cycles();
        let start = self.inner.platform.now();
        summary.phase_begin(phase, start);
        self.with_tracer(|t| {
            t.phase_begin(&PhaseBeginEvent {
                cycle,
                phase,
                timestamp: start,
            });
        });
        let result = f();
        let end = self.inner.platform.now();
        summary.phase_end(phase, end);
        self.with_tracer(|t| {
            t.phase_end(&PhaseEndEvent {
                cycle,
                phase,
                timestamp: end,
            });
        });
        result
    }

    /// Applies a pending [`ElementsConfig`](crate::structure::ElementsConfig).
    fn apply_elements(&self) -> Result<bool, CycleError> {
        let Some(config) = self.inner.pending_elements.borrow_mut().take() else {
            return Ok(false);
        };
        let dom = self.inner.platform.dom();
        self.inner.reconciler.suppress(channel::structure_echo());
        let result = match self.inner.structure.borrow_mut().as_mut() {
            Some(structure) => structure
                .reconfigure(dom, &config)
                .map(|changed| (changed, structure.elements()))
                .map_err(CycleError::from),
            None => Err(CycleError::StructureMissing),
        };
        self.inner.observers.take_records();
        self.inner.reconciler.end_suppression();

        let (changed, elements) = result?;
        if changed {
            *self.inner.elements.borrow_mut() = elements;
            self.sync_content_subscriptions();
        }
        Ok(changed)
    }

    /// Positions the padding target for the padding mode.
    ///
    /// The padding target sits against the host's padding box. Without
    /// absolute padding the viewport takes the host padding as its own, so
    /// content scrolls under it; with it, the target is inset instead.
    fn write_padding(&self, options: &Options) -> Result<Insets, CycleError> {
        let dom = self.inner.platform.dom();
        let mut slot = self.inner.structure.borrow_mut();
        let structure = slot.as_mut().ok_or(CycleError::StructureMissing)?;
        let padding = dom.padding(structure.host());
        let (insets, viewport_padding) = if options.padding_absolute {
            (padding, Insets::ZERO)
        } else {
            (Insets::ZERO, padding)
        };
        let target = structure.padding_target().clone();
        let viewport = structure.viewport().clone();

        self.inner.reconciler.suppress(channel::style_echo());
        let ledger = &mut structure.ledger;
        for ((inset, _), value) in SIDES.iter().zip(sides(insets)) {
            write_length(ledger, dom, &target, inset, value);
        }
        for ((_, padding_property), value) in SIDES.iter().zip(sides(viewport_padding)) {
            write_length(ledger, dom, &viewport, padding_property, value);
        }
        Ok(padding)
    }

    fn measure(&self, padding: Insets, options: &Options) -> Result<Measured, CycleError> {
        let dom = self.inner.platform.dom();
        let slot = self.inner.structure.borrow();
        let structure = slot.as_ref().ok_or(CycleError::StructureMissing)?;
        let host = dom.metrics(structure.host());
        let viewport = dom.metrics(structure.viewport());
        Ok(Measured {
            host_size: host.offset,
            padding,
            padding_absolute: options.padding_absolute,
            client: viewport.client,
            scroll: viewport.scroll,
            rtl: dom.computed_style(structure.host(), "direction") == "rtl",
            ..Measured::default()
        })
    }

    /// Writes `next` to the document and records the theme it applied.
    fn write_state(&self, next: &mut Measured, options: &Options) -> Result<(), CycleError> {
        let dom = self.inner.platform.dom();
        let mut slot = self.inner.structure.borrow_mut();
        let structure = slot.as_mut().ok_or(CycleError::StructureMissing)?;
        let elements = structure.elements();
        let previous_theme = self.inner.measured.borrow().theme.clone();

        self.inner.reconciler.suppress(channel::style_echo());
        let ledger = &mut structure.ledger;
        let state = &next.overflow;

        ledger.set_style(dom, &elements.viewport, "overflow-x", state.style.x.as_str());
        ledger.set_style(dom, &elements.viewport, "overflow-y", state.style.y.as_str());

        let visible = host_overflow(state) == OverflowStyle::Visible;
        ledger.set_class(dom, &elements.host, style::OVERFLOW_VISIBLE, visible);
        if let Some(padding) = &elements.padding {
            ledger.set_class(dom, padding, style::OVERFLOW_VISIBLE, visible);
        }
        ledger.set_class(dom, &elements.host, style::HAS_OVERFLOW_X, state.has_overflow.x);
        ledger.set_class(dom, &elements.host, style::HAS_OVERFLOW_Y, state.has_overflow.y);
        ledger.set_class(dom, &elements.host, style::RTL, next.rtl);

        let theme = options.scrollbars.theme.as_str();
        let bars = Xy::new(&elements.scrollbar_horizontal, &elements.scrollbar_vertical);
        for axis in [Axis::X, Axis::Y] {
            let Some(bar) = bars.get(axis) else {
                continue;
            };
            let shown = match options.scrollbars.visibility {
                ScrollbarsVisibility::Visible => true,
                ScrollbarsVisibility::Hidden => false,
                ScrollbarsVisibility::Auto => *state.has_overflow.get(axis),
            };
            write_scrollbar(ledger, dom, bar, shown);
            if let Some(old) = previous_theme.as_deref().filter(|old| *old != theme) {
                ledger.set_class(dom, &bar.scrollbar, old, false);
            }
            if !theme.is_empty() {
                ledger.add_class(dom, &bar.scrollbar, theme);
            }
            let ratio = handle_ratio(next.client, next.scroll, axis);
            ledger.set_style(dom, &bar.handle, style::HANDLE_RATIO, &number(ratio));
        }
        next.theme = (!theme.is_empty()).then(|| String::from(theme));
        Ok(())
    }

    fn ledger_writes(&self) -> u64 {
        self.inner
            .structure
            .borrow()
            .as_ref()
            .map_or(0, |s| s.ledger.writes())
    }

    #[cfg(feature = "trace-rich")]
    fn take_write_log(&self) -> alloc::vec::Vec<crate::trace::DomWrite> {
        self.inner
            .structure
            .borrow_mut()
            .as_mut()
            .map(|s| s.ledger.take_log())
            .unwrap_or_default()
    }
}

/// Sets a px length, or removes the property when it is zero.
fn write_length<D: Dom>(ledger: &mut Ledger<D::Node>, dom: &D, node: &D::Node, property: &str, value: f64) {
    let length = px(value);
    if length == "0px" {
        ledger.remove_style(dom, node, property);
    } else {
        ledger.set_style(dom, node, property, &length);
    }
}

fn write_scrollbar<D: Dom>(
    ledger: &mut Ledger<D::Node>,
    dom: &D,
    bar: &ScrollbarElements<D::Node>,
    shown: bool,
) {
    ledger.set_class(dom, &bar.scrollbar, style::SCROLLBAR_VISIBLE, shown);
    ledger.set_attribute(dom, &bar.scrollbar, "aria-hidden", if shown { "false" } else { "true" });
}

/// Visible fraction of the scrollable extent on `axis`, in `0..=1`.
fn handle_ratio(client: Size, scroll: Size, axis: Axis) -> f64 {
    let client: Xy<f64> = client.into();
    let scroll: Xy<f64> = scroll.into();
    let (client, scroll) = (*client.get(axis), *scroll.get(axis));
    if scroll > 0.0 {
        (client / scroll).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_ratio_is_the_visible_fraction() {
        let client = Size::new(100.0, 200.0);
        let scroll = Size::new(100.0, 800.0);
        assert_eq!(handle_ratio(client, scroll, Axis::X), 1.0, "no overflow shows everything");
        assert_eq!(handle_ratio(client, scroll, Axis::Y), 0.25, "a quarter is visible");
        assert_eq!(handle_ratio(Size::ZERO, Size::ZERO, Axis::Y), 1.0, "empty viewport");
    }

    #[test]
    fn sides_follow_css_order() {
        let insets = Insets::new(4.0, 1.0, 2.0, 3.0);
        assert_eq!(sides(insets), [1.0, 2.0, 3.0, 4.0], "top, right, bottom, left");
    }
}
