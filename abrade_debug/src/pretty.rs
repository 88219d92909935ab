// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use abrade_core::delegate::DamageSource;
use abrade_core::geometry::PixelRect;
use abrade_core::trace::{
    DamageAddedEvent, DamageCause, DamageSummary, DelegatePassEvent, FrameBeginEvent, TraceSink,
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

pub(crate) fn cause_name(cause: DamageCause) -> &'static str {
    match cause {
        DamageCause::Added => "added",
        DamageCause::Removed => "removed",
        DamageCause::Reordered => "reordered",
        DamageCause::Delegate => "delegate",
        DamageCause::FullFrame => "full",
    }
}

fn source_name(source: DamageSource) -> &'static str {
    match source {
        DamageSource::ThisFrame => "this",
        DamageSource::PreviousFrame => "prev",
    }
}

struct Edges(PixelRect);

impl std::fmt::Display for Edges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let r = self.0;
        if r.is_empty() {
            f.write_str("empty")
        } else {
            write!(f, "({},{})-({},{})", r.x0, r.y0, r.x1, r.y1)
        }
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[begin] frame={} output={}x{} history={}",
            e.frame_index,
            e.output_size.width,
            e.output_size.height,
            if e.has_history { "yes" } else { "no" },
        );
    }

    fn on_delegate_pass(&mut self, e: &DelegatePassEvent) {
        let _ = writeln!(
            self.writer,
            "[delegates] frame={} pass={} changed={}",
            e.frame_index, e.pass, e.changed,
        );
    }

    fn on_damage_summary(&mut self, s: &DamageSummary) {
        let st = &s.stats;
        let _ = writeln!(
            self.writer,
            "[summary] frame={} contributions={} added={} removed={} reordered={} \
             passes={}{} damage={}{}",
            s.frame_index,
            st.contributions,
            st.added,
            st.removed,
            st.reordered,
            st.delegate_passes,
            if st.converged { "" } else { " UNCONVERGED" },
            Edges(s.damage),
            if s.full { " FULL" } else { "" },
        );
    }

    fn on_damage_added(&mut self, e: &DamageAddedEvent) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={} {} {}@{} {}",
            e.frame_index,
            cause_name(e.cause),
            source_name(e.source),
            e.paint_order,
            Edges(e.rect),
        );
    }
}
