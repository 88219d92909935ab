// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for damage computation.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! damage context calls while it computes a frame. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates per-rectangle `DamageAddedEvent`s
//!   and the corresponding `TraceSink` method.

use crate::context::FrameStats;
#[cfg(feature = "trace-rich")]
use crate::delegate::DamageSource;
use crate::geometry::{OutputSize, PixelRect};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a damage rectangle was added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageCause {
    /// A contribution with no equivalent in the previous frame.
    Added,
    /// A previous contribution with no equivalent in this frame.
    Removed,
    /// An unchanged contribution whose order changed relative to an
    /// overlapping one.
    Reordered,
    /// Additional damage reported by a delegate.
    Delegate,
    /// Whole-output damage (no usable history, or delegates did not settle).
    FullFrame,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted by [`DamageContext::init`](crate::context::DamageContext::init).
#[derive(Clone, Copy, Debug)]
pub struct FrameBeginEvent {
    /// Monotonic frame counter of the damage context.
    pub frame_index: u64,
    /// Size of the render target.
    pub output_size: OutputSize,
    /// Whether a previous snapshot was supplied.
    pub has_history: bool,
}

/// Emitted after each pass of the delegate fixed-point loop.
#[derive(Clone, Copy, Debug)]
pub struct DelegatePassEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Zero-based pass number.
    pub pass: u32,
    /// Whether any delegate reported different damage in this pass.
    pub changed: bool,
}

/// Per-frame summary emitted at the end of
/// [`finish`](crate::context::DamageContext::finish).
#[derive(Clone, Copy, Debug)]
pub struct DamageSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Counters collected while diffing.
    pub stats: FrameStats,
    /// Whether the whole output was damaged.
    pub full: bool,
    /// Final damage bounds.
    pub damage: PixelRect,
}

/// One damage rectangle as it is added (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageAddedEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// The rectangle, rounded out to pixels.
    pub rect: PixelRect,
    /// Which frame the damaging contribution belongs to.
    pub source: DamageSource,
    /// Paint order of the damaging contribution in its own frame.
    pub paint_order: usize,
    /// Why the rectangle was added.
    pub cause: DamageCause,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from damage computation.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame is opened.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// Called after each delegate convergence pass.
    fn on_delegate_pass(&mut self, e: &DelegatePassEvent) {
        _ = e;
    }

    /// Called with the per-frame summary.
    fn on_damage_summary(&mut self, s: &DamageSummary) {
        _ = s;
    }

    /// Called for every damage rectangle (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_added(&mut self, e: &DamageAddedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

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

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DelegatePassEvent`].
    #[inline]
    pub fn delegate_pass(&mut self, e: &DelegatePassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_delegate_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DamageSummary`].
    #[inline]
    pub fn damage_summary(&mut self, s: &DamageSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_damage_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`DamageAddedEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_added(&mut self, e: &DamageAddedEvent) {
        if let Some(s) = &mut self.sink {
            s.on_damage_added(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_begin() -> FrameBeginEvent {
        FrameBeginEvent {
            frame_index: 42,
            output_size: OutputSize::new(640, 480),
            has_history: true,
        }
    }

    fn sample_summary() -> DamageSummary {
        DamageSummary {
            frame_index: 42,
            stats: FrameStats {
                contributions: 3,
                added: 1,
                removed: 0,
                reordered: 2,
                delegate_passes: 1,
                converged: true,
            },
            full: false,
            damage: PixelRect::new(0, 0, 15, 15),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_frame_begin(&sample_begin());
        sink.on_delegate_pass(&DelegatePassEvent {
            frame_index: 42,
            pass: 0,
            changed: false,
        });
        sink.on_damage_summary(&sample_summary());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.frame_begin(&sample_begin());
        tracer.damage_summary(&sample_summary());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.frame_begin(&sample_begin());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }
}
