// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use abrade_core::context::FrameStats;
use abrade_core::delegate::DamageSource;
use abrade_core::geometry::{OutputSize, PixelRect};
use abrade_core::trace::{
    DamageAddedEvent, DamageCause, DamageSummary, DelegatePassEvent, FrameBeginEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_BEGIN: u8 = 1;
const TAG_DELEGATE_PASS: u8 = 2;
const TAG_DAMAGE_SUMMARY: u8 = 3;
const TAG_DAMAGE_ADDED: u8 = 4;

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

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_rect(&mut self, r: PixelRect) {
        self.write_i32(r.x0);
        self.write_i32(r.y0);
        self.write_i32(r.x1);
        self.write_i32(r.y1);
    }

    fn write_source(&mut self, s: DamageSource) {
        self.write_u8(match s {
            DamageSource::ThisFrame => 0,
            DamageSource::PreviousFrame => 1,
        });
    }

    fn write_cause(&mut self, c: DamageCause) {
        self.write_u8(match c {
            DamageCause::Added => 0,
            DamageCause::Removed => 1,
            DamageCause::Reordered => 2,
            DamageCause::Delegate => 3,
            DamageCause::FullFrame => 4,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.output_size.width);
        self.write_u32(e.output_size.height);
        self.write_bool(e.has_history);
    }

    fn on_delegate_pass(&mut self, e: &DelegatePassEvent) {
        self.write_u8(TAG_DELEGATE_PASS);
        self.write_u64(e.frame_index);
        self.write_u32(e.pass);
        self.write_bool(e.changed);
    }

    fn on_damage_summary(&mut self, s: &DamageSummary) {
        self.write_u8(TAG_DAMAGE_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.stats.contributions);
        self.write_u32(s.stats.added);
        self.write_u32(s.stats.removed);
        self.write_u32(s.stats.reordered);
        self.write_u32(s.stats.delegate_passes);
        self.write_bool(s.stats.converged);
        self.write_bool(s.full);
        self.write_rect(s.damage);
    }

    fn on_damage_added(&mut self, e: &DamageAddedEvent) {
        self.write_u8(TAG_DAMAGE_ADDED);
        self.write_u64(e.frame_index);
        self.write_rect(e.rect);
        self.write_source(e.source);
        self.write_u64(u64::try_from(e.paint_order).unwrap_or(u64::MAX));
        self.write_cause(e.cause);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`DelegatePassEvent`].
    DelegatePass(DelegatePassEvent),
    /// A [`DamageSummary`].
    DamageSummary(DamageSummary),
    /// A [`DamageAddedEvent`].
    DamageAdded(DamageAddedEvent),
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
        self.take::<1>().map(|[b]| b)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|v| v != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_rect(&mut self) -> Option<PixelRect> {
        Some(PixelRect::new(
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
        ))
    }

    fn read_source(&mut self) -> Option<DamageSource> {
        Some(match self.read_u8()? {
            0 => DamageSource::ThisFrame,
            _ => DamageSource::PreviousFrame,
        })
    }

    fn read_cause(&mut self) -> Option<DamageCause> {
        Some(match self.read_u8()? {
            0 => DamageCause::Added,
            1 => DamageCause::Removed,
            2 => DamageCause::Reordered,
            3 => DamageCause::Delegate,
            _ => DamageCause::FullFrame,
        })
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            output_size: OutputSize::new(self.read_u32()?, self.read_u32()?),
            has_history: self.read_bool()?,
        }))
    }

    fn decode_delegate_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DelegatePass(DelegatePassEvent {
            frame_index: self.read_u64()?,
            pass: self.read_u32()?,
            changed: self.read_bool()?,
        }))
    }

    fn decode_damage_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DamageSummary(DamageSummary {
            frame_index: self.read_u64()?,
            stats: FrameStats {
                contributions: self.read_u32()?,
                added: self.read_u32()?,
                removed: self.read_u32()?,
                reordered: self.read_u32()?,
                delegate_passes: self.read_u32()?,
                converged: self.read_bool()?,
            },
            full: self.read_bool()?,
            damage: self.read_rect()?,
        }))
    }

    fn decode_damage_added(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DamageAdded(DamageAddedEvent {
            frame_index: self.read_u64()?,
            rect: self.read_rect()?,
            source: self.read_source()?,
            paint_order: usize::try_from(self.read_u64()?).unwrap_or(usize::MAX),
            cause: self.read_cause()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_DELEGATE_PASS => self.decode_delegate_pass(),
            TAG_DAMAGE_SUMMARY => self.decode_damage_summary(),
            TAG_DAMAGE_ADDED => self.decode_damage_added(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
