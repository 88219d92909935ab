// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Damage events carry no wall-clock time. Each frame is laid out on a
//! synthetic timeline of [`FRAME_SPAN_US`] microseconds starting at
//! `frame_index * FRAME_SPAN_US`, with one microsecond per event inside it.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use abrade_core::geometry::PixelRect;

use crate::pretty::cause_name;
use crate::recorder::{RecordedEvent, decode};

/// Width of one frame on the synthetic timeline, in microseconds.
pub const FRAME_SPAN_US: u64 = 1000;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut clock = Clock::default();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FrameBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Frame",
                    "cat": "Damage",
                    "ts": clock.begin(e.frame_index),
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "width": e.output_size.width,
                        "height": e.output_size.height,
                        "has_history": e.has_history,
                    }
                }));
            }
            RecordedEvent::DelegatePass(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "DelegatePass",
                    "cat": "Damage",
                    "ts": clock.step(e.frame_index),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "pass": e.pass,
                        "changed": e.changed,
                    }
                }));
            }
            RecordedEvent::DamageAdded(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": cause_name(e.cause),
                    "cat": "Rich",
                    "ts": clock.step(e.frame_index),
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "rect": rect_json(e.rect),
                        "source": format!("{:?}", e.source),
                        "paint_order": e.paint_order,
                    }
                }));
            }
            RecordedEvent::DamageSummary(s) => {
                let ts = clock.step(s.frame_index);
                events.push(json!({
                    "ph": "C",
                    "name": "DamagedPixels",
                    "cat": "Summary",
                    "ts": ts,
                    "pid": 0,
                    "args": { "pixels": area(s.damage) }
                }));
                events.push(json!({
                    "ph": "E",
                    "name": "Frame",
                    "cat": "Damage",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": s.frame_index,
                        "contributions": s.stats.contributions,
                        "added": s.stats.added,
                        "removed": s.stats.removed,
                        "reordered": s.stats.reordered,
                        "delegate_passes": s.stats.delegate_passes,
                        "converged": s.stats.converged,
                        "full": s.full,
                        "damage": rect_json(s.damage),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// Assigns strictly increasing timestamps within each frame's span.
#[derive(Default)]
struct Clock {
    frame: u64,
    offset: u64,
}

impl Clock {
    fn begin(&mut self, frame_index: u64) -> u64 {
        self.frame = frame_index;
        self.offset = 0;
        frame_index.saturating_mul(FRAME_SPAN_US)
    }

    fn step(&mut self, frame_index: u64) -> u64 {
        if frame_index != self.frame {
            return self.begin(frame_index);
        }
        self.offset = (self.offset + 1).min(FRAME_SPAN_US - 1);
        frame_index
            .saturating_mul(FRAME_SPAN_US)
            .saturating_add(self.offset)
    }
}

fn rect_json(r: PixelRect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

fn area(r: PixelRect) -> i64 {
    if r.is_empty() {
        return 0;
    }
    (i64::from(r.x1) - i64::from(r.x0)) * (i64::from(r.y1) - i64::from(r.y0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use abrade_core::context::FrameStats;
    use abrade_core::delegate::DamageSource;
    use abrade_core::geometry::OutputSize;
    use abrade_core::trace::{
        DamageAddedEvent, DamageCause, DamageSummary, FrameBeginEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 2,
            output_size: OutputSize::new(100, 50),
            has_history: true,
        });
        rec.on_damage_added(&DamageAddedEvent {
            frame_index: 2,
            rect: PixelRect::new(0, 0, 10, 10),
            source: DamageSource::ThisFrame,
            paint_order: 0,
            cause: DamageCause::Added,
        });
        rec.on_damage_summary(&DamageSummary {
            frame_index: 2,
            stats: FrameStats::default(),
            full: false,
            damage: PixelRect::new(0, 0, 10, 10),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["ts"], 2000);
        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "added");
        assert_eq!(parsed[1]["ts"], 2001);
        assert_eq!(parsed[2]["ph"], "C");
        assert_eq!(parsed[2]["args"]["pixels"], 100);
        assert_eq!(parsed[3]["ph"], "E");
        assert_eq!(parsed[3]["args"]["damage"], json!([0, 0, 10, 10]));
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
