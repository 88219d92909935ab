// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame diffing and delegate convergence.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::mem;

use kurbo::Rect;

use super::reorder::flag_reordered;
use super::{DamageContext, DamageResult, FrameState, FrameStats};
use crate::contribution::Contribution;
use crate::delegate::{DamageEvent, DamageSource, DelegateRecord, report_changed};
use crate::geometry::{DamageArea, OutputSize, rect_is_empty, rects_overlap};
use crate::snapshot::FrameSnapshot;
#[cfg(feature = "trace-rich")]
use crate::trace::DamageAddedEvent;
use crate::trace::{DamageCause, DamageSummary, DelegatePassEvent, Tracer};

impl DamageContext {
    /// Closes the frame and computes its damage.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn finish(&mut self) -> DamageResult {
        self.finish_traced(&mut Tracer::none())
    }

    /// Like [`finish`](Self::finish), emitting trace events.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn finish_traced(&mut self, tracer: &mut Tracer<'_>) -> DamageResult {
        assert!(
            self.state == FrameState::Open,
            "finish called without an open frame"
        );
        self.state = FrameState::Idle;

        let output_size = self.output_size;
        let history = self
            .previous
            .take()
            .filter(|p| p.output_size() == output_size);
        let mut delegates = mem::take(&mut self.delegates);
        for d in &mut delegates {
            d.paint_order = d.contribution;
        }

        // Empty contributions can neither damage nor be damaged.
        let current: Vec<Contribution> = self
            .records
            .drain(..)
            .enumerate()
            .filter_map(|(i, r)| {
                let mut c = r.contribution;
                c.paint_order = i;
                (!c.is_empty()).then_some(c)
            })
            .collect();

        let mut pass = FramePass {
            frame_index: self.frame_index,
            output_size,
            area: DamageArea::new(),
            delegates: &mut delegates,
            tracer,
            stats: FrameStats {
                contributions: count(current.len()),
                converged: true,
                ..FrameStats::default()
            },
            full: false,
        };

        if !output_size.is_empty() {
            match history.as_deref() {
                Some(previous) => {
                    pass.diff(&current, previous);
                    let passes = self.config.max_delegate_passes;
                    if !pass.converge(passes) {
                        pass.damage_full_output();
                    }
                }
                None => pass.damage_full_output(),
            }
        }

        let FramePass {
            area,
            stats,
            full,
            tracer,
            ..
        } = pass;
        tracer.damage_summary(&DamageSummary {
            frame_index: self.frame_index,
            stats,
            full,
            damage: area.bounds(),
        });

        DamageResult {
            area,
            snapshot: Rc::new(FrameSnapshot::new(output_size, current)),
            full,
            stats,
        }
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Working state of one `finish` call.
struct FramePass<'f, 't> {
    frame_index: u64,
    output_size: OutputSize,
    area: DamageArea,
    delegates: &'f mut [DelegateRecord],
    tracer: &'f mut Tracer<'t>,
    stats: FrameStats,
    full: bool,
}

impl FramePass<'_, '_> {
    /// Adds damage from diffing and tells every delegate.
    fn add_damage(&mut self, rect: Rect, source: DamageSource, paint_order: usize, cause: DamageCause) {
        self.area.add_rect(rect);
        let event = DamageEvent {
            rect,
            source,
            paint_order,
        };
        for d in self.delegates.iter() {
            d.delegate.borrow_mut().on_damage_added(&event);
        }
        self.trace_damage(&event, cause);
    }

    fn trace_damage(&mut self, event: &DamageEvent, cause: DamageCause) {
        #[cfg(feature = "trace-rich")]
        self.tracer.damage_added(&DamageAddedEvent {
            frame_index: self.frame_index,
            rect: crate::geometry::PixelRect::round_out(event.rect),
            source: event.source,
            paint_order: event.paint_order,
            cause,
        });
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = (event, cause);
        }
    }

    /// Replaces all damage with the whole output.
    fn damage_full_output(&mut self) {
        let output = self.output_size.bounds();
        self.area.add_pixel_rect(output);
        self.full = true;
        let rect = output.to_rect();
        for d in self.delegates.iter() {
            d.delegate.borrow_mut().on_full_damage(rect);
        }
        self.trace_damage(
            &DamageEvent {
                rect,
                source: DamageSource::ThisFrame,
                paint_order: 0,
            },
            DamageCause::FullFrame,
        );
    }

    /// Damages additions, removals and overlapping reorders.
    fn diff(&mut self, current: &[Contribution], previous: &FrameSnapshot) {
        let prev = previous.as_slice();

        // Each previous contribution matches at most one current one, so
        // duplicated content still damages when one copy goes away.
        let mut previous_taken = vec![false; prev.len()];
        let mut matched: Vec<(usize, usize)> = Vec::new();
        for (ci, c) in current.iter().enumerate() {
            match previous.claim_equivalent(c, &mut previous_taken) {
                Some(pi) => matched.push((ci, pi)),
                None => {
                    self.stats.added += 1;
                    self.add_damage(
                        c.bounds,
                        DamageSource::ThisFrame,
                        c.paint_order,
                        DamageCause::Added,
                    );
                }
            }
        }

        for (pi, p) in prev.iter().enumerate() {
            if !previous_taken[pi] {
                self.stats.removed += 1;
                self.add_damage(
                    p.bounds,
                    DamageSource::PreviousFrame,
                    p.paint_order,
                    DamageCause::Removed,
                );
            }
        }

        // Snapshot positions follow paint order, so they serve as ranks.
        let ranks: Vec<usize> = matched.iter().map(|&(_, pi)| pi).collect();
        let flagged = flag_reordered(&ranks, |a, b| {
            rects_overlap(current[matched[a].0].bounds, current[matched[b].0].bounds)
        });
        for (&(ci, pi), _) in matched.iter().zip(&flagged).filter(|(_, f)| **f) {
            self.stats.reordered += 1;
            let (c, p) = (&current[ci], &prev[pi]);
            self.add_damage(
                c.bounds,
                DamageSource::ThisFrame,
                c.paint_order,
                DamageCause::Reordered,
            );
            self.add_damage(
                p.bounds,
                DamageSource::PreviousFrame,
                p.paint_order,
                DamageCause::Reordered,
            );
        }
    }

    /// Runs delegate reports to a fixed point.
    ///
    /// Returns `false` if `max_passes` ran out first.
    fn converge(&mut self, max_passes: Option<u32>) -> bool {
        if self.delegates.is_empty() {
            return true;
        }
        loop {
            if max_passes.is_some_and(|max| self.stats.delegate_passes >= max) {
                self.stats.converged = false;
                return false;
            }
            let mut changed = false;
            for i in 0..self.delegates.len() {
                let total = self.area.bounds().to_rect();
                let report = self.delegates[i]
                    .delegate
                    .borrow_mut()
                    .on_report_additional_damage(total);
                if !report_changed(self.delegates[i].last_report, report) {
                    continue;
                }
                self.delegates[i].last_report = report;
                changed = true;
                if rect_is_empty(report) {
                    continue;
                }
                self.area.add_rect(report);
                let event = DamageEvent {
                    rect: report,
                    source: DamageSource::ThisFrame,
                    paint_order: self.delegates[i].paint_order,
                };
                for (j, other) in self.delegates.iter().enumerate() {
                    if j != i {
                        other.delegate.borrow_mut().on_damage_added(&event);
                    }
                }
                self.trace_damage(&event, DamageCause::Delegate);
            }
            self.tracer.delegate_pass(&DelegatePassEvent {
                frame_index: self.frame_index,
                pass: self.stats.delegate_passes,
                changed,
            });
            self.stats.delegate_passes += 1;
            if !changed {
                return true;
            }
        }
    }
}
