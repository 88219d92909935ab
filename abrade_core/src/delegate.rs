// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-contribution damage delegates.
//!
//! Some layers paint pixels that depend on what lies *below* them (a backdrop
//! blur samples the screen). Such a layer registers a [`DamageDelegate`]
//! against its contribution with
//! [`DamageContext::add_delegate`](crate::context::DamageContext::add_delegate).
//! During [`finish`](crate::context::DamageContext::finish) the delegate
//! observes every damage rectangle as it is added, then reports extra damage
//! of its own until all delegates agree.
//!
//! Registrations last for one frame.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::Rect;

use crate::geometry::rect_is_empty;

/// Which frame a damage rectangle's contribution belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DamageSource {
    /// Content painted in the frame being computed.
    ThisFrame,
    /// Content the previous frame painted.
    PreviousFrame,
}

/// One damage rectangle, as seen by a delegate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageEvent {
    /// Screen-space damage.
    pub rect: Rect,
    /// Frame the damaging content belongs to.
    pub source: DamageSource,
    /// Paint order of the damaging content within its own frame.
    ///
    /// Compare against the delegate's own
    /// [`paint_order`](crate::context::DamageContext::paint_order) for
    /// [`ThisFrame`](DamageSource::ThisFrame) events and its
    /// [`previous_paint_order`](crate::context::DamageContext::previous_paint_order)
    /// for [`PreviousFrame`](DamageSource::PreviousFrame) events to tell
    /// whether the damage lies below the delegate.
    pub paint_order: usize,
}

/// Observer of a frame's damage computation.
///
/// All methods default to no-ops.
pub trait DamageDelegate {
    /// Called for every damage rectangle added while diffing, and for damage
    /// reported by other delegates.
    fn on_damage_added(&mut self, event: &DamageEvent) {
        _ = event;
    }

    /// Returns additional damage given the total damage so far.
    ///
    /// Called repeatedly until no delegate changes its answer. Must be a
    /// function of the delegate's accumulated observations and `total`; an
    /// answer that keeps changing is cut off by
    /// [`DamageConfig::max_delegate_passes`](crate::config::DamageConfig::max_delegate_passes).
    fn on_report_additional_damage(&mut self, total: Rect) -> Rect {
        _ = total;
        Rect::ZERO
    }

    /// Called instead of the other methods when the whole output is damaged
    /// because there is no usable history.
    fn on_full_damage(&mut self, output: Rect) {
        _ = output;
    }
}

/// Shared handle to a delegate, as registered with the damage context.
pub type DelegateRef = Rc<RefCell<dyn DamageDelegate>>;

/// A delegate registered for the current frame.
pub(crate) struct DelegateRecord {
    pub(crate) delegate: DelegateRef,
    /// Index of the owning contribution in append order.
    pub(crate) contribution: usize,
    /// Paint order of the owning contribution, assigned at finish.
    pub(crate) paint_order: usize,
    pub(crate) last_report: Rect,
}

impl DelegateRecord {
    pub(crate) fn new(delegate: DelegateRef, contribution: usize) -> Self {
        Self {
            delegate,
            contribution,
            paint_order: 0,
            last_report: Rect::ZERO,
        }
    }
}

impl fmt::Debug for DelegateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateRecord")
            .field("contribution", &self.contribution)
            .field("paint_order", &self.paint_order)
            .field("last_report", &self.last_report)
            .finish_non_exhaustive()
    }
}

/// Returns `true` if two delegate reports differ.
///
/// All empty rectangles are the same report.
pub(crate) fn report_changed(last: Rect, next: Rect) -> bool {
    match (rect_is_empty(last), rect_is_empty(next)) {
        (true, true) => false,
        (false, false) => last != next,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reports_are_interchangeable() {
        assert!(!report_changed(Rect::ZERO, Rect::new(4.0, 4.0, 4.0, 9.0)));
        assert!(report_changed(Rect::ZERO, Rect::new(0.0, 0.0, 1.0, 1.0)));
        assert!(report_changed(Rect::new(0.0, 0.0, 1.0, 1.0), Rect::ZERO));
        assert!(!report_changed(
            Rect::new(0.0, 0.0, 1.0, 1.0),
            Rect::new(0.0, 0.0, 1.0, 1.0)
        ));
    }

    #[test]
    fn default_methods_report_nothing() {
        struct Silent;
        impl DamageDelegate for Silent {}

        let mut d = Silent;
        d.on_damage_added(&DamageEvent {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            source: DamageSource::ThisFrame,
            paint_order: 0,
        });
        d.on_full_damage(Rect::new(0.0, 0.0, 8.0, 8.0));
        assert_eq!(
            d.on_report_additional_damage(Rect::new(0.0, 0.0, 1.0, 1.0)),
            Rect::ZERO
        );
    }
}
