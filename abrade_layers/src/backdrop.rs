// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backdrop filters and their snapshot cache.
//!
//! A backdrop filter blurs whatever was painted below it inside its clip. Its
//! pixels therefore change when anything below it changes within its readback
//! region (the clip grown by the blur radius), even if the layer itself did
//! not change. The layer registers a [`DamageDelegate`] to observe that.
//!
//! Blurring is expensive. When nothing below a backdrop changed for more than
//! [`SNAPSHOT_THRESHOLD`] consecutive frames, the renderer is asked to capture
//! the filtered result once and reuse it. The captured snapshot lives in a
//! [`BackdropCache`] shared by the successive layer objects that represent the
//! same backdrop across frames; each layer finds its predecessor through
//! [`DamageContext::previous_layer`]. A stale snapshot is never freed here: it
//! is handed to a [`ReleaseQueue`] for the renderer to drop.
//!
//! ```text
//!            damage below         unchanged > threshold
//!   Filter ◄────────────── any ──────────────────────► CaptureSnapshot
//!     ▲                                                      │ store_snapshot
//!     │ damage below (snapshot released)                     ▼
//!     └────────────────────────────────────────────── Snapshot(key)
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use abrade_core::context::{ContributionId, DamageContext};
use abrade_core::delegate::{DamageDelegate, DamageEvent, DamageSource};
use abrade_core::geometry::{rect_is_empty, rects_overlap};
use abrade_core::layer::{Layer, downcast_layer};
use kurbo::{Affine, Rect};

use crate::blur::BlurFilter;
use crate::release::ReleaseQueue;
use crate::resource::ResourceKey;
use crate::scene::SceneNode;

/// Unchanged frames after which a backdrop's filtered output is cached.
pub const SNAPSHOT_THRESHOLD: u32 = 60;

/// How a backdrop filter should be painted in the frame just computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BackdropPaint {
    /// Filter the backdrop live.
    #[default]
    Filter,
    /// Filter live, then capture the result and hand it to
    /// [`BackdropFilterLayer::store_snapshot`].
    CaptureSnapshot,
    /// Draw the cached snapshot instead of filtering.
    Snapshot(ResourceKey),
}

/// State carried across frames by the layers representing one backdrop.
#[derive(Debug, Default)]
pub struct BackdropCache {
    snapshot: Option<ResourceKey>,
    unchanged_frames: u32,
}

impl BackdropCache {
    /// The cached filtered output, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<ResourceKey> {
        self.snapshot
    }

    /// Consecutive frames in which nothing below the backdrop changed.
    #[must_use]
    pub fn unchanged_frames(&self) -> u32 {
        self.unchanged_frames
    }

    pub(crate) fn take_snapshot(&mut self) -> Option<ResourceKey> {
        self.snapshot.take()
    }
}

/// Shared handle to a [`BackdropCache`].
pub type SharedBackdropCache = Rc<RefCell<BackdropCache>>;

/// Per-frame damage observer of one backdrop.
#[derive(Debug)]
struct BackdropDamage {
    has_snapshot: bool,
    paint_order: usize,
    previous_paint_order: Option<usize>,
    readback: Rect,
    damage_below: Rect,
}

impl BackdropDamage {
    fn is_below(&self, event: &DamageEvent) -> bool {
        match event.source {
            DamageSource::ThisFrame => event.paint_order < self.paint_order,
            DamageSource::PreviousFrame => self
                .previous_paint_order
                .is_some_and(|order| event.paint_order < order),
        }
    }
}

impl DamageDelegate for BackdropDamage {
    fn on_damage_added(&mut self, event: &DamageEvent) {
        if self.is_below(event) && rects_overlap(self.readback, event.rect) {
            self.damage_below = if rect_is_empty(self.damage_below) {
                event.rect
            } else {
                self.damage_below.union(event.rect)
            };
        }
    }

    fn on_report_additional_damage(&mut self, total: Rect) -> Rect {
        let stale = if self.has_snapshot {
            !rect_is_empty(self.damage_below)
        } else {
            // Live filtering reads pixels around any damage in the readback
            // region, wherever it came from.
            rects_overlap(self.readback, total)
        };
        if stale { self.readback } else { Rect::ZERO }
    }
}

/// A group whose children are drawn over a blurred copy of what lies below.
#[derive(Debug)]
pub struct BackdropFilterLayer {
    filter: BlurFilter,
    children: Vec<SceneNode>,
    bounds: Cell<Rect>,
    cache: RefCell<Option<SharedBackdropCache>>,
    damage: RefCell<Option<Rc<RefCell<BackdropDamage>>>>,
    paint: Cell<BackdropPaint>,
}

impl BackdropFilterLayer {
    /// Creates a backdrop filter layer.
    #[must_use]
    pub fn new(filter: BlurFilter, children: Vec<SceneNode>) -> Self {
        Self {
            filter,
            children,
            bounds: Cell::new(Rect::ZERO),
            cache: RefCell::new(None),
            damage: RefCell::new(None),
            paint: Cell::new(BackdropPaint::Filter),
        }
    }

    /// The backdrop filter.
    #[must_use]
    pub fn filter(&self) -> BlurFilter {
        self.filter
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    /// How to paint the backdrop in the frame last walked.
    #[must_use]
    pub fn paint_mode(&self) -> BackdropPaint {
        self.paint.get()
    }

    /// The cache this layer shares with its predecessors.
    #[must_use]
    pub fn cache(&self) -> Option<SharedBackdropCache> {
        self.cache.borrow().clone()
    }

    /// Records the snapshot captured after a
    /// [`CaptureSnapshot`](BackdropPaint::CaptureSnapshot) frame.
    ///
    /// A snapshot it replaces is scheduled on `release`.
    pub fn store_snapshot(&self, key: ResourceKey, release: &mut ReleaseQueue) {
        let cache = self.cache.borrow_mut().get_or_insert_with(Rc::default).clone();
        let old = cache.borrow_mut().snapshot.replace(key);
        if let Some(old) = old.filter(|&old| old != key) {
            release.schedule(old);
        }
        self.paint.set(BackdropPaint::Snapshot(key));
    }

    /// Attaches the cache and, when the frame is diffed, the damage delegate.
    ///
    /// `filter_bounds` is the readback region in local space.
    pub(crate) fn begin_frame(
        &self,
        context: &mut DamageContext,
        id: ContributionId,
        transform: Affine,
        filter_bounds: Rect,
    ) {
        let inherited = context.previous_layer(id).and_then(|prev| {
            downcast_layer::<Self>(&*prev).and_then(|prev| prev.cache.borrow().clone())
        });
        let cache = inherited.unwrap_or_default();

        let damage = context.is_determining_damage().then(|| {
            let damage = Rc::new(RefCell::new(BackdropDamage {
                has_snapshot: cache.borrow().snapshot.is_some(),
                paint_order: context.paint_order(id),
                previous_paint_order: context.previous_paint_order(id),
                readback: transform.transform_rect_bbox(filter_bounds),
                damage_below: Rect::ZERO,
            }));
            context.add_delegate(id, damage.clone());
            damage
        });

        *self.cache.borrow_mut() = Some(cache);
        *self.damage.borrow_mut() = damage;
    }

    pub(crate) fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }

    /// Updates the cache after the frame's damage is known and decides the
    /// paint mode.
    ///
    /// A frame that was not diffed counts as changed.
    pub(crate) fn settle(&self, release: &mut ReleaseQueue) {
        let Some(cache) = self.cache() else {
            self.paint.set(BackdropPaint::Filter);
            return;
        };
        let changed = self
            .damage
            .borrow_mut()
            .take()
            .is_none_or(|d| !rect_is_empty(d.borrow().damage_below));

        let mut cache = cache.borrow_mut();
        if changed {
            cache.unchanged_frames = 0;
            if let Some(key) = cache.take_snapshot() {
                release.schedule(key);
            }
        } else {
            cache.unchanged_frames = cache.unchanged_frames.saturating_add(1);
        }

        self.paint.set(match cache.snapshot {
            Some(key) => BackdropPaint::Snapshot(key),
            None if cache.unchanged_frames > SNAPSHOT_THRESHOLD => BackdropPaint::CaptureSnapshot,
            None => BackdropPaint::Filter,
        });
    }
}

impl Layer for BackdropFilterLayer {
    fn paint_bounds(&self) -> Rect {
        self.bounds.get()
    }

    fn content_eq(&self, other: &dyn Layer) -> bool {
        downcast_layer::<Self>(other).is_some_and(|o| o.filter == self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer(has_snapshot: bool) -> BackdropDamage {
        BackdropDamage {
            has_snapshot,
            paint_order: 3,
            previous_paint_order: Some(5),
            readback: Rect::new(0.0, 0.0, 50.0, 50.0),
            damage_below: Rect::ZERO,
        }
    }

    fn event(rect: Rect, source: DamageSource, paint_order: usize) -> DamageEvent {
        DamageEvent {
            rect,
            source,
            paint_order,
        }
    }

    #[test]
    fn only_damage_below_and_inside_readback_counts() {
        let mut d = observer(false);
        let inside = Rect::new(10.0, 10.0, 20.0, 20.0);

        d.on_damage_added(&event(inside, DamageSource::ThisFrame, 3));
        d.on_damage_added(&event(inside, DamageSource::PreviousFrame, 5));
        d.on_damage_added(&event(Rect::new(60.0, 60.0, 70.0, 70.0), DamageSource::ThisFrame, 0));
        assert!(rect_is_empty(d.damage_below), "above or outside");

        d.on_damage_added(&event(inside, DamageSource::ThisFrame, 2));
        d.on_damage_added(&event(Rect::new(40.0, 0.0, 45.0, 5.0), DamageSource::PreviousFrame, 4));
        assert_eq!(d.damage_below, Rect::new(10.0, 0.0, 45.0, 20.0));
    }

    #[test]
    fn new_backdrop_ignores_previous_frame_damage() {
        let mut d = BackdropDamage {
            previous_paint_order: None,
            ..observer(false)
        };
        d.on_damage_added(&event(
            Rect::new(10.0, 10.0, 20.0, 20.0),
            DamageSource::PreviousFrame,
            0,
        ));
        assert!(rect_is_empty(d.damage_below));
    }

    #[test]
    fn live_filter_reports_readback_when_total_touches_it() {
        let mut d = observer(false);
        assert_eq!(
            d.on_report_additional_damage(Rect::new(60.0, 60.0, 70.0, 70.0)),
            Rect::ZERO
        );
        assert_eq!(
            d.on_report_additional_damage(Rect::new(45.0, 45.0, 70.0, 70.0)),
            d.readback
        );
    }

    #[test]
    fn snapshot_reports_readback_only_for_damage_below() {
        let mut d = observer(true);
        assert_eq!(
            d.on_report_additional_damage(Rect::new(0.0, 0.0, 50.0, 50.0)),
            Rect::ZERO,
            "damage above a snapshot does not invalidate it"
        );
        d.on_damage_added(&event(Rect::new(1.0, 1.0, 2.0, 2.0), DamageSource::ThisFrame, 0));
        assert_eq!(d.on_report_additional_damage(Rect::ZERO), d.readback);
    }

    #[test]
    fn settle_without_diff_resets_cache() {
        let layer = BackdropFilterLayer::new(BlurFilter::new(2.0), Vec::new());
        let mut release = ReleaseQueue::new();
        layer.store_snapshot(ResourceKey(9), &mut release);
        assert_eq!(layer.paint_mode(), BackdropPaint::Snapshot(ResourceKey(9)));
        assert!(release.is_empty());

        layer.settle(&mut release);
        assert_eq!(layer.paint_mode(), BackdropPaint::Filter);
        assert_eq!(release.pending(), &[ResourceKey(9)]);
        let cache = layer.cache().expect("cache was created");
        assert_eq!(cache.borrow().unchanged_frames(), 0);
        assert!(cache.borrow().snapshot().is_none());
    }

    #[test]
    fn replacing_a_snapshot_releases_the_old_one() {
        let layer = BackdropFilterLayer::new(BlurFilter::new(2.0), Vec::new());
        let mut release = ReleaseQueue::new();
        layer.store_snapshot(ResourceKey(1), &mut release);
        layer.store_snapshot(ResourceKey(1), &mut release);
        assert!(release.is_empty());
        layer.store_snapshot(ResourceKey(2), &mut release);
        assert_eq!(release.pending(), &[ResourceKey(1)]);
    }

    #[test]
    fn equality_follows_filter() {
        let a = BackdropFilterLayer::new(BlurFilter::new(2.0), Vec::new());
        let b = BackdropFilterLayer::new(BlurFilter::new(2.0), Vec::new());
        let c = BackdropFilterLayer::new(BlurFilter::new(3.0), Vec::new());
        assert!(a.content_eq(&b));
        assert!(!a.content_eq(&c));
    }
}
