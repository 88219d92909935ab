// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame damage orchestrator.
//!
//! A [`DamageContext`] tracks one render target. Each frame the tree walker
//! calls [`init`](DamageContext::init), then [`append`](DamageContext::append)
//! once per visible layer in paint order, then
//! [`finish`](DamageContext::finish). `finish` diffs the frame against the
//! previous frame's [`FrameSnapshot`], lets registered delegates add their own
//! damage, and returns the damage together with a new snapshot to pass to the
//! next `init`.
//!
//! ```text
//!   init(size, previous) ──► append* ──► finish() ──► DamageResult
//!        ▲                                                 │
//!        └──────────────── result.snapshot ◄───────────────┘
//! ```
//!
//! Calling the protocol out of order panics.

mod diff;
mod reorder;

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::config::DamageConfig;
use crate::contribution::Contribution;
use crate::delegate::{DelegateRecord, DelegateRef};
use crate::filter::FilterBounds;
use crate::geometry::{DamageArea, OutputSize, PixelRect, rect_is_empty, rects_overlap};
use crate::layer::LayerRef;
use crate::mutator::{MutatorChain, MutatorStack};
use crate::snapshot::FrameSnapshot;
use crate::trace::{FrameBeginEvent, Tracer};

/// Handle to a contribution appended in the current frame.
///
/// Returned by [`DamageContext::append`] and only valid until the next
/// [`finish`](DamageContext::finish); using it afterwards panics.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContributionId {
    index: usize,
    frame: u64,
}

impl ContributionId {
    /// Append position within the frame (for diagnostics).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Frame the handle belongs to.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> u64 {
        self.frame
    }
}

impl core::fmt::Debug for ContributionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ContributionId({}@frame{})", self.index, self.frame)
    }
}

/// Counters describing one frame's diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Contributions kept in the new snapshot.
    pub contributions: u32,
    /// Current contributions with no equivalent in the previous frame.
    pub added: u32,
    /// Previous contributions with no equivalent in this frame.
    pub removed: u32,
    /// Unchanged contributions damaged because their stacking changed.
    pub reordered: u32,
    /// Passes of the delegate loop.
    pub delegate_passes: u32,
    /// `false` if the delegate loop hit its pass cap.
    pub converged: bool,
}

/// Output of [`DamageContext::finish`].
#[derive(Debug)]
pub struct DamageResult {
    /// The damaged region.
    pub area: DamageArea,
    /// Snapshot to pass to the next [`init`](DamageContext::init).
    pub snapshot: Rc<FrameSnapshot>,
    /// Whether the whole output was damaged without per-layer diffing, or
    /// because delegates did not settle.
    pub full: bool,
    /// Diff counters.
    pub stats: FrameStats,
}

impl DamageResult {
    /// The damage bounds.
    #[inline]
    #[must_use]
    pub fn damage(&self) -> PixelRect {
        self.area.bounds()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FrameState {
    Idle,
    Open,
}

/// An appended contribution plus what is needed to recompute its bounds.
#[derive(Debug)]
struct Record {
    contribution: Contribution,
    transform: Affine,
    cull_rect: Rect,
}

/// Computes per-frame damage for one render target.
#[derive(Debug)]
pub struct DamageContext {
    config: DamageConfig,
    state: FrameState,
    frame_index: u64,
    output_size: OutputSize,
    previous: Option<Rc<FrameSnapshot>>,
    records: Vec<Record>,
    delegates: Vec<DelegateRecord>,
}

impl Default for DamageContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DamageContext {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DamageConfig::new())
    }

    /// Creates a context with the given configuration.
    #[must_use]
    pub fn with_config(config: DamageConfig) -> Self {
        Self {
            config,
            state: FrameState::Idle,
            frame_index: 0,
            output_size: OutputSize::EMPTY,
            previous: None,
            records: Vec::new(),
            delegates: Vec::new(),
        }
    }

    /// The configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DamageConfig {
        &self.config
    }

    /// Index of the current (or last) frame. Starts at 1 on the first `init`.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Output size of the current frame.
    #[inline]
    #[must_use]
    pub fn output_size(&self) -> OutputSize {
        self.output_size
    }

    /// Returns `true` while a frame is open.
    #[inline]
    #[must_use]
    pub fn is_frame_open(&self) -> bool {
        self.state == FrameState::Open
    }

    // -----------------------------------------------------------------------
    // Frame protocol
    // -----------------------------------------------------------------------

    /// Opens a frame.
    ///
    /// `previous` is the snapshot returned by the last `finish` for the same
    /// render target; `None` (or a snapshot for a different output size)
    /// means the whole output will be damaged.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already open.
    pub fn init(&mut self, output_size: OutputSize, previous: Option<Rc<FrameSnapshot>>) {
        self.init_traced(output_size, previous, &mut Tracer::none());
    }

    /// Like [`init`](Self::init), emitting a [`FrameBeginEvent`].
    ///
    /// # Panics
    ///
    /// Panics if a frame is already open.
    pub fn init_traced(
        &mut self,
        output_size: OutputSize,
        previous: Option<Rc<FrameSnapshot>>,
        tracer: &mut Tracer<'_>,
    ) {
        assert!(
            self.state == FrameState::Idle,
            "init called while frame {} is still open",
            self.frame_index
        );
        self.state = FrameState::Open;
        self.frame_index += 1;
        self.output_size = output_size;
        self.previous = previous;
        self.records.clear();
        self.delegates.clear();

        tracer.frame_begin(&FrameBeginEvent {
            frame_index: self.frame_index,
            output_size,
            has_history: self.previous.is_some(),
        });
    }

    /// Appends a layer's contribution, using the layer's own paint bounds.
    ///
    /// `transform` maps the layer's local space to screen space; `cull_rect`
    /// is in local space. Only the non-transform entries of `mutators` are
    /// recorded. Returns `None` (and records nothing) when the output is
    /// empty.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn append(
        &mut self,
        layer: LayerRef,
        transform: Affine,
        cull_rect: Rect,
        mutators: &MutatorStack,
    ) -> Option<ContributionId> {
        let paint_bounds = layer.paint_bounds();
        self.append_with_bounds(layer, transform, paint_bounds, cull_rect, mutators)
    }

    /// Appends a layer's contribution with caller-supplied local paint bounds.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn append_with_bounds(
        &mut self,
        layer: LayerRef,
        transform: Affine,
        paint_bounds: Rect,
        cull_rect: Rect,
        mutators: &MutatorStack,
    ) -> Option<ContributionId> {
        assert!(
            self.state == FrameState::Open,
            "append called without an open frame"
        );
        if self.output_size.is_empty() {
            return None;
        }
        let bounds = screen_bounds(transform, paint_bounds, cull_rect);
        let contribution = Contribution::new(layer, bounds, MutatorChain::from_stack(mutators));
        let index = self.records.len();
        self.records.push(Record {
            contribution,
            transform,
            cull_rect,
        });
        Some(ContributionId {
            index,
            frame: self.frame_index,
        })
    }

    /// Number of contributions appended in this frame.
    ///
    /// Useful as the `since` argument of
    /// [`apply_image_filter`](Self::apply_image_filter).
    #[inline]
    #[must_use]
    pub fn contribution_count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if a frame is open and will be diffed against history.
    ///
    /// When `false`, the frame is damaged in full and layers need not spend
    /// effort on damage bookkeeping.
    #[must_use]
    pub fn is_determining_damage(&self) -> bool {
        self.state == FrameState::Open && self.usable_history().is_some()
    }

    /// Grows the bounds of contributions drawn under an image filter.
    ///
    /// Applies to contributions appended at positions `since..`. Each one whose
    /// bounds, mapped into the filter's local space through the inverse of
    /// `transform`, intersect `filter_bounds` is grown by
    /// [`FilterBounds::fast_bounds`], limited to the union of its local bounds
    /// and `filter_bounds`, and mapped back to screen space.
    ///
    /// Returns `false` without changing anything if `transform` is not
    /// invertible.
    ///
    /// # Panics
    ///
    /// Panics if no frame is open.
    pub fn apply_image_filter(
        &mut self,
        since: usize,
        filter: &dyn FilterBounds,
        transform: Affine,
        filter_bounds: Rect,
    ) -> bool {
        assert!(
            self.state == FrameState::Open,
            "apply_image_filter called without an open frame"
        );
        let det = transform.determinant();
        if det == 0.0 || !det.is_finite() {
            return false;
        }
        let inverse = transform.inverse();
        for record in self.records.iter_mut().skip(since) {
            let c = &mut record.contribution;
            if c.is_empty() {
                continue;
            }
            let local = inverse.transform_rect_bbox(c.bounds);
            if rects_overlap(local, filter_bounds) {
                let limit = local.union(filter_bounds);
                let grown = filter.fast_bounds(local).intersect(limit);
                c.bounds = transform.transform_rect_bbox(grown);
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Handle queries
    // -----------------------------------------------------------------------

    fn record(&self, id: ContributionId) -> &Record {
        self.validate(id);
        &self.records[id.index]
    }

    fn validate(&self, id: ContributionId) {
        assert!(
            self.state == FrameState::Open && id.frame == self.frame_index,
            "stale contribution handle {id:?} (current frame {})",
            self.frame_index
        );
        assert!(
            id.index < self.records.len(),
            "contribution handle {id:?} out of range (len {})",
            self.records.len()
        );
    }

    /// Screen-space bounds of the contribution.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn bounds(&self, id: ContributionId) -> Rect {
        self.record(id).contribution.bounds
    }

    /// The contribution's position in this frame's paint sequence.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn paint_order(&self, id: ContributionId) -> usize {
        self.validate(id);
        id.index
    }

    /// The layer of the equivalent contribution in the previous frame.
    ///
    /// Lets a layer find its predecessor and carry cached state forward.
    /// Equivalent contributions are paired the way [`finish`](Self::finish)
    /// pairs them: each earlier contribution of this frame claims the first
    /// unclaimed equivalent, so two identical layers get distinct
    /// predecessors.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn previous_layer(&self, id: ContributionId) -> Option<LayerRef> {
        self.previous_match(id).map(|c| c.layer.clone())
    }

    /// Paint order of the equivalent contribution in the previous frame.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn previous_paint_order(&self, id: ContributionId) -> Option<usize> {
        self.previous_match(id).map(|c| c.paint_order)
    }

    fn previous_match(&self, id: ContributionId) -> Option<&Contribution> {
        if self.record(id).contribution.is_empty() {
            return None;
        }
        let history = self.usable_history()?;
        let mut taken = vec![false; history.len()];
        let mut claimed = None;
        for record in &self.records[..=id.index] {
            if !record.contribution.is_empty() {
                claimed = history.claim_equivalent(&record.contribution, &mut taken);
            }
        }
        claimed.map(|i| &history.as_slice()[i])
    }

    /// Recomputes the contribution's bounds from its layer's current paint
    /// bounds, the transform and the cull rect it was appended with.
    ///
    /// For layers whose bounds are only known after their children were
    /// walked.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn update_paint_bounds(&mut self, id: ContributionId) {
        self.validate(id);
        let record = &mut self.records[id.index];
        let paint_bounds = record.contribution.layer.paint_bounds();
        record.contribution.bounds =
            screen_bounds(record.transform, paint_bounds, record.cull_rect);
    }

    /// Registers a delegate for the rest of this frame.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn add_delegate(&mut self, id: ContributionId, delegate: DelegateRef) {
        self.validate(id);
        self.delegates
            .push(DelegateRecord::new(delegate, id.index));
    }

    /// The previous snapshot, if it can be diffed against this frame.
    fn usable_history(&self) -> Option<&FrameSnapshot> {
        self.previous
            .as_deref()
            .filter(|p| p.output_size() == self.output_size)
    }
}

/// Screen bounds of `paint_bounds` clipped to `cull_rect`, both in local
/// space.
fn screen_bounds(transform: Affine, paint_bounds: Rect, cull_rect: Rect) -> Rect {
    let local = paint_bounds.intersect(cull_rect);
    if rect_is_empty(local) {
        return Rect::ZERO;
    }
    transform.transform_rect_bbox(local)
}
