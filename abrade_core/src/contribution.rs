// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layer, per-frame paint footprints.

use core::any::TypeId;
use core::fmt;

use kurbo::Rect;

use crate::geometry::rect_is_empty;
use crate::layer::{LayerRef, layer_kind, same_layer};
use crate::mutator::MutatorChain;

/// What one layer paints in one frame.
///
/// Two contributions from different frames are *equivalent* when the layer
/// kinds match, the screen bounds are bit-identical, the mutator chains are
/// pairwise equal, and the layers compare equal by content (or are the same
/// object). Equivalence is the only test for "this layer produced no visible
/// change".
#[derive(Clone)]
pub struct Contribution {
    pub(crate) bounds: Rect,
    pub(crate) layer: LayerRef,
    pub(crate) kind: TypeId,
    pub(crate) mutators: MutatorChain,
    pub(crate) paint_order: usize,
}

impl Contribution {
    pub(crate) fn new(layer: LayerRef, bounds: Rect, mutators: MutatorChain) -> Self {
        let kind = layer_kind(&*layer);
        Self {
            bounds,
            layer,
            kind,
            mutators,
            paint_order: 0,
        }
    }

    /// Screen-space bounds.
    #[inline]
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The originating layer.
    #[inline]
    #[must_use]
    pub fn layer(&self) -> &LayerRef {
        &self.layer
    }

    /// Non-transform mutators enclosing the layer.
    #[inline]
    #[must_use]
    pub fn mutators(&self) -> &MutatorChain {
        &self.mutators
    }

    /// Position in its frame's paint sequence.
    ///
    /// This is the append position within the frame. Contributions dropped
    /// for empty bounds leave gaps, so orders increase but need not be
    /// contiguous.
    #[inline]
    #[must_use]
    pub fn paint_order(&self) -> usize {
        self.paint_order
    }

    /// Returns `true` if the bounds cover no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        rect_is_empty(self.bounds)
    }

    /// Bucket key for hashed lookup.
    #[inline]
    #[must_use]
    pub fn key(&self) -> ContributionKey {
        ContributionKey {
            kind: self.kind,
            bounds: bounds_bits(self.bounds),
        }
    }

    /// Returns `true` if `self` and `other` would paint identical pixels.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.kind == other.kind
            && bounds_bits(self.bounds) == bounds_bits(other.bounds)
            && self.mutators == other.mutators
            && (same_layer(&self.layer, &other.layer) || self.layer.content_eq(&*other.layer))
    }
}

fn bounds_bits(r: Rect) -> [u64; 4] {
    [r.x0.to_bits(), r.y0.to_bits(), r.x1.to_bits(), r.y1.to_bits()]
}

impl fmt::Debug for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contribution")
            .field("bounds", &self.bounds)
            .field("layer", &self.layer)
            .field("kind", &self.kind)
            .field("mutators", &self.mutators)
            .field("paint_order", &self.paint_order)
            .finish()
    }
}

/// Hash key of a [`Contribution`]: its layer kind and exact bounds.
///
/// Equivalent contributions always share a key. Contributions sharing a key
/// may still differ in mutators or content, so a key lookup yields candidates
/// that must be confirmed with [`Contribution::is_equivalent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContributionKey {
    kind: TypeId,
    bounds: [u64; 4],
}
