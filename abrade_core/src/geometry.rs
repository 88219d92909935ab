// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-space geometry and the damage accumulator.
//!
//! Layer bounds are real-valued [`kurbo::Rect`]s in screen space. Damage is
//! reported in integer render-target pixels, so every conversion from real to
//! integer coordinates rounds *outward*: damage may over-cover, but never
//! under-cover, the pixels that changed.

use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;

/// Returns `true` if `rect` covers no area.
///
/// Rectangles with NaN coordinates or with `x1 <= x0` / `y1 <= y0` are empty.
#[inline]
#[must_use]
pub fn rect_is_empty(rect: Rect) -> bool {
    !(rect.x0 < rect.x1 && rect.y0 < rect.y1)
}

/// Returns `true` if `a` and `b` share a region of positive area.
///
/// Rectangles that only touch along an edge do not overlap, and an empty
/// rectangle (see [`rect_is_empty`]) overlaps nothing.
#[inline]
#[must_use]
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    // `f64::max`/`min` drop NaN operands, so NaN rects are rejected up front.
    !rect_is_empty(a)
        && !rect_is_empty(b)
        && a.x0.max(b.x0) < a.x1.min(b.x1)
        && a.y0.max(b.y0) < a.y1.min(b.y1)
}

/// An axis-aligned rectangle in render-target pixel space.
///
/// The rectangle spans `x0..x1` horizontally and `y0..y1` vertically (max
/// edges exclusive). It is empty when either span is empty.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    /// Left edge.
    pub x0: i32,
    /// Top edge.
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl PixelRect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self {
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
    };

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle from an origin and a size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add_unsigned(width),
            y1: y.saturating_add_unsigned(height),
        }
    }

    /// Returns the smallest pixel rectangle containing `rect`.
    ///
    /// Min edges are floored and max edges are ceiled, saturating at the
    /// `i32` range. Empty or NaN input yields [`PixelRect::EMPTY`].
    #[must_use]
    pub fn round_out(rect: Rect) -> Self {
        if rect_is_empty(rect) {
            return Self::EMPTY;
        }
        let r = rect.expand();
        Self {
            x0: saturate(r.x0),
            y0: saturate(r.y0),
            x1: saturate(r.x1),
            y1: saturate(r.y1),
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Width in pixels (zero when empty).
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.x1.abs_diff(self.x0)
        }
    }

    /// Height in pixels (zero when empty).
    #[inline]
    #[must_use]
    pub const fn height(self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.y1.abs_diff(self.y0)
        }
    }

    /// Returns the bounding box of `self` and `other`.
    ///
    /// An empty operand contributes nothing, so the union of anything with an
    /// empty rectangle is the other rectangle unchanged.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Returns the overlap of `self` and `other`, or [`PixelRect::EMPTY`].
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let r = Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        };
        if r.is_empty() { Self::EMPTY } else { r }
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    ///
    /// Every rectangle contains the empty rectangle.
    #[must_use]
    pub const fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (self.x0 <= other.x0
                && self.y0 <= other.y0
                && self.x1 >= other.x1
                && self.y1 >= other.y1)
    }

    /// Converts to a real-valued rectangle.
    #[inline]
    #[must_use]
    pub fn to_rect(self) -> Rect {
        if self.is_empty() {
            return Rect::ZERO;
        }
        Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }
}

impl fmt::Debug for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("PixelRect(empty)");
        }
        write!(
            f,
            "PixelRect([{}, {}] .. [{}, {}])",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int casts saturate; out-of-range edges clamp to the i32 range"
)]
fn saturate(v: f64) -> i32 {
    v as i32
}

/// The pixel size of a render target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OutputSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl OutputSize {
    /// A zero-sized output.
    pub const EMPTY: Self = Self {
        width: 0,
        height: 0,
    };

    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The full output rectangle, anchored at the origin.
    #[inline]
    #[must_use]
    pub const fn bounds(self) -> PixelRect {
        PixelRect::from_origin_size(0, 0, self.width, self.height)
    }
}

impl fmt::Debug for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputSize({}x{})", self.width, self.height)
    }
}

/// Accumulated damage for one frame.
///
/// Tracks a single bounding box. Adding a rectangle grows the box to the union
/// of itself and the rectangle; real-valued input is rounded outward first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageArea {
    bounds: PixelRect,
}

impl DamageArea {
    /// Creates an empty damage area.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bounds: PixelRect::EMPTY,
        }
    }

    /// Grows the area to include `rect`, rounding outward.
    pub fn add_rect(&mut self, rect: Rect) {
        self.add_pixel_rect(PixelRect::round_out(rect));
    }

    /// Grows the area to include `rect`.
    pub fn add_pixel_rect(&mut self, rect: PixelRect) {
        self.bounds = self.bounds.union(rect);
    }

    /// The union of everything added so far.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> PixelRect {
        self.bounds
    }

    /// Returns `true` if nothing has been damaged.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Returns the damage as a list of rectangles for partial-swap APIs.
    ///
    /// The list is empty when nothing changed and otherwise holds the single
    /// bounding box.
    #[must_use]
    pub fn rects(&self) -> Vec<PixelRect> {
        if self.bounds.is_empty() {
            Vec::new()
        } else {
            alloc::vec![self.bounds]
        }
    }

    /// Resets the area to empty.
    pub fn clear(&mut self) {
        self.bounds = PixelRect::EMPTY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_positive_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!rects_overlap(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!rects_overlap(a, Rect::new(20.0, 20.0, 30.0, 30.0)));
        assert!(!rects_overlap(a, Rect::new(f64::NAN, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn empty_rects_overlap_nothing() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        for empty in [
            Rect::new(0.0, f64::NAN, 5.0, 5.0),
            Rect::new(0.0, 0.0, f64::NAN, 5.0),
            Rect::new(5.0, 5.0, 2.0, 8.0),
            Rect::new(2.0, 2.0, 2.0, 2.0),
        ] {
            assert!(!rects_overlap(a, empty), "{empty:?} overlaps");
            assert!(!rects_overlap(empty, a), "{empty:?} overlaps");
        }
    }

    #[test]
    fn round_out_never_shrinks() {
        let r = PixelRect::round_out(Rect::new(0.5, 1.2, 9.1, 9.9));
        assert_eq!(r, PixelRect::new(0, 1, 10, 10));

        let neg = PixelRect::round_out(Rect::new(-3.7, -0.2, -1.5, 0.3));
        assert_eq!(neg, PixelRect::new(-4, -1, -1, 1));
    }

    #[test]
    fn round_out_of_empty_or_nan_is_empty() {
        assert!(PixelRect::round_out(Rect::new(5.0, 5.0, 5.0, 10.0)).is_empty());
        assert!(PixelRect::round_out(Rect::new(f64::NAN, 0.0, 10.0, 10.0)).is_empty());
        assert!(PixelRect::round_out(Rect::new(10.0, 0.0, 0.0, 10.0)).is_empty());
    }

    #[test]
    fn round_out_saturates_infinite_bounds() {
        let r = PixelRect::round_out(Rect::new(f64::NEG_INFINITY, 0.0, f64::INFINITY, 1.0));
        assert_eq!(r.x0, i32::MIN);
        assert_eq!(r.x1, i32::MAX);
    }

    #[test]
    fn union_ignores_empty_operands() {
        let a = PixelRect::new(10, 10, 20, 20);
        assert_eq!(a.union(PixelRect::EMPTY), a);
        assert_eq!(PixelRect::EMPTY.union(a), a);
        // An empty rect far away must not stretch the union.
        assert_eq!(a.union(PixelRect::new(100, 100, 100, 200)), a);
    }

    #[test]
    fn damage_area_union_is_order_independent() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.5, 5.5, 15.2, 15.2),
            Rect::new(-2.0, 30.0, 1.0, 31.0),
        ];

        let mut forward = DamageArea::new();
        for r in rects {
            forward.add_rect(r);
        }
        let mut backward = DamageArea::new();
        for r in rects.iter().rev() {
            backward.add_rect(*r);
        }

        assert_eq!(forward.bounds(), backward.bounds());
        assert_eq!(forward.bounds(), PixelRect::new(-2, 0, 16, 31));
    }

    #[test]
    fn damage_area_mixes_real_and_pixel_input() {
        let mut area = DamageArea::new();
        assert!(area.is_empty());
        assert!(area.rects().is_empty());

        area.add_pixel_rect(PixelRect::new(0, 0, 4, 4));
        area.add_rect(Rect::new(3.5, 3.5, 8.25, 6.0));
        assert_eq!(area.bounds(), PixelRect::new(0, 0, 9, 6));
        assert_eq!(area.rects(), alloc::vec![PixelRect::new(0, 0, 9, 6)]);

        area.clear();
        assert!(area.is_empty());
    }

    #[test]
    fn intersect_and_contains() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(5, 5, 15, 15);
        let c = PixelRect::new(10, 0, 20, 10);

        assert_eq!(a.intersect(b), PixelRect::new(5, 5, 10, 10));
        assert!(a.intersects(b));
        // Touching edges share no pixels.
        assert!(!a.intersects(c));
        assert!(a.contains_rect(PixelRect::new(2, 2, 3, 3)));
        assert!(a.contains_rect(PixelRect::EMPTY));
        assert!(!a.contains_rect(b));
    }

    #[test]
    fn output_size_bounds() {
        let size = OutputSize::new(800, 600);
        assert_eq!(size.bounds(), PixelRect::new(0, 0, 800, 600));
        assert_eq!(size.bounds().width(), 800);
        assert!(OutputSize::new(0, 600).is_empty());
        assert!(OutputSize::EMPTY.bounds().is_empty());
    }
}
