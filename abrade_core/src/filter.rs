// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds of image filters applied to groups of contributions.

use kurbo::Rect;

/// Conservative output bounds of an image filter.
///
/// Used by
/// [`DamageContext::apply_image_filter`](crate::context::DamageContext::apply_image_filter)
/// to grow the bounds of contributions drawn under a filter that can spread
/// pixels (a blur, a drop shadow, a morphology filter).
pub trait FilterBounds {
    /// Returns a rectangle containing every pixel the filter may write when
    /// its input covers `input`, in the filter's local coordinate space.
    fn fast_bounds(&self, input: Rect) -> Rect;
}

/// A filter that spreads every input pixel by a fixed distance on each axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outset {
    /// Horizontal spread.
    pub dx: f64,
    /// Vertical spread.
    pub dy: f64,
}

impl Outset {
    /// Creates an outset filter.
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

impl FilterBounds for Outset {
    fn fast_bounds(&self, input: Rect) -> Rect {
        input.inflate(self.dx, self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outset_inflates_both_axes() {
        let f = Outset::new(2.0, 3.0);
        assert_eq!(
            f.fast_bounds(Rect::new(10.0, 10.0, 20.0, 20.0)),
            Rect::new(8.0, 7.0, 22.0, 23.0)
        );
    }
}
