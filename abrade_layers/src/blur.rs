// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gaussian blur parameters.

use abrade_core::filter::FilterBounds;
use abrade_core::mutator::FilterKey;
use kurbo::Rect;

/// A Gaussian blur.
///
/// Used both as a group image filter and as a backdrop filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurFilter {
    /// Standard deviation along x, in local units.
    pub sigma_x: f32,
    /// Standard deviation along y, in local units.
    pub sigma_y: f32,
}

impl BlurFilter {
    /// Blur extent in multiples of sigma; contributions beyond it are
    /// negligible.
    pub const EXTENT: f64 = 3.0;

    /// Creates a blur with the same sigma on both axes.
    #[must_use]
    pub const fn new(sigma: f32) -> Self {
        Self {
            sigma_x: sigma,
            sigma_y: sigma,
        }
    }

    /// Content key for mutator chains. Equal blurs have equal keys.
    #[must_use]
    pub fn key(&self) -> FilterKey {
        FilterKey((u64::from(self.sigma_x.to_bits()) << 32) | u64::from(self.sigma_y.to_bits()))
    }
}

impl FilterBounds for BlurFilter {
    fn fast_bounds(&self, input: Rect) -> Rect {
        input.inflate(
            Self::EXTENT * f64::from(self.sigma_x.abs()),
            Self::EXTENT * f64::from(self.sigma_y.abs()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_bounds_spread_three_sigma() {
        let blur = BlurFilter {
            sigma_x: 2.0,
            sigma_y: 1.0,
        };
        assert_eq!(
            blur.fast_bounds(Rect::new(10.0, 10.0, 20.0, 20.0)),
            Rect::new(4.0, 7.0, 26.0, 23.0)
        );
    }

    #[test]
    fn keys_distinguish_axes() {
        let a = BlurFilter {
            sigma_x: 2.0,
            sigma_y: 1.0,
        };
        let b = BlurFilter {
            sigma_x: 1.0,
            sigma_y: 2.0,
        };
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.key());
        assert_eq!(BlurFilter::new(4.0).key(), BlurFilter::new(4.0).key());
    }
}
