// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grouping nodes.

use alloc::vec::Vec;
use core::cell::Cell;

use abrade_core::layer::{Layer, downcast_layer};
use kurbo::{Affine, Rect};

use crate::blur::BlurFilter;
use crate::scene::SceneNode;

/// A group of child layers with optional transform, clip, opacity, blur and
/// background fill.
///
/// A container only contributes to damage itself when it has a background:
/// the fill covers the union of its children, which is only known after the
/// children were walked. Until then [`paint_bounds`](Layer::paint_bounds)
/// returns the bounds from the last walk.
#[derive(Debug)]
pub struct ContainerLayer {
    transform: Affine,
    clip: Option<Rect>,
    opacity: Option<u8>,
    blur: Option<BlurFilter>,
    background: Option<u32>,
    children: Vec<SceneNode>,
    bounds: Cell<Rect>,
}

impl ContainerLayer {
    /// Creates a plain group.
    #[must_use]
    pub fn new(children: Vec<SceneNode>) -> Self {
        Self {
            transform: Affine::IDENTITY,
            clip: None,
            opacity: None,
            blur: None,
            background: None,
            children,
            bounds: Cell::new(Rect::ZERO),
        }
    }

    /// Sets the transform from child space into the parent's space.
    #[must_use]
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Clips children to `clip`, in child space.
    #[must_use]
    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Applies group opacity.
    #[must_use]
    pub fn with_opacity(mut self, alpha: u8) -> Self {
        self.opacity = Some(alpha);
        self
    }

    /// Blurs the rendered children.
    #[must_use]
    pub fn with_blur(mut self, blur: BlurFilter) -> Self {
        self.blur = Some(blur);
        self
    }

    /// Fills the children's bounds with `color` (ARGB) below the children.
    #[must_use]
    pub fn with_background(mut self, color: u32) -> Self {
        self.background = Some(color);
        self
    }

    /// Transform from child space into the parent's space.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Clip in child space.
    #[must_use]
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Group opacity.
    #[must_use]
    pub fn opacity(&self) -> Option<u8> {
        self.opacity
    }

    /// Group blur.
    #[must_use]
    pub fn blur(&self) -> Option<BlurFilter> {
        self.blur
    }

    /// Background color.
    #[must_use]
    pub fn background(&self) -> Option<u32> {
        self.background
    }

    /// Children in paint order.
    #[must_use]
    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub(crate) fn set_bounds(&self, bounds: Rect) {
        self.bounds.set(bounds);
    }
}

impl Layer for ContainerLayer {
    fn paint_bounds(&self) -> Rect {
        self.bounds.get()
    }

    fn content_eq(&self, other: &dyn Layer) -> bool {
        // Clip and opacity travel in the mutator chain; bounds are compared
        // by the damage context.
        downcast_layer::<Self>(other)
            .is_some_and(|o| o.background == self.background && o.transform == self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_children() {
        let a = ContainerLayer::new(Vec::new()).with_background(0xff00_00ff);
        let b = ContainerLayer::new(Vec::new())
            .with_background(0xff00_00ff)
            .with_opacity(10);
        assert!(a.content_eq(&b));

        let c = ContainerLayer::new(Vec::new()).with_background(0xff00_ff00);
        assert!(!a.content_eq(&c));

        let d = ContainerLayer::new(Vec::new())
            .with_background(0xff00_00ff)
            .with_transform(Affine::rotate(1.0));
        assert!(!a.content_eq(&d));
    }

    #[test]
    fn bounds_are_set_by_the_walker() {
        let a = ContainerLayer::new(Vec::new()).with_clip(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(a.paint_bounds(), Rect::ZERO);
        a.set_bounds(Rect::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(a.paint_bounds(), Rect::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(a.clip(), Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert!(a.children().is_empty());
        assert!(a.blur().is_none());
    }
}
