// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Externally produced image streams.

use abrade_core::layer::Layer;
use kurbo::{Point, Rect, Size};

use crate::resource::ResourceKey;

/// A leaf that shows the latest image of an external texture (video, camera,
/// platform view).
///
/// The producer can update the texture at any time without the layer tree
/// knowing, so a texture layer is never content-equal to another layer. It
/// damages its bounds every frame unless the very same layer object is
/// retained, in which case the caller asserts the texture did not change.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureLayer {
    /// Top-left corner in the parent's coordinate space.
    pub offset: Point,
    /// Displayed size.
    pub size: Size,
    /// The external texture.
    pub texture: ResourceKey,
}

impl TextureLayer {
    /// Creates a texture layer.
    #[must_use]
    pub const fn new(offset: Point, size: Size, texture: ResourceKey) -> Self {
        Self {
            offset,
            size,
            texture,
        }
    }
}

impl Layer for TextureLayer {
    fn paint_bounds(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.size)
    }

    fn content_eq(&self, _other: &dyn Layer) -> bool {
        false
    }
}
