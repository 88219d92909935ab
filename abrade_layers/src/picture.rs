// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded drawing content.

use abrade_core::layer::{Layer, downcast_layer};
use kurbo::{Point, Rect, Size};

use crate::resource::ResourceKey;

/// A leaf that draws a recorded picture at an offset.
///
/// Pictures are immutable once recorded, so two picture layers paint the same
/// pixels when they place the same picture at the same offset.
#[derive(Clone, Debug, PartialEq)]
pub struct PictureLayer {
    /// Top-left corner in the parent's coordinate space.
    pub offset: Point,
    /// Size of the picture's cull rect.
    pub size: Size,
    /// The recorded picture.
    pub picture: ResourceKey,
}

impl PictureLayer {
    /// Creates a picture layer.
    #[must_use]
    pub const fn new(offset: Point, size: Size, picture: ResourceKey) -> Self {
        Self {
            offset,
            size,
            picture,
        }
    }
}

impl Layer for PictureLayer {
    fn paint_bounds(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.size)
    }

    fn content_eq(&self, other: &dyn Layer) -> bool {
        downcast_layer::<Self>(other).is_some_and(|o| o == self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureLayer;

    #[test]
    fn same_picture_at_same_place_is_equal() {
        let a = PictureLayer::new(Point::new(1.0, 2.0), Size::new(3.0, 4.0), ResourceKey(7));
        let b = a.clone();
        assert!(a.content_eq(&b));
        assert_eq!(a.paint_bounds(), Rect::new(1.0, 2.0, 4.0, 6.0));

        let other = PictureLayer {
            picture: ResourceKey(8),
            ..a.clone()
        };
        assert!(!a.content_eq(&other));
    }

    #[test]
    fn pictures_never_equal_textures() {
        let a = PictureLayer::new(Point::ZERO, Size::new(3.0, 4.0), ResourceKey(7));
        let t = TextureLayer::new(Point::ZERO, Size::new(3.0, 4.0), ResourceKey(7));
        assert!(!a.content_eq(&t));
    }
}
