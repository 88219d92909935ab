// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer capability consumed by damage computation.
//!
//! The damage context does not know the layer tree's class hierarchy. It only
//! needs two things from a layer: where it paints, and whether it would paint
//! the same pixels as another layer of the same kind. Both are exposed through
//! the [`Layer`] trait.
//!
//! Layers are shared through [`LayerRef`] (`Rc<dyn Layer>`). A frame snapshot
//! keeps the previous frame's layers alive so they can be compared against the
//! next frame's layers; nothing in this crate mutates a layer through that
//! reference.

use alloc::rc::Rc;
use core::any::{Any, TypeId};
use core::fmt::Debug;

use kurbo::Rect;

/// Shared, read-only handle to a layer.
pub type LayerRef = Rc<dyn Layer>;

/// A paintable element of a retained layer tree, as seen by damage tracking.
///
/// Two contributions can only be equivalent when their layers have the same
/// concrete type; [`content_eq`](Self::content_eq) is then asked whether the
/// two layers would produce identical pixels given identical screen bounds and
/// mutators.
pub trait Layer: Any + Debug + 'static {
    /// The area this layer paints, in its local coordinate space.
    ///
    /// May change after the layer was appended (for example a container whose
    /// bounds are the union of its children); see
    /// [`DamageContext::update_paint_bounds`](crate::context::DamageContext::update_paint_bounds).
    fn paint_bounds(&self) -> Rect;

    /// Returns `true` if `other` paints exactly what `self` paints.
    ///
    /// Implementations compare content (image ids, filter parameters, and so
    /// on), not identity, and return `false` when `other` is a different
    /// concrete type. Use [`downcast_layer`] to get at `other`'s fields.
    fn content_eq(&self, other: &dyn Layer) -> bool;
}

/// Returns the concrete type of `layer`.
///
/// This is the "kind" used to keep layers of different types from ever being
/// considered equivalent.
#[inline]
#[must_use]
pub fn layer_kind(layer: &dyn Layer) -> TypeId {
    let any: &dyn Any = layer;
    any.type_id()
}

/// Downcasts a layer to its concrete type.
#[inline]
#[must_use]
pub fn downcast_layer<T: Layer>(layer: &dyn Layer) -> Option<&T> {
    let any: &dyn Any = layer;
    any.downcast_ref::<T>()
}

/// Returns `true` if `a` and `b` are the same layer object.
#[inline]
#[must_use]
pub fn same_layer(a: &LayerRef, b: &LayerRef) -> bool {
    Rc::ptr_eq(a, b)
}
