// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Concrete layer kinds and a scene walker for [`abrade_core`].
//!
//! This crate builds on `abrade_core`'s damage context. It defines:
//!
//! - [`SceneNode`] and [`Scene`]: a layer tree and the per-frame walk that
//!   feeds it to a [`DamageContext`](abrade_core::context::DamageContext)
//! - [`PictureLayer`] and [`TextureLayer`]: leaves with static and live
//!   content
//! - [`ContainerLayer`]: groups with transform, clip, opacity, blur and
//!   background
//! - [`BackdropFilterLayer`]: a group over a blurred backdrop, with snapshot
//!   caching driven by damage below it
//! - [`ReleaseQueue`] and [`ResourceKey`]: deferred release of renderer
//!   resources

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod backdrop;
mod blur;
mod container;
mod picture;
mod release;
mod resource;
mod scene;
mod texture;

pub use backdrop::{
    BackdropCache, BackdropFilterLayer, BackdropPaint, SNAPSHOT_THRESHOLD, SharedBackdropCache,
};
pub use blur::BlurFilter;
pub use container::ContainerLayer;
pub use picture::PictureLayer;
pub use release::ReleaseQueue;
pub use resource::ResourceKey;
pub use scene::{Scene, SceneNode};
pub use texture::TextureLayer;
