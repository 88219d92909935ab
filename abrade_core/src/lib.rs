// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame damage computation for retained layer compositors.
//!
//! `abrade_core` works out which screen pixels changed between two frames of
//! a layer tree, so a renderer can redraw and present only that region. It is
//! `no_std` compatible (with `alloc`) and knows nothing about rasterization or
//! presentation: it consumes an ordered sequence of layer footprints and
//! produces integer dirty rectangles plus an opaque token for the next frame.
//!
//! # Architecture
//!
//! ```text
//!   tree walker
//!       │  init(size, previous snapshot)
//!       │  append(layer, transform, cull, mutators)*  ──► ContributionId
//!       ▼                                                   │
//!   DamageContext ◄── update_paint_bounds / add_delegate ───┘
//!       │  finish()
//!       ▼
//!   diff vs. previous ──► reorder pass ──► delegate fixed point
//!       │
//!       ▼
//!   DamageResult { area, snapshot } ──► presentation (partial swap)
//!                      │
//!                      └──► next frame's init
//! ```
//!
//! **[`layer`]**: The [`Layer`](layer::Layer) capability trait. A layer
//! reports its paint bounds and compares its content with another layer of
//! the same kind.
//!
//! **[`contribution`]**: What one layer painted in one frame (screen bounds,
//! mutators, paint order) and the equivalence test between frames.
//!
//! **[`snapshot`]**: [`FrameSnapshot`](snapshot::FrameSnapshot), the
//! immutable record of a frame, hashed for lookup.
//!
//! **[`context`]**: [`DamageContext`](context::DamageContext), the per-frame
//! protocol and diff.
//!
//! **[`delegate`]**: [`DamageDelegate`](delegate::DamageDelegate), for layers
//! whose pixels depend on what lies below them.
//!
//! **[`geometry`]**: Pixel rectangles, output sizes and the
//! [`DamageArea`](geometry::DamageArea) accumulator.
//!
//! **[`mutator`]**: Clips, opacity and filters enclosing a layer.
//!
//! **[`filter`]**: [`FilterBounds`](filter::FilterBounds) for image filters
//! that spread pixels.
//!
//! **[`config`]**: Runtime configuration.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! damage instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-rectangle
//!   damage events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod context;
pub mod contribution;
pub mod delegate;
pub mod filter;
pub mod geometry;
pub mod layer;
pub mod mutator;
pub mod snapshot;
pub mod trace;
