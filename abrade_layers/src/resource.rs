// Copyright 2026 the Abrade Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque keys for renderer-owned resources.

use core::fmt;

/// An opaque handle to a renderer-owned resource (picture, texture, snapshot
/// image).
///
/// Keys are assigned by the renderer and passed through layers without
/// interpretation. Two layers holding the same key show the same content.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey(pub u64);

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0)
    }
}
